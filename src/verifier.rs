//! Reference checking for schema files and their dependency closures.
//!
//! The verifier gathers every type a schema declares and every type its
//! fields refer to, then checks that each use resolves to a declaration, a
//! scalar, or a well-known Google type. Declarations from dependency
//! schemas are fed into the same verifier before the dependent file.

use crate::ast::*;
use crate::wellknown::{is_scalar_type, is_well_known_type};

/// Outcome of a dependency verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Ok,
    /// A referenced type with no matching declaration, and the fully
    /// qualified message the reference appears in.
    Undefined { type_name: String, context: String },
}

impl VerificationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationResult::Ok)
    }

    pub fn message(&self) -> String {
        match self {
            VerificationResult::Ok => "ok".to_string(),
            VerificationResult::Undefined { type_name, context } => {
                format!("type {type_name} is not defined (referenced from {context})")
            }
        }
    }
}

/// Accumulates declared and used type names across one or more schema
/// files, then verifies that every use resolves.
#[derive(Debug, Default)]
pub struct DependencyVerifier {
    declared_types: Vec<String>,
    /// (fully qualified referencing message, referenced type name).
    used_types: Vec<(String, String)>,
    import_paths: Vec<String>,
}

impl DependencyVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_declared_type(&mut self, type_name: impl Into<String>) {
        self.declared_types.push(type_name.into());
    }

    /// Record a type use made from `context`. Map entries count as a use of
    /// both the key and the value type.
    pub fn add_used_type(&mut self, context: &str, type_name: &str) {
        if let Some(inner) = type_name.strip_prefix("map<").and_then(|t| t.strip_suffix('>')) {
            if let Some((key, value)) = inner.split_once(',') {
                self.used_types
                    .push((context.to_string(), key.trim().to_string()));
                self.used_types
                    .push((context.to_string(), value.trim().to_string()));
                return;
            }
        }
        self.used_types
            .push((context.to_string(), type_name.to_string()));
    }

    pub fn add_import(&mut self, import_path: impl Into<String>) {
        self.import_paths.push(import_path.into());
    }

    pub fn used_types(&self) -> &[(String, String)] {
        &self.used_types
    }

    pub fn import_paths(&self) -> &[String] {
        &self.import_paths
    }

    /// Walk `file`, recording its imports, type declarations and field
    /// type uses.
    pub fn collect(&mut self, file: &SchemaFile) {
        for import in file.imports.iter().chain(&file.public_imports) {
            self.add_import(import.clone());
        }
        let package = file.package_name.clone().unwrap_or_default();
        for decl in &file.types {
            self.collect_type(&package, "", decl);
        }
    }

    fn collect_type(&mut self, package: &str, parent: &str, decl: &TypeDecl) {
        let scoped = if parent.is_empty() {
            decl.name().to_string()
        } else {
            format!("{parent}.{}", decl.name())
        };
        let qualified = if package.is_empty() {
            scoped.clone()
        } else {
            format!("{package}.{scoped}")
        };
        self.add_declared_type(qualified.clone());
        self.add_declared_type(scoped.clone());

        if let TypeDecl::Message(message) = decl {
            for field in message.all_fields() {
                self.add_used_type(&qualified, &field.element_type);
            }
            for group in &message.groups {
                // A group implicitly declares a nested message type under
                // its own name.
                let group_scoped = format!("{scoped}.{}", group.name);
                let group_qualified = if package.is_empty() {
                    group_scoped.clone()
                } else {
                    format!("{package}.{group_scoped}")
                };
                self.add_declared_type(group_qualified);
                self.add_declared_type(group_scoped);
                for field in &group.fields {
                    self.add_used_type(&qualified, &field.element_type);
                }
            }
            for nested in &message.nested_types {
                self.collect_type(package, &scoped, nested);
            }
        }
    }

    /// Check every recorded use against the declarations. Returns the
    /// first unresolved reference found.
    pub fn verify(&self) -> VerificationResult {
        for (context, used) in &self.used_types {
            if self.resolves(context, used) {
                continue;
            }
            return VerificationResult::Undefined {
                type_name: used.clone(),
                context: context.clone(),
            };
        }
        VerificationResult::Ok
    }

    fn resolves(&self, context: &str, used: &str) -> bool {
        if is_scalar_type(used) || is_well_known_type(used) {
            return true;
        }
        if let Some(absolute) = used.strip_prefix('.') {
            return self.is_declared(absolute);
        }
        if self.is_declared(used) {
            return true;
        }
        // Relative references resolve against the referencing message and
        // each of its ancestors, innermost first.
        let mut scope = context;
        loop {
            if self.is_declared(&format!("{scope}.{used}")) {
                return true;
            }
            match scope.rsplit_once('.') {
                Some((outer, _)) => scope = outer,
                None => return false,
            }
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.declared_types.iter().any(|declared| declared == name)
    }
}

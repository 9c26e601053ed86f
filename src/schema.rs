//! Parsed schema handles with reference resolution.
//!
//! A [`ParsedSchema`] owns the raw text, its parsed tree and, when the
//! schema names references, the recursively resolved dependency schemas.
//! The canonical rendering is produced once and cached.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::ast::SchemaFile;
use crate::compare::{compare, CompareResult};
use crate::error::{Result, SchemaError};
use crate::parser;
use crate::verifier::{DependencyVerifier, VerificationResult};

/// A reference from one registered schema to another, identified by
/// subject and version.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    pub name: String,
    pub subject: String,
    pub version: i32,
}

/// The schema text a resolver found for a reference, along with that
/// schema's own references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub schema: String,
    pub references: Option<Vec<Reference>>,
}

/// Looks up the schema text behind a reference. Registry-backed callers
/// implement this against their store; closures work directly.
pub trait ReferenceResolver {
    fn resolve(&self, reference: &Reference) -> Option<ResolvedReference>;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&Reference) -> Option<ResolvedReference>,
{
    fn resolve(&self, reference: &Reference) -> Option<ResolvedReference> {
        self(reference)
    }
}

/// One resolved dependency of a schema.
#[derive(Debug)]
pub struct Dependency {
    pub name: String,
    pub subject: String,
    pub version: i32,
    pub schema: ParsedSchema,
}

impl Dependency {
    /// Stable key for the dependency map.
    pub fn identifier(&self) -> String {
        format!("{}_{}_{}", self.name, self.subject, self.version)
    }
}

/// Which way a compatibility question runs between two schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityDirection {
    /// Can readers of the updated schema consume data written under the
    /// current one?
    Backward,
    /// Can readers of the current schema consume data written under the
    /// updated one?
    Forward,
}

/// A schema parsed from text, with its dependency closure resolved.
#[derive(Debug)]
pub struct ParsedSchema {
    raw: String,
    schema_file: SchemaFile,
    references: Vec<Reference>,
    dependencies: HashMap<String, Dependency>,
    canonical: OnceLock<String>,
}

fn none(_: &Reference) -> Option<ResolvedReference> {
    None
}

impl ParsedSchema {
    /// Parse a schema with no references.
    pub fn parse(schema: impl Into<String>) -> Result<Self> {
        Self::new(schema, Vec::new(), &none)
    }

    /// Parse a schema and resolve its references through `resolver`,
    /// recursively. A reference the resolver cannot supply is an error.
    pub fn new(
        schema: impl Into<String>,
        references: Vec<Reference>,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Self> {
        let raw = schema.into();
        let schema_file = parser::parse("", &raw)?;

        let mut dependencies = HashMap::new();
        for reference in &references {
            let resolved =
                resolver
                    .resolve(reference)
                    .ok_or_else(|| SchemaError::UnresolvedReference {
                        name: reference.name.clone(),
                        subject: reference.subject.clone(),
                        version: reference.version,
                    })?;
            let dependency = Dependency {
                name: reference.name.clone(),
                subject: reference.subject.clone(),
                version: reference.version,
                schema: ParsedSchema::new(
                    resolved.schema,
                    resolved.references.unwrap_or_default(),
                    resolver,
                )?,
            };
            dependencies.insert(dependency.identifier(), dependency);
        }

        Ok(ParsedSchema {
            raw,
            schema_file,
            references,
            dependencies,
            canonical: OnceLock::new(),
        })
    }

    pub fn schema_file(&self) -> &SchemaFile {
        &self.schema_file
    }

    pub fn raw_schema(&self) -> &str {
        &self.raw
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn dependencies(&self) -> &HashMap<String, Dependency> {
        &self.dependencies
    }

    /// Canonical rendering of this schema, produced once and cached.
    pub fn canonical_string(&self) -> &str {
        self.canonical.get_or_init(|| self.schema_file.render())
    }

    /// Verify that every type used by this schema resolves to a
    /// declaration in the schema itself or its dependency closure.
    pub fn verify_dependencies(&self) -> VerificationResult {
        let mut verifier = DependencyVerifier::new();
        self.collect_into(&mut verifier);
        verifier.verify()
    }

    fn collect_into(&self, verifier: &mut DependencyVerifier) {
        for dependency in self.dependencies.values() {
            dependency.schema.collect_into(verifier);
        }
        verifier.collect(&self.schema_file);
    }

    /// Structural comparison against a proposed update.
    pub fn compare(&self, updated: &ParsedSchema) -> CompareResult {
        compare(&self.schema_file, &updated.schema_file)
    }

    /// Whether `updated` may replace this schema under `direction`.
    pub fn is_compatible(
        &self,
        updated: &ParsedSchema,
        direction: CompatibilityDirection,
    ) -> bool {
        match direction {
            CompatibilityDirection::Backward => self.compare(updated).is_compatible(),
            CompatibilityDirection::Forward => updated.compare(self).is_compatible(),
        }
    }
}

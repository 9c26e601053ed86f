//! Structural comparison of two schema versions.
//!
//! `compare(original, updated)` walks both trees and classifies every
//! difference. Directionality matters: removals and narrowings are judged
//! against readers of data written under `original`.

use std::collections::{BTreeMap, HashSet};

use crate::ast::*;

/// Classification of a single schema difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    SyntaxChanged,
    PackageChanged,
    TypeAdded,
    TypeRemoved,
    /// A type removed while nothing else referenced it.
    UnreferencedTypeRemoved,
    FieldAdded,
    FieldRemoved,
    /// A field removed with its tag or name reserved in the update.
    FieldRemovedReserved,
    FieldTypeChanged,
    /// A field type change within one wire representation.
    FieldTypeWireCompatible,
    FieldLabelChanged,
    FieldRenamed,
    FieldDefaultChanged,
    EnumConstantAdded,
    EnumConstantRemoved,
    EnumConstantRemovedReserved,
    EnumConstantRenamed,
    OptionChanged,
    DocumentationChanged,
}

impl DiffKind {
    /// Whether data written under the original schema may become
    /// unreadable or reinterpreted under the update.
    pub fn is_breaking(self) -> bool {
        matches!(
            self,
            DiffKind::SyntaxChanged
                | DiffKind::PackageChanged
                | DiffKind::TypeRemoved
                | DiffKind::FieldRemoved
                | DiffKind::FieldTypeChanged
                | DiffKind::FieldLabelChanged
                | DiffKind::EnumConstantRemoved
        )
    }
}

/// One recorded difference, located by a dotted path into the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub kind: DiffKind,
    pub path: String,
    pub message: String,
}

/// All differences found by one comparison pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareResult {
    differences: Vec<Difference>,
}

impl CompareResult {
    pub fn push(&mut self, kind: DiffKind, path: impl Into<String>, message: impl Into<String>) {
        self.differences.push(Difference {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    /// True when no recorded difference is breaking.
    pub fn is_compatible(&self) -> bool {
        self.differences.iter().all(|d| !d.kind.is_breaking())
    }
}

/// Compare `updated` against `original` and classify every difference.
pub fn compare(original: &SchemaFile, updated: &SchemaFile) -> CompareResult {
    let comparator = Comparator {
        original_enums: collect_enum_names(&original.types),
        updated_enums: collect_enum_names(&updated.types),
        original_uses: collect_type_uses(original),
    };
    let mut result = CompareResult::default();

    if original.syntax_or_default() != updated.syntax_or_default() {
        result.push(
            DiffKind::SyntaxChanged,
            "",
            format!(
                "syntax changed from {} to {}",
                original.syntax_or_default(),
                updated.syntax_or_default()
            ),
        );
    }
    if original.package_name != updated.package_name {
        result.push(
            DiffKind::PackageChanged,
            "",
            format!(
                "package changed from {:?} to {:?}",
                original.package_name, updated.package_name
            ),
        );
    }
    if original.options != updated.options {
        result.push(DiffKind::OptionChanged, "", "file options changed");
    }

    comparator.compare_types(&mut result, "", &original.types, &updated.types);
    result
}

/// Bare names of every enum declared anywhere in `types`.
fn collect_enum_names(types: &[TypeDecl]) -> HashSet<String> {
    fn walk(types: &[TypeDecl], out: &mut HashSet<String>) {
        for decl in types {
            if let TypeDecl::Enum(e) = decl {
                out.insert(e.name.clone());
            }
            walk(decl.nested_types(), out);
        }
    }
    let mut out = HashSet::new();
    walk(types, &mut out);
    out
}

/// Every (referencing path, referenced type) pair in `file`.
fn collect_type_uses(file: &SchemaFile) -> Vec<(String, String)> {
    fn walk(path: &str, types: &[TypeDecl], out: &mut Vec<(String, String)>) {
        for decl in types {
            let scoped = join_path(path, decl.name());
            if let TypeDecl::Message(m) = decl {
                for field in m.all_fields() {
                    out.push((scoped.clone(), field.element_type.clone()));
                }
                for group in &m.groups {
                    for field in &group.fields {
                        out.push((scoped.clone(), field.element_type.clone()));
                    }
                }
                walk(&scoped, &m.nested_types, out);
            }
        }
    }
    let mut out = Vec::new();
    walk("", &file.types, &mut out);
    out
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Last dot-separated segment of a type name.
fn final_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Wire representation buckets for field type compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireGroup {
    Varint,
    Zigzag,
    Fixed32,
    Fixed64,
    Bytes,
}

struct Comparator {
    original_enums: HashSet<String>,
    updated_enums: HashSet<String>,
    original_uses: Vec<(String, String)>,
}

/// Tag-keyed view of one field or group, the unit of pairing inside a
/// message.
struct FieldView<'a> {
    name: &'a str,
    label: Option<Label>,
    element_type: &'a str,
    default_value: Option<&'a OptionValue>,
    options: &'a [OptionDecl],
    documentation: &'a str,
}

fn field_views(message: &MessageDecl) -> BTreeMap<i32, FieldView<'_>> {
    let mut views = BTreeMap::new();
    for field in message.all_fields() {
        views.insert(
            field.tag,
            FieldView {
                name: &field.name,
                label: field.label,
                element_type: &field.element_type,
                default_value: field.default_value.as_ref(),
                options: &field.options,
                documentation: &field.documentation,
            },
        );
    }
    for group in &message.groups {
        views.insert(
            group.tag,
            FieldView {
                name: &group.name,
                label: group.label,
                element_type: &group.name,
                default_value: None,
                options: &[],
                documentation: &group.documentation,
            },
        );
    }
    views
}

impl Comparator {
    fn compare_types(
        &self,
        result: &mut CompareResult,
        path: &str,
        original: &[TypeDecl],
        updated: &[TypeDecl],
    ) {
        let updated_by_name: BTreeMap<&str, &TypeDecl> =
            updated.iter().map(|t| (t.name(), t)).collect();
        let original_names: HashSet<&str> = original.iter().map(|t| t.name()).collect();

        for decl in original {
            let type_path = join_path(path, decl.name());
            match updated_by_name.get(decl.name()) {
                Some(counterpart) => match (decl, counterpart) {
                    (TypeDecl::Message(a), TypeDecl::Message(b)) => {
                        self.compare_messages(result, &type_path, a, b);
                    }
                    (TypeDecl::Enum(a), TypeDecl::Enum(b)) => {
                        self.compare_enums(result, &type_path, a, b);
                    }
                    _ => {
                        self.record_removed_type(result, &type_path, decl);
                        result.push(
                            DiffKind::TypeAdded,
                            type_path.clone(),
                            format!("type {} added with a different kind", decl.name()),
                        );
                    }
                },
                None => self.record_removed_type(result, &type_path, decl),
            }
        }
        for decl in updated {
            if !original_names.contains(decl.name()) {
                result.push(
                    DiffKind::TypeAdded,
                    join_path(path, decl.name()),
                    format!("type {} added", decl.name()),
                );
            }
        }
    }

    fn record_removed_type(&self, result: &mut CompareResult, type_path: &str, decl: &TypeDecl) {
        // Uses from inside the removed type do not count; a sibling whose
        // name merely shares the prefix (Order vs OrderLine) does.
        let inside = format!("{type_path}.");
        let referenced = self.original_uses.iter().any(|(context, used)| {
            final_segment(used) == decl.name()
                && context.as_str() != type_path
                && !context.starts_with(&inside)
        });
        if referenced {
            result.push(
                DiffKind::TypeRemoved,
                type_path,
                format!("referenced type {} removed", decl.name()),
            );
        } else {
            result.push(
                DiffKind::UnreferencedTypeRemoved,
                type_path,
                format!("unreferenced type {} removed", decl.name()),
            );
        }
    }

    fn compare_messages(
        &self,
        result: &mut CompareResult,
        path: &str,
        original: &MessageDecl,
        updated: &MessageDecl,
    ) {
        let original_fields = field_views(original);
        let updated_fields = field_views(updated);

        for (tag, field) in &original_fields {
            let field_path = format!("{path}.{}", field.name);
            match updated_fields.get(tag) {
                Some(counterpart) => {
                    self.compare_fields(result, &field_path, field, counterpart);
                }
                None => {
                    if updated.is_tag_reserved(*tag) || updated.is_name_reserved(field.name) {
                        result.push(
                            DiffKind::FieldRemovedReserved,
                            field_path,
                            format!("field {} (tag {tag}) removed and reserved", field.name),
                        );
                    } else {
                        result.push(
                            DiffKind::FieldRemoved,
                            field_path,
                            format!("field {} (tag {tag}) removed without reservation", field.name),
                        );
                    }
                }
            }
        }
        for (tag, field) in &updated_fields {
            if !original_fields.contains_key(tag) {
                result.push(
                    DiffKind::FieldAdded,
                    format!("{path}.{}", field.name),
                    format!("field {} (tag {tag}) added", field.name),
                );
            }
        }

        if original.options != updated.options {
            result.push(DiffKind::OptionChanged, path, "message options changed");
        }
        if original.documentation != updated.documentation {
            result.push(DiffKind::DocumentationChanged, path, "documentation changed");
        }

        self.compare_types(result, path, &original.nested_types, &updated.nested_types);
    }

    fn compare_fields(
        &self,
        result: &mut CompareResult,
        path: &str,
        original: &FieldView<'_>,
        updated: &FieldView<'_>,
    ) {
        if original.name != updated.name {
            result.push(
                DiffKind::FieldRenamed,
                path,
                format!("field renamed from {} to {}", original.name, updated.name),
            );
        }

        let original_type = original.element_type.trim_start_matches('.');
        let updated_type = updated.element_type.trim_start_matches('.');
        if original_type != updated_type {
            let before = self.wire_group(original_type, &self.original_enums);
            let after = self.wire_group(updated_type, &self.updated_enums);
            match (before, after) {
                (Some(a), Some(b)) if a == b => result.push(
                    DiffKind::FieldTypeWireCompatible,
                    path,
                    format!(
                        "type changed from {} to {} within one wire format",
                        original.element_type, updated.element_type
                    ),
                ),
                _ => result.push(
                    DiffKind::FieldTypeChanged,
                    path,
                    format!(
                        "type changed from {} to {}",
                        original.element_type, updated.element_type
                    ),
                ),
            }
        }

        let original_label = original.label.unwrap_or(Label::Optional);
        let updated_label = updated.label.unwrap_or(Label::Optional);
        if original_label != updated_label {
            result.push(
                DiffKind::FieldLabelChanged,
                path,
                format!(
                    "label changed from {} to {}",
                    original_label.as_str(),
                    updated_label.as_str()
                ),
            );
        }

        if original.default_value != updated.default_value {
            result.push(DiffKind::FieldDefaultChanged, path, "default value changed");
        }
        if original.options != updated.options {
            result.push(DiffKind::OptionChanged, path, "field options changed");
        }
        if original.documentation != updated.documentation {
            result.push(DiffKind::DocumentationChanged, path, "documentation changed");
        }
    }

    fn wire_group(&self, type_name: &str, enums: &HashSet<String>) -> Option<WireGroup> {
        match type_name {
            "int32" | "int64" | "uint32" | "uint64" | "bool" => Some(WireGroup::Varint),
            "sint32" | "sint64" => Some(WireGroup::Zigzag),
            "fixed32" | "sfixed32" => Some(WireGroup::Fixed32),
            "fixed64" | "sfixed64" => Some(WireGroup::Fixed64),
            "string" | "bytes" => Some(WireGroup::Bytes),
            _ if enums.contains(final_segment(type_name)) => Some(WireGroup::Varint),
            _ => None,
        }
    }

    fn compare_enums(
        &self,
        result: &mut CompareResult,
        path: &str,
        original: &EnumDecl,
        updated: &EnumDecl,
    ) {
        let updated_by_value: BTreeMap<i32, &EnumConstant> =
            updated.constants.iter().map(|c| (c.value, c)).collect();
        let original_values: HashSet<i32> =
            original.constants.iter().map(|c| c.value).collect();

        for constant in &original.constants {
            let constant_path = format!("{path}.{}", constant.name);
            match updated_by_value.get(&constant.value) {
                Some(counterpart) => {
                    if constant.name != counterpart.name {
                        result.push(
                            DiffKind::EnumConstantRenamed,
                            constant_path.clone(),
                            format!(
                                "constant {} renamed to {} (value {})",
                                constant.name, counterpart.name, constant.value
                            ),
                        );
                    }
                    if constant.options != counterpart.options {
                        result.push(
                            DiffKind::OptionChanged,
                            constant_path.clone(),
                            "constant options changed",
                        );
                    }
                    if constant.documentation != counterpart.documentation {
                        result.push(
                            DiffKind::DocumentationChanged,
                            constant_path,
                            "documentation changed",
                        );
                    }
                }
                None => {
                    if updated.is_value_reserved(constant.value) {
                        result.push(
                            DiffKind::EnumConstantRemovedReserved,
                            constant_path,
                            format!(
                                "constant {} (value {}) removed and reserved",
                                constant.name, constant.value
                            ),
                        );
                    } else {
                        result.push(
                            DiffKind::EnumConstantRemoved,
                            constant_path,
                            format!(
                                "constant {} (value {}) removed without reservation",
                                constant.name, constant.value
                            ),
                        );
                    }
                }
            }
        }
        for constant in &updated.constants {
            if !original_values.contains(&constant.value) {
                result.push(
                    DiffKind::EnumConstantAdded,
                    format!("{path}.{}", constant.name),
                    format!("constant {} (value {}) added", constant.name, constant.value),
                );
            }
        }

        if original.options != updated.options {
            result.push(DiffKind::OptionChanged, path, "enum options changed");
        }
        if original.documentation != updated.documentation {
            result.push(DiffKind::DocumentationChanged, path, "documentation changed");
        }
    }
}

use protoreg::{CompatibilityDirection, DiffKind, ParsedSchema};

fn schema(data: &str) -> ParsedSchema {
    ParsedSchema::parse(data).unwrap()
}

fn kinds(result: &protoreg::CompareResult) -> Vec<DiffKind> {
    result.differences().iter().map(|d| d.kind).collect()
}

#[test]
fn removing_a_field_without_reservation_breaks() {
    let v1 = schema("syntax = \"proto3\"; message Order { string id = 1; int32 total = 2; }");
    let v2 = schema("syntax = \"proto3\"; message Order { string id = 1; }");
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::FieldRemoved]);
    assert!(!result.is_compatible());
}

#[test]
fn removing_a_field_with_reservation_is_compatible() {
    let v1 = schema("syntax = \"proto3\"; message Order { string id = 1; int32 total = 2; }");
    let v2 = schema(
        "syntax = \"proto3\"; message Order { reserved 2, \"total\"; string id = 1; }",
    );
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::FieldRemovedReserved]);
    assert!(result.is_compatible());
}

#[test]
fn field_rename_keeps_wire_compatibility() {
    let v1 = schema("syntax = \"proto3\"; message M { string user_name = 1; }");
    let v2 = schema("syntax = \"proto3\"; message M { string display_name = 1; }");
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::FieldRenamed]);
    assert!(result.is_compatible());
}

#[test]
fn label_change_to_repeated_breaks() {
    let v1 = schema("syntax = \"proto2\"; message M { optional string s = 1; }");
    let v2 = schema("syntax = \"proto2\"; message M { repeated string s = 1; }");
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::FieldLabelChanged]);
    assert!(!result.is_compatible());
}

#[test]
fn missing_proto2_label_equals_optional() {
    let v1 = schema("syntax = \"proto3\"; message M { string s = 1; }");
    let v2 = schema("syntax = \"proto2\"; message M { optional string s = 1; }");
    // Syntax changed, but the label itself did not.
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::SyntaxChanged]);
}

#[test]
fn wire_compatible_scalar_groups() {
    let compatible = [
        ("int32", "int64"),
        ("int32", "uint32"),
        ("uint64", "bool"),
        ("sint32", "sint64"),
        ("fixed32", "sfixed32"),
        ("fixed64", "sfixed64"),
        ("string", "bytes"),
    ];
    for (before, after) in compatible {
        let v1 = schema(&format!("syntax = \"proto3\"; message M {{ {before} v = 1; }}"));
        let v2 = schema(&format!("syntax = \"proto3\"; message M {{ {after} v = 1; }}"));
        let result = v1.compare(&v2);
        assert_eq!(
            kinds(&result),
            [DiffKind::FieldTypeWireCompatible],
            "{before} -> {after}"
        );
    }

    let v1 = schema("syntax = \"proto3\"; message M { int32 v = 1; }");
    let v2 = schema("syntax = \"proto3\"; message M { sint32 v = 1; }");
    assert_eq!(kinds(&v1.compare(&v2)), [DiffKind::FieldTypeChanged]);
}

#[test]
fn int_field_replaced_by_enum_is_wire_compatible() {
    let v1 = schema("syntax = \"proto3\"; message M { int32 status = 1; }");
    let v2 = schema(
        "syntax = \"proto3\"; enum Status { UNKNOWN = 0; OPEN = 1; } message M { Status status = 1; }",
    );
    let result = v1.compare(&v2);
    assert!(kinds(&result).contains(&DiffKind::FieldTypeWireCompatible));
    assert!(result.is_compatible());
}

#[test]
fn package_and_syntax_changes_break() {
    let v1 = schema("syntax = \"proto3\"; package a; message M { string s = 1; }");
    let v2 = schema("syntax = \"proto2\"; package b; message M { optional string s = 1; }");
    let result = v1.compare(&v2);
    let found = kinds(&result);
    assert!(found.contains(&DiffKind::SyntaxChanged));
    assert!(found.contains(&DiffKind::PackageChanged));
    assert!(!result.is_compatible());
}

#[test]
fn nested_message_changes_are_found() {
    let v1 = schema(
        "syntax = \"proto3\"; message Order { message Line { string sku = 1; } Line l = 1; }",
    );
    let v2 = schema(
        "syntax = \"proto3\"; message Order { message Line { int64 sku = 1; } Line l = 1; }",
    );
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::FieldTypeChanged]);
    assert_eq!(result.differences()[0].path, "Order.Line.sku");
}

#[test]
fn oneof_fields_share_the_message_tag_space() {
    let v1 = schema("syntax = \"proto3\"; message M { oneof o { string a = 1; } }");
    let v2 = schema("syntax = \"proto3\"; message M { string a = 1; }");
    // Moving a field out of a oneof keeps its tag and type.
    let result = v1.compare(&v2);
    assert!(result.differences().is_empty());
}

#[test]
fn removed_type_referenced_by_prefix_named_sibling_breaks() {
    let v1 = schema(
        "syntax = \"proto3\"; message Order { string id = 1; } message OrderLine { Order o = 1; }",
    );
    let v2 = schema("syntax = \"proto3\"; message OrderLine { Order o = 1; }");
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::TypeRemoved]);
    assert!(!result.is_compatible());
}

#[test]
fn uses_inside_the_removed_type_do_not_count_as_references() {
    let v1 = schema(
        r#"
        syntax = "proto3";
        message Unused {
          string s = 1;
          message Inner { Unused u = 1; }
          Inner i = 2;
        }
        message Keep { string k = 1; }
        "#,
    );
    let v2 = schema("syntax = \"proto3\"; message Keep { string k = 1; }");
    let result = v1.compare(&v2);
    assert_eq!(kinds(&result), [DiffKind::UnreferencedTypeRemoved]);
    assert!(result.is_compatible());
}

#[test]
fn enum_constant_rename_and_addition_are_compatible() {
    let v1 = schema("syntax = \"proto3\"; enum E { UNKNOWN = 0; OLD = 1; }");
    let v2 = schema("syntax = \"proto3\"; enum E { UNKNOWN = 0; RENEWED = 1; EXTRA = 2; }");
    let result = v1.compare(&v2);
    let found = kinds(&result);
    assert!(found.contains(&DiffKind::EnumConstantRenamed));
    assert!(found.contains(&DiffKind::EnumConstantAdded));
    assert!(result.is_compatible());
}

#[test]
fn type_kind_flip_counts_as_remove_and_add() {
    let v1 = schema("syntax = \"proto3\"; message Thing { string s = 1; }");
    let v2 = schema("syntax = \"proto3\"; enum Thing { UNKNOWN = 0; }");
    let result = v1.compare(&v2);
    let found = kinds(&result);
    assert!(found.contains(&DiffKind::TypeAdded));
    assert!(
        found.contains(&DiffKind::UnreferencedTypeRemoved)
            || found.contains(&DiffKind::TypeRemoved)
    );
}

#[test]
fn option_and_documentation_changes_are_compatible() {
    let v1 = schema("syntax = \"proto3\"; message M { // old\n string s = 1; }");
    let v2 = schema(
        "syntax = \"proto3\"; message M { // new\n string s = 1 [deprecated = true]; }",
    );
    let result = v1.compare(&v2);
    let found = kinds(&result);
    assert!(found.contains(&DiffKind::OptionChanged));
    assert!(found.contains(&DiffKind::DocumentationChanged));
    assert!(result.is_compatible());
}

#[test]
fn direction_flips_the_comparison() {
    let v1 = schema("syntax = \"proto3\"; message M { string a = 1; int32 b = 2; }");
    let v2 = schema("syntax = \"proto3\"; message M { string a = 1; }");

    // Removing a field breaks readers of old data; adding one does not.
    assert!(!v1.is_compatible(&v2, CompatibilityDirection::Backward));
    assert!(v1.is_compatible(&v2, CompatibilityDirection::Forward));
    assert!(v2.is_compatible(&v1, CompatibilityDirection::Backward));
    assert!(!v2.is_compatible(&v1, CompatibilityDirection::Forward));
}

#[test]
fn reusing_a_tag_with_an_incompatible_type_breaks() {
    let v1 = schema("syntax = \"proto3\"; message M { string a = 1; }");
    let v2 = schema("syntax = \"proto3\"; message M { int32 b = 1; }");
    // Tag identity pairs the old and new field even across the rename.
    let result = v1.compare(&v2);
    let found = kinds(&result);
    assert!(found.contains(&DiffKind::FieldRenamed));
    assert!(found.contains(&DiffKind::FieldTypeChanged));
    assert!(!result.is_compatible());
}

#[test]
fn default_value_change_is_reported() {
    let v1 = schema("syntax = \"proto2\"; message M { optional int32 n = 1 [default = 1]; }");
    let v2 = schema("syntax = \"proto2\"; message M { optional int32 n = 1 [default = 2]; }");
    assert_eq!(kinds(&v1.compare(&v2)), [DiffKind::FieldDefaultChanged]);
}

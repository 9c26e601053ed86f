//! Rendered canonical text must reparse into a tree equal to the source
//! tree, for every construct the renderer normalizes.

use pretty_assertions::assert_eq;
use protoreg::parser::parse;

fn assert_roundtrip(data: &str) {
    let first = parse("roundtrip.proto", data).unwrap();
    let rendered = first.render();
    let second = parse("roundtrip.proto", &rendered).unwrap();
    assert_eq!(first, second, "reparse of:\n{rendered}");
    // Canonical text is a fixed point of render.
    assert_eq!(rendered, second.render());
}

#[test]
fn roundtrips_minimal_proto3() {
    assert_roundtrip("syntax = \"proto3\"; message M { string a = 1; }");
}

#[test]
fn roundtrips_messy_whitespace_and_comments() {
    assert_roundtrip(
        "syntax='proto3';//c\nmessage   M{\n\n\tstring a=1;int32\n b = 2 ;}",
    );
}

#[test]
fn roundtrips_enum_declared_before_message() {
    // The renderer reorders: messages come before enums at every level.
    assert_roundtrip(
        r#"
        syntax = "proto3";
        enum Kind { UNKNOWN = 0; FAST = 1; }
        message M { Kind kind = 1; }
        "#,
    );
}

#[test]
fn roundtrips_proto2_defaults_and_groups() {
    assert_roundtrip(
        r#"
        syntax = "proto2";
        package legacy;
        message Record {
          required string name = 1;
          optional int32 count = 2 [default = -5];
          optional string note = 3 [default = "line\nbreak \"quoted\""];
          optional group Extra = 4 {
            optional string detail = 5;
          }
          extensions 100 to max;
        }
        "#,
    );
}

#[test]
fn roundtrips_oneof_reserved_and_nested_types() {
    assert_roundtrip(
        r#"
        syntax = "proto3";
        package shop.orders;

        import "google/protobuf/timestamp.proto";

        option java_package = "com.shop.orders";

        message Order {
          reserved 5, 10 to 20, "legacy_field";
          option deprecated = true;
          string id = 1;
          map<string, int64> counts = 2;
          oneof payment {
            string card_token = 3;
            string iban = 4;
          }
          message Line { string sku = 1; uint32 quantity = 2; }
          repeated Line lines = 6;
          enum Status { UNKNOWN = 0; OPEN = 1; SHIPPED = 2; }
          Status status = 7;
        }
        "#,
    );
}

#[test]
fn roundtrips_services_and_extends() {
    assert_roundtrip(
        r#"
        syntax = "proto2";
        message Req { optional string q = 1; extensions 10 to 20; }
        message Resp { optional string a = 1; }
        extend Req { optional int32 priority = 10; }
        service Search {
          option deprecated = false;
          rpc Lookup (Req) returns (stream Resp) {
            option timeout = 30;
          }
          rpc Ping (Req) returns (Resp);
        }
        "#,
    );
}

#[test]
fn roundtrips_option_value_shapes() {
    assert_roundtrip(
        r#"
        syntax = "proto3";
        option (my.custom) = { kind: FAST, weight: 2.5, tags: ["a", "b"] };
        option (my.custom).detail = SLOW;
        option plain = "text with \t escape";
        message M {
          string a = 1 [(validate.rules) = { min_len: 1 }, deprecated = true];
        }
        "#,
    );
}

#[test]
fn canonical_form_is_normalized() {
    let file = parse(
        "",
        "syntax   =  'proto3' ;\nmessage M {  string   a=1;\n}",
    )
    .unwrap();
    assert_eq!(
        file.render(),
        "syntax = \"proto3\";\n\nmessage M {\n  string a = 1;\n}\n"
    );
}

use protoreg::verifier::DependencyVerifier;
use protoreg::{ParsedSchema, Reference, ResolvedReference, VerificationResult};

#[test]
fn schema_without_imports_verifies_on_its_own() {
    let schema = ParsedSchema::parse(
        r#"
        syntax = "proto3";
        package shop;
        message Order {
          string id = 1;
          Item first = 2;
          message Line { Item item = 1; uint32 quantity = 2; }
          repeated Line lines = 3;
        }
        message Item { string sku = 1; }
        "#,
    )
    .unwrap();
    assert!(schema.verify_dependencies().is_ok());
}

#[test]
fn missing_type_is_reported_with_context() {
    let schema = ParsedSchema::parse(
        "syntax = \"proto3\"; package shop; message Order { Customer who = 1; }",
    )
    .unwrap();
    match schema.verify_dependencies() {
        VerificationResult::Undefined { type_name, context } => {
            assert_eq!(type_name, "Customer");
            assert_eq!(context, "shop.Order");
        }
        VerificationResult::Ok => panic!("expected an undefined type"),
    }
}

#[test]
fn well_known_google_types_need_no_declaration() {
    let schema = ParsedSchema::parse(
        r#"
        syntax = "proto3";
        import "google/protobuf/timestamp.proto";
        import "google/protobuf/any.proto";
        import "google/type/money.proto";
        message Event {
          google.protobuf.Timestamp at = 1;
          google.protobuf.Any payload = 2;
          google.type.Money price = 3;
          .google.protobuf.Duration wait = 4;
        }
        "#,
    )
    .unwrap();
    assert!(schema.verify_dependencies().is_ok());
}

#[test]
fn references_supply_declarations_recursively() {
    let resolver = |reference: &Reference| match reference.subject.as_str() {
        "customer" => Some(ResolvedReference {
            schema: r#"
                syntax = "proto3";
                package crm;
                import "address.proto";
                message Customer { string name = 1; Address home = 2; }
                "#
            .to_string(),
            references: Some(vec![Reference {
                name: "address.proto".into(),
                subject: "address".into(),
                version: 2,
            }]),
        }),
        "address" => Some(ResolvedReference {
            schema: "syntax = \"proto3\"; package crm; message Address { string city = 1; }"
                .to_string(),
            references: None,
        }),
        _ => None,
    };

    let schema = ParsedSchema::new(
        r#"
        syntax = "proto3";
        package crm;
        import "customer.proto";
        message Order { Customer buyer = 1; }
        "#,
        vec![Reference {
            name: "customer.proto".into(),
            subject: "customer".into(),
            version: 1,
        }],
        &resolver,
    )
    .unwrap();

    assert_eq!(schema.dependencies().len(), 1);
    let customer = &schema.dependencies()["customer.proto_customer_1"];
    assert_eq!(customer.schema.dependencies().len(), 1);
    assert!(schema.verify_dependencies().is_ok());
}

#[test]
fn dependency_closure_misses_are_reported() {
    let resolver = |reference: &Reference| {
        (reference.subject == "customer").then(|| ResolvedReference {
            // The dependency itself uses a type nobody declares.
            schema: "syntax = \"proto3\"; package crm; message Customer { Address home = 1; }"
                .to_string(),
            references: None,
        })
    };
    let schema = ParsedSchema::new(
        "syntax = \"proto3\"; package crm; import \"customer.proto\"; message Order { Customer buyer = 1; }",
        vec![Reference {
            name: "customer.proto".into(),
            subject: "customer".into(),
            version: 1,
        }],
        &resolver,
    )
    .unwrap();
    match schema.verify_dependencies() {
        VerificationResult::Undefined { type_name, .. } => assert_eq!(type_name, "Address"),
        VerificationResult::Ok => panic!("expected an undefined type"),
    }
}

#[test]
fn group_names_count_as_declared_types() {
    let schema = ParsedSchema::parse(
        r#"
        syntax = "proto2";
        package p;
        message M {
          optional group Result = 1 {
            optional string url = 2;
          }
          repeated Result results = 3;
        }
        "#,
    )
    .unwrap();
    assert!(schema.verify_dependencies().is_ok());
}

#[test]
fn manually_fed_declarations_verify() {
    let declared = [
        "a1.Place",
        "Place",
        "a1.Customer",
        "Customer",
        "a1.TestMessage",
        "TestMessage",
        "TestMessage.Enum",
        "a1.TestMessage.Value",
        "TestMessage.Value",
        "a1.TestMessage.Value.Label",
        "TestMessage.Value.Label",
    ];
    let used = [
        ("a1.Place", "string"),
        ("a1.Place", "int32"),
        ("a1.Customer", "string"),
        ("a1.Customer", "int32"),
        ("a1.Customer", "Place"),
        ("a1.TestMessage", "int32"),
        ("a1.TestMessage", "string"),
        ("a1.TestMessage", ".a1.TestMessage.Value"),
        ("TestMessage", "Customer"),
        ("TestMessage", "int32"),
        ("TestMessage.Value", "int32"),
        ("TestMessage.Value", "string"),
    ];

    let mut verifier = DependencyVerifier::new();
    for name in declared {
        verifier.add_declared_type(name);
    }
    for (context, type_name) in used {
        verifier.add_used_type(context, type_name);
    }
    assert!(verifier.verify().is_ok());

    verifier.add_used_type("TestMessage.Delta", "Tag");
    match verifier.verify() {
        VerificationResult::Undefined { type_name, context } => {
            assert_eq!(type_name, "Tag");
            assert_eq!(context, "TestMessage.Delta");
        }
        VerificationResult::Ok => panic!("expected an undefined type"),
    }
}

#[test]
fn verifier_records_imports_and_uses() {
    let file = protoreg::parser::parse(
        "order.proto",
        r#"
        syntax = "proto3";
        package shop;
        import "item.proto";
        message Order { map<string, Item> items = 1; }
        "#,
    )
    .unwrap();
    let mut verifier = DependencyVerifier::new();
    verifier.collect(&file);
    assert_eq!(verifier.import_paths(), ["item.proto"]);
    // Map uses count for both key and value types.
    let used: Vec<&str> = verifier.used_types().iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(used, ["string", "Item"]);
}

#[cfg(feature = "serde")]
#[test]
fn reference_serializes_to_json() {
    let reference = Reference {
        name: "item.proto".into(),
        subject: "item".into(),
        version: 3,
    };
    let json = serde_json::to_string(&reference).unwrap();
    assert_eq!(
        json,
        "{\"name\":\"item.proto\",\"subject\":\"item\",\"version\":3}"
    );
    let back: Reference = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reference);
}

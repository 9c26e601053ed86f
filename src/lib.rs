//! Protobuf schema handling for schema registries.
//!
//! The crate parses protobuf schema text into an AST, renders a canonical
//! normalized form, verifies type references across a schema's dependency
//! closure, and structurally compares schema versions for compatibility.
//!
//! ```
//! use protoreg::ParsedSchema;
//!
//! let schema = ParsedSchema::parse(
//!     "syntax = \"proto3\"; message M { string a = 1; }",
//! ).unwrap();
//! assert!(schema.canonical_string().contains("message M {"));
//! assert!(schema.verify_dependencies().is_ok());
//! ```

pub mod ast;
pub mod compare;
pub mod error;
pub mod location;
pub mod parser;
pub mod render;
pub mod schema;
pub mod verifier;
pub mod wellknown;

pub use compare::{CompareResult, DiffKind, Difference};
pub use error::{LexError, ParseError, SchemaError};
pub use location::Location;
pub use ast::SchemaFile;
pub use schema::{
    CompatibilityDirection, Dependency, ParsedSchema, Reference, ReferenceResolver,
    ResolvedReference,
};
pub use verifier::{DependencyVerifier, VerificationResult};

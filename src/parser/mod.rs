//! Protobuf schema text parsing.
//!
//! [`lexer`] supplies grammar-aware token reads over raw text and
//! [`grammar`] drives them with a single-pass recursive descent, producing
//! a [`crate::ast::SchemaFile`].

pub mod grammar;
pub mod lexer;

pub use grammar::parse;

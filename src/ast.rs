//! AST node model for parsed protobuf schema files.
//!
//! Nodes are immutable after construction and owned by their parent
//! container. Structural equality (`PartialEq`) compares every semantic
//! attribute but ignores source locations and documentation, so two parses
//! of differently-formatted but equivalent text compare equal.

use crate::location::Location;

/// The syntax level declared by a schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

impl Syntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }

    /// Parse the label of a `syntax = "..."` directive.
    pub fn from_label(label: &str) -> Option<Syntax> {
        match label {
            "proto2" => Some(Syntax::Proto2),
            "proto3" => Some(Syntax::Proto3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proto2 field label. Proto3 singular fields carry no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Optional => "optional",
            Label::Required => "required",
            Label::Repeated => "repeated",
        }
    }
}

/// Root of a parsed schema: one `.proto` file.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub location: Location,
    pub package_name: Option<String>,
    /// Declared syntax; absent means proto2.
    pub syntax: Option<Syntax>,
    pub imports: Vec<String>,
    pub public_imports: Vec<String>,
    pub types: Vec<TypeDecl>,
    pub services: Vec<ServiceDecl>,
    pub extends: Vec<ExtendDecl>,
    pub options: Vec<OptionDecl>,
}

impl SchemaFile {
    pub fn syntax_or_default(&self) -> Syntax {
        self.syntax.unwrap_or(Syntax::Proto2)
    }
}

/// A nested or top-level type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    Message(MessageDecl),
    Enum(EnumDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Message(m) => &m.name,
            TypeDecl::Enum(e) => &e.name,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            TypeDecl::Message(m) => &m.location,
            TypeDecl::Enum(e) => &e.location,
        }
    }

    pub fn documentation(&self) -> &str {
        match self {
            TypeDecl::Message(m) => &m.documentation,
            TypeDecl::Enum(e) => &e.documentation,
        }
    }

    /// Nested declarations; empty for enums, which cannot nest types.
    pub fn nested_types(&self) -> &[TypeDecl] {
        match self {
            TypeDecl::Message(m) => &m.nested_types,
            TypeDecl::Enum(_) => &[],
        }
    }
}

/// A `message` declaration.
#[derive(Debug, Clone)]
pub struct MessageDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub fields: Vec<FieldDecl>,
    pub one_ofs: Vec<OneOfDecl>,
    pub groups: Vec<GroupDecl>,
    pub reserveds: Vec<ReservedDecl>,
    pub extensions: Vec<ExtensionsDecl>,
    pub nested_types: Vec<TypeDecl>,
    pub options: Vec<OptionDecl>,
}

impl MessageDecl {
    /// Direct fields plus the fields of every contained oneof, the set
    /// sharing this message's tag space.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields
            .iter()
            .chain(self.one_ofs.iter().flat_map(|o| o.fields.iter()))
    }

    pub fn is_tag_reserved(&self, tag: i32) -> bool {
        self.reserveds
            .iter()
            .flat_map(|r| r.values.iter())
            .any(|v| v.covers_tag(tag))
    }

    pub fn is_name_reserved(&self, name: &str) -> bool {
        self.reserveds
            .iter()
            .flat_map(|r| r.values.iter())
            .any(|v| v.covers_name(name))
    }
}

/// A field declaration, inside a message, oneof, group or extend block.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub location: Location,
    pub label: Option<Label>,
    /// Declared type as written: a scalar name, a (possibly qualified)
    /// message/enum name, or `map<K, V>`.
    pub element_type: String,
    pub name: String,
    pub tag: i32,
    /// Proto2 `[default = ...]`, pulled out of the bracket option list.
    pub default_value: Option<OptionValue>,
    pub options: Vec<OptionDecl>,
    pub documentation: String,
}

impl FieldDecl {
    pub fn is_map(&self) -> bool {
        self.element_type.starts_with("map<")
    }

    /// For `map<K, V>` fields, the key and value type names.
    pub fn map_key_value(&self) -> Option<(&str, &str)> {
        let inner = self
            .element_type
            .strip_prefix("map<")?
            .strip_suffix('>')?;
        let (key, value) = inner.split_once(',')?;
        Some((key.trim(), value.trim()))
    }
}

/// A `oneof` group of mutually exclusive fields.
#[derive(Debug, Clone)]
pub struct OneOfDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub fields: Vec<FieldDecl>,
    pub options: Vec<OptionDecl>,
}

/// A legacy proto2 `group` declaration. Its tag lives in the enclosing
/// message's tag space.
#[derive(Debug, Clone)]
pub struct GroupDecl {
    pub location: Location,
    pub label: Option<Label>,
    pub name: String,
    pub tag: i32,
    pub documentation: String,
    pub fields: Vec<FieldDecl>,
}

/// A single `reserved ...;` statement.
#[derive(Debug, Clone)]
pub struct ReservedDecl {
    pub location: Location,
    pub documentation: String,
    pub values: Vec<ReservedValue>,
}

/// One entry of a reserved statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservedValue {
    Tag(i32),
    /// Inclusive range.
    Range(i32, i32),
    Name(String),
}

impl ReservedValue {
    pub fn covers_tag(&self, tag: i32) -> bool {
        match self {
            ReservedValue::Tag(t) => *t == tag,
            ReservedValue::Range(start, end) => (*start..=*end).contains(&tag),
            ReservedValue::Name(_) => false,
        }
    }

    pub fn covers_name(&self, name: &str) -> bool {
        matches!(self, ReservedValue::Name(n) if n == name)
    }
}

/// An `extensions N [to M];` statement.
#[derive(Debug, Clone)]
pub struct ExtensionsDecl {
    pub location: Location,
    pub documentation: String,
    pub start: i32,
    /// Inclusive; equals `start` for single-tag statements and
    /// `MAX_TAG_VALUE` for `to max`.
    pub end: i32,
}

/// An `enum` declaration.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub constants: Vec<EnumConstant>,
    pub reserveds: Vec<ReservedDecl>,
    pub options: Vec<OptionDecl>,
}

impl EnumDecl {
    pub fn is_value_reserved(&self, value: i32) -> bool {
        self.reserveds
            .iter()
            .flat_map(|r| r.values.iter())
            .any(|v| v.covers_tag(value))
    }

    /// True when the `allow_alias` option permits duplicate constant
    /// values.
    pub fn allows_alias(&self) -> bool {
        self.options.iter().any(|o| {
            o.name == "allow_alias"
                && match &o.value {
                    OptionValue::Boolean(b) => *b,
                    OptionValue::Identifier(i) => i == "true",
                    _ => false,
                }
        })
    }
}

/// A single enum constant.
#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub location: Location,
    pub name: String,
    pub value: i32,
    pub documentation: String,
    pub options: Vec<OptionDecl>,
}

/// An `option name = value` assignment, at any level.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDecl {
    pub name: String,
    pub value: OptionValue,
    /// Byte length of the leading run of `name` that was written inside
    /// parentheses, as in `(my.custom).detail`; zero for plain names.
    pub paren_len: usize,
}

impl OptionDecl {
    /// True for custom/extension options, which render as `(name)`.
    pub fn is_parenthesized(&self) -> bool {
        self.paren_len > 0
    }
}

/// The value side of an option assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    /// An enum identifier such as `SPEED` or `HOME`.
    Identifier(String),
    /// Numeric literal kept as source text, so floats render unchanged.
    Number(String),
    Boolean(bool),
    /// `{ key: value, ... }` aggregate.
    Map(Vec<(String, OptionValue)>),
    /// `[a, b, ...]` list.
    List(Vec<OptionValue>),
}

/// A `service` declaration.
#[derive(Debug, Clone)]
pub struct ServiceDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub rpcs: Vec<RpcDecl>,
    pub options: Vec<OptionDecl>,
}

/// An `rpc` method inside a service.
#[derive(Debug, Clone)]
pub struct RpcDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub request_type: String,
    pub response_type: String,
    pub request_streaming: bool,
    pub response_streaming: bool,
    pub options: Vec<OptionDecl>,
}

/// An `extend` block adding fields to another message.
#[derive(Debug, Clone)]
pub struct ExtendDecl {
    pub location: Location,
    pub name: String,
    pub documentation: String,
    pub fields: Vec<FieldDecl>,
}

// Structural equality. Locations and documentation are excluded so that a
// reparse of rendered text compares equal to the original tree. Type lists
// compare as grouped sequences (messages in order, then enums in order)
// because the canonical renderer emits messages before enums.

pub(crate) fn type_lists_equal(a: &[TypeDecl], b: &[TypeDecl]) -> bool {
    let split = |list: &[TypeDecl]| {
        let messages: Vec<usize> = (0..list.len())
            .filter(|&i| matches!(list[i], TypeDecl::Message(_)))
            .collect();
        let enums: Vec<usize> = (0..list.len())
            .filter(|&i| matches!(list[i], TypeDecl::Enum(_)))
            .collect();
        (messages, enums)
    };
    let (am, ae) = split(a);
    let (bm, be) = split(b);
    am.len() == bm.len()
        && ae.len() == be.len()
        && am.iter().zip(&bm).all(|(&i, &j)| a[i] == b[j])
        && ae.iter().zip(&be).all(|(&i, &j)| a[i] == b[j])
}

impl PartialEq for SchemaFile {
    fn eq(&self, other: &Self) -> bool {
        self.package_name == other.package_name
            && self.syntax == other.syntax
            && self.imports == other.imports
            && self.public_imports == other.public_imports
            && type_lists_equal(&self.types, &other.types)
            && self.services == other.services
            && self.extends == other.extends
            && self.options == other.options
    }
}

impl PartialEq for MessageDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.fields == other.fields
            && self.one_ofs == other.one_ofs
            && self.groups == other.groups
            && self.reserveds == other.reserveds
            && self.extensions == other.extensions
            && type_lists_equal(&self.nested_types, &other.nested_types)
            && self.options == other.options
    }
}

impl PartialEq for FieldDecl {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.element_type == other.element_type
            && self.name == other.name
            && self.tag == other.tag
            && self.default_value == other.default_value
            && self.options == other.options
    }
}

impl PartialEq for OneOfDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields && self.options == other.options
    }
}

impl PartialEq for GroupDecl {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.name == other.name
            && self.tag == other.tag
            && self.fields == other.fields
    }
}

impl PartialEq for ReservedDecl {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl PartialEq for ExtensionsDecl {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl PartialEq for EnumDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.constants == other.constants
            && self.reserveds == other.reserveds
            && self.options == other.options
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value && self.options == other.options
    }
}

impl PartialEq for ServiceDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.rpcs == other.rpcs && self.options == other.options
    }
}

impl PartialEq for RpcDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.request_type == other.request_type
            && self.response_type == other.response_type
            && self.request_streaming == other.request_streaming
            && self.response_streaming == other.response_streaming
            && self.options == other.options
    }
}

impl PartialEq for ExtendDecl {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, tag: i32) -> FieldDecl {
        FieldDecl {
            location: Location::origin("a.proto").at(1, 1),
            label: None,
            element_type: "string".into(),
            name: name.into(),
            tag,
            default_value: None,
            options: Vec::new(),
            documentation: String::new(),
        }
    }

    #[test]
    fn test_equality_ignores_location_and_docs() {
        let mut a = field("name", 1);
        let mut b = field("name", 1);
        b.location = Location::origin("b.proto").at(99, 3);
        b.documentation = "completely different".into();
        assert_eq!(a, b);
        a.tag = 2;
        assert_ne!(a, b);
    }

    #[test]
    fn test_map_key_value() {
        let mut f = field("labels", 1);
        f.element_type = "map<string, int32>".into();
        assert!(f.is_map());
        assert_eq!(f.map_key_value(), Some(("string", "int32")));
    }

    #[test]
    fn test_reserved_coverage() {
        let decl = ReservedDecl {
            location: Location::origin(""),
            documentation: String::new(),
            values: vec![
                ReservedValue::Tag(3),
                ReservedValue::Range(10, 20),
                ReservedValue::Name("legacy".into()),
            ],
        };
        assert!(decl.values.iter().any(|v| v.covers_tag(3)));
        assert!(decl.values.iter().any(|v| v.covers_tag(15)));
        assert!(!decl.values.iter().any(|v| v.covers_tag(21)));
        assert!(decl.values.iter().any(|v| v.covers_name("legacy")));
    }
}

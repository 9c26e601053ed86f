use std::collections::HashMap;

use super::lexer::Lexer;
use crate::ast::*;
use crate::error::ParseError;
use crate::location::Location;
use crate::wellknown::{MAX_TAG_VALUE, MIN_TAG_VALUE, RESERVED_TAG_VALUE_END, RESERVED_TAG_VALUE_START};

/// Parse protobuf schema text into a `SchemaFile`.
///
/// `origin` names the source in diagnostics, typically the import path or
/// registry subject. The parse is a single pass: a declaration, once
/// accepted, is committed to its parent immediately, and structural rules
/// (tag ranges, duplicate names and tags, reserved reuse, label legality)
/// are enforced as the tree is built.
pub fn parse(origin: &str, data: &str) -> Result<SchemaFile, ParseError> {
    Parser {
        lexer: Lexer::new(data, Location::origin(origin)),
        syntax: None,
        declaration_count: 0,
    }
    .read_schema_file()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    syntax: Option<Syntax>,
    declaration_count: usize,
}

impl<'a> Parser<'a> {
    fn syntax_or_default(&self) -> Syntax {
        self.syntax.unwrap_or(Syntax::Proto2)
    }

    fn err_syntax<T>(&self, location: Location, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            location,
            message: message.into(),
        })
    }

    /// Range-check a field/group tag at its point of declaration.
    fn check_tag(&self, tag: i64, location: Location) -> Result<i32, ParseError> {
        if tag < MIN_TAG_VALUE as i64 || tag > MAX_TAG_VALUE as i64 {
            return Err(ParseError::TagOutOfRange { tag, location });
        }
        let tag = tag as i32;
        if (RESERVED_TAG_VALUE_START..=RESERVED_TAG_VALUE_END).contains(&tag) {
            return Err(ParseError::TagInReservedRange { tag, location });
        }
        Ok(tag)
    }

    /// Reject a sibling type declaration reusing an earlier sibling's name.
    fn check_sibling_name(
        &self,
        seen: &mut HashMap<String, Location>,
        name: &str,
        location: &Location,
    ) -> Result<(), ParseError> {
        if let Some(previous) = seen.get(name) {
            return Err(ParseError::DuplicateName {
                name: name.to_string(),
                location: location.clone(),
                previous: previous.clone(),
            });
        }
        seen.insert(name.to_string(), location.clone());
        Ok(())
    }

    fn read_schema_file(mut self) -> Result<SchemaFile, ParseError> {
        let location = self.lexer.location();
        let mut file = SchemaFile {
            location,
            package_name: None,
            syntax: None,
            imports: Vec::new(),
            public_imports: Vec::new(),
            types: Vec::new(),
            services: Vec::new(),
            extends: Vec::new(),
            options: Vec::new(),
        };
        let mut seen_types: HashMap<String, Location> = HashMap::new();

        loop {
            let documentation = self.lexer.read_documentation()?;
            if self.lexer.exhausted() {
                file.syntax = self.syntax;
                return Ok(file);
            }
            let location = self.lexer.location();
            let word = self.lexer.read_word()?;
            match word.as_str() {
                "syntax" => {
                    if self.declaration_count > 0 {
                        return self
                            .err_syntax(location, "'syntax' must be the first declaration");
                    }
                    self.lexer.require('=')?;
                    let label = self.lexer.read_quoted_string()?;
                    let syntax = match Syntax::from_label(&label) {
                        Some(s) => s,
                        None => {
                            return self.err_syntax(
                                location,
                                format!("unexpected syntax '{label}', expected 'proto2' or 'proto3'"),
                            )
                        }
                    };
                    self.lexer.require(';')?;
                    self.syntax = Some(syntax);
                }
                "package" => {
                    if file.package_name.is_some() {
                        return self.err_syntax(location, "too many package names");
                    }
                    file.package_name = Some(self.lexer.read_word()?);
                    self.lexer.require(';')?;
                }
                "import" => {
                    let first = self.lexer.read_string()?;
                    if first == "public" {
                        file.public_imports.push(self.lexer.read_quoted_string()?);
                    } else {
                        file.imports.push(first);
                    }
                    self.lexer.require(';')?;
                }
                "option" => {
                    let option = self.read_option_assignment()?;
                    self.lexer.require(';')?;
                    file.options.push(option);
                }
                "message" => {
                    let message = self.read_message(documentation)?;
                    self.check_sibling_name(&mut seen_types, &message.name, &message.location)?;
                    file.types.push(TypeDecl::Message(message));
                }
                "enum" => {
                    let decl = self.read_enum(documentation)?;
                    self.check_sibling_name(&mut seen_types, &decl.name, &decl.location)?;
                    file.types.push(TypeDecl::Enum(decl));
                }
                "extend" => {
                    file.extends.push(self.read_extend(documentation)?);
                }
                "service" => {
                    file.services.push(self.read_service(documentation)?);
                }
                _ => {
                    return self
                        .err_syntax(location, format!("unexpected label '{word}'"));
                }
            }
            self.declaration_count += 1;
        }
    }

    fn read_message(&mut self, documentation: String) -> Result<MessageDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;
        self.lexer.require('{')?;

        let mut message = MessageDecl {
            location,
            name,
            documentation,
            fields: Vec::new(),
            one_ofs: Vec::new(),
            groups: Vec::new(),
            reserveds: Vec::new(),
            extensions: Vec::new(),
            nested_types: Vec::new(),
            options: Vec::new(),
        };
        let mut seen_types: HashMap<String, Location> = HashMap::new();

        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            match word.as_str() {
                "message" => {
                    let nested = self.read_message(doc)?;
                    self.check_sibling_name(&mut seen_types, &nested.name, &nested.location)?;
                    message.nested_types.push(TypeDecl::Message(nested));
                }
                "enum" => {
                    let nested = self.read_enum(doc)?;
                    self.check_sibling_name(&mut seen_types, &nested.name, &nested.location)?;
                    message.nested_types.push(TypeDecl::Enum(nested));
                }
                "oneof" => message.one_ofs.push(self.read_one_of(doc)?),
                "reserved" => message.reserveds.push(self.read_reserved(doc)?),
                "extensions" => message.extensions.extend(self.read_extensions(doc)?),
                "option" => {
                    let option = self.read_option_assignment()?;
                    self.lexer.require(';')?;
                    message.options.push(option);
                }
                "optional" | "required" | "repeated" => {
                    let label = match word.as_str() {
                        "optional" => Label::Optional,
                        "required" => Label::Required,
                        _ => Label::Repeated,
                    };
                    if self.syntax_or_default() == Syntax::Proto3 && label != Label::Repeated {
                        return self.err_syntax(
                            member_location,
                            format!("label '{word}' is not allowed under proto3"),
                        );
                    }
                    let type_word = self.lexer.read_word()?;
                    if type_word == "group" {
                        message
                            .groups
                            .push(self.read_group(Some(label), doc)?);
                    } else {
                        let element_type = self.lexer.read_data_type_with(type_word)?;
                        message.fields.push(self.read_field(
                            Some(label),
                            element_type,
                            doc,
                            member_location,
                        )?);
                    }
                }
                "group" => message.groups.push(self.read_group(None, doc)?),
                _ => {
                    let element_type = self.lexer.read_data_type_with(word)?;
                    if self.syntax_or_default() == Syntax::Proto2
                        && !element_type.starts_with("map<")
                    {
                        return self.err_syntax(
                            member_location,
                            "expected a label (optional, required or repeated) under proto2",
                        );
                    }
                    message
                        .fields
                        .push(self.read_field(None, element_type, doc, member_location)?);
                }
            }
        }

        self.validate_message(&message)?;
        Ok(message)
    }

    /// Post-body checks: tag uniqueness across direct fields, oneof fields
    /// and groups, and no reuse of reserved tags or names.
    fn validate_message(&self, message: &MessageDecl) -> Result<(), ParseError> {
        let mut tags: HashMap<i32, &Location> = HashMap::new();
        let group_tags = message.groups.iter().map(|g| (g.tag, &g.location));
        for (tag, location) in message
            .all_fields()
            .map(|f| (f.tag, &f.location))
            .chain(group_tags)
        {
            if tags.insert(tag, location).is_some() {
                return Err(ParseError::DuplicateTag {
                    scope: message.name.clone(),
                    tag,
                    location: location.clone(),
                });
            }
        }
        for field in message.all_fields() {
            if message.is_tag_reserved(field.tag) {
                return Err(ParseError::ReservedTagReused {
                    scope: message.name.clone(),
                    tag: field.tag,
                    location: field.location.clone(),
                });
            }
            if message.is_name_reserved(&field.name) {
                return Err(ParseError::ReservedNameReused {
                    scope: message.name.clone(),
                    name: field.name.clone(),
                    location: field.location.clone(),
                });
            }
        }
        Ok(())
    }

    fn read_field(
        &mut self,
        label: Option<Label>,
        element_type: String,
        documentation: String,
        location: Location,
    ) -> Result<FieldDecl, ParseError> {
        let name = self.lexer.read_word()?;
        self.lexer.require('=')?;
        let tag_location = self.lexer.location();
        let raw_tag = self.lexer.read_int()?;
        let tag = self.check_tag(raw_tag, tag_location)?;

        let mut options = Vec::new();
        let mut default_value = None;
        if self.lexer.try_read('[')? {
            loop {
                let option = self.read_option_assignment()?;
                if !option.is_parenthesized() && option.name == "default" {
                    default_value = Some(option.value);
                } else {
                    options.push(option);
                }
                if !self.lexer.try_read(',')? {
                    break;
                }
            }
            self.lexer.require(']')?;
        }
        self.lexer.require(';')?;

        let mut documentation = documentation;
        self.lexer
            .try_append_trailing_documentation(&mut documentation)?;

        Ok(FieldDecl {
            location,
            label,
            element_type,
            name,
            tag,
            default_value,
            options,
            documentation,
        })
    }

    fn read_one_of(&mut self, documentation: String) -> Result<OneOfDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;
        self.lexer.require('{')?;

        let mut one_of = OneOfDecl {
            location,
            name,
            documentation,
            fields: Vec::new(),
            options: Vec::new(),
        };
        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            match word.as_str() {
                "option" => {
                    let option = self.read_option_assignment()?;
                    self.lexer.require(';')?;
                    one_of.options.push(option);
                }
                "optional" | "required" | "repeated" => {
                    return self.err_syntax(
                        member_location,
                        format!("label '{word}' is not allowed inside oneof"),
                    );
                }
                "group" => {
                    return self
                        .err_syntax(member_location, "'group' is not supported inside oneof");
                }
                _ => {
                    let element_type = self.lexer.read_data_type_with(word)?;
                    one_of
                        .fields
                        .push(self.read_field(None, element_type, doc, member_location)?);
                }
            }
        }
        Ok(one_of)
    }

    fn read_group(
        &mut self,
        label: Option<Label>,
        documentation: String,
    ) -> Result<GroupDecl, ParseError> {
        let location = self.lexer.location();
        if self.syntax_or_default() == Syntax::Proto3 {
            return self.err_syntax(location, "'group' is not supported under proto3");
        }
        let name = self.lexer.read_word()?;
        self.lexer.require('=')?;
        let tag_location = self.lexer.location();
        let raw_tag = self.lexer.read_int()?;
        let tag = self.check_tag(raw_tag, tag_location)?;
        self.lexer.require('{')?;

        let mut fields = Vec::new();
        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            let (field_label, type_word) = match word.as_str() {
                "optional" => (Some(Label::Optional), self.lexer.read_word()?),
                "required" => (Some(Label::Required), self.lexer.read_word()?),
                "repeated" => (Some(Label::Repeated), self.lexer.read_word()?),
                _ => (None, word),
            };
            let element_type = self.lexer.read_data_type_with(type_word)?;
            fields.push(self.read_field(field_label, element_type, doc, member_location)?);
        }

        Ok(GroupDecl {
            location,
            label,
            name,
            tag,
            documentation,
            fields,
        })
    }

    fn read_reserved(&mut self, documentation: String) -> Result<ReservedDecl, ParseError> {
        let location = self.lexer.location();
        let mut values = Vec::new();
        loop {
            match self.lexer.peek_char()? {
                '"' | '\'' => values.push(ReservedValue::Name(self.lexer.read_quoted_string()?)),
                _ => {
                    let start_location = self.lexer.location();
                    let raw_start = self.lexer.read_int()?;
                    let start = self.range_bound(raw_start, &start_location)?;
                    if self.lexer.peek_char()?.is_ascii_alphabetic() {
                        let keyword_location = self.lexer.location();
                        let keyword = self.lexer.read_word()?;
                        if keyword != "to" {
                            return self.err_syntax(
                                keyword_location,
                                format!("expected 'to' but was '{keyword}'"),
                            );
                        }
                        let end = self.read_range_end()?;
                        values.push(ReservedValue::Range(start, end));
                    } else {
                        values.push(ReservedValue::Tag(start));
                    }
                }
            }
            if !self.lexer.try_read(',')? {
                break;
            }
        }
        self.lexer.require(';')?;
        if values.is_empty() {
            return self.err_syntax(location, "'reserved' must name at least one tag or name");
        }
        Ok(ReservedDecl {
            location,
            documentation,
            values,
        })
    }

    fn read_extensions(
        &mut self,
        documentation: String,
    ) -> Result<Vec<ExtensionsDecl>, ParseError> {
        let mut declarations = Vec::new();
        loop {
            let location = self.lexer.location();
            let raw_start = self.lexer.read_int()?;
            let start = self.range_bound(raw_start, &location)?;
            let end = if self.lexer.peek_char()?.is_ascii_alphabetic() {
                let keyword_location = self.lexer.location();
                let keyword = self.lexer.read_word()?;
                if keyword != "to" {
                    return self.err_syntax(
                        keyword_location,
                        format!("expected 'to' but was '{keyword}'"),
                    );
                }
                self.read_range_end()?
            } else {
                start
            };
            declarations.push(ExtensionsDecl {
                location,
                documentation: documentation.clone(),
                start,
                end,
            });
            if !self.lexer.try_read(',')? {
                break;
            }
        }
        self.lexer.require(';')?;
        Ok(declarations)
    }

    /// Read the end of a `N to M` range: either an integer or `max`.
    fn read_range_end(&mut self) -> Result<i32, ParseError> {
        let location = self.lexer.location();
        let word = self.lexer.read_word()?;
        if word == "max" {
            return Ok(MAX_TAG_VALUE);
        }
        match word.parse::<i64>() {
            Ok(value) => self.range_bound(value, &location),
            Err(_) => self.err_syntax(
                location,
                format!("expected an integer or 'max' but was '{word}'"),
            ),
        }
    }

    /// Bounds-check a reserved/extensions range endpoint. The protobuf
    /// implementation range stays permitted here; only liveness of field
    /// tags excludes it.
    fn range_bound(&self, value: i64, location: &Location) -> Result<i32, ParseError> {
        if value < MIN_TAG_VALUE as i64 || value > MAX_TAG_VALUE as i64 {
            return Err(ParseError::TagOutOfRange {
                tag: value,
                location: location.clone(),
            });
        }
        Ok(value as i32)
    }

    fn read_enum(&mut self, documentation: String) -> Result<EnumDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;
        self.lexer.require('{')?;

        let mut decl = EnumDecl {
            location,
            name,
            documentation,
            constants: Vec::new(),
            reserveds: Vec::new(),
            options: Vec::new(),
        };
        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            match word.as_str() {
                "option" => {
                    let option = self.read_option_assignment()?;
                    self.lexer.require(';')?;
                    decl.options.push(option);
                }
                "reserved" => decl.reserveds.push(self.read_reserved(doc)?),
                _ => {
                    self.lexer.require('=')?;
                    let value_location = self.lexer.location();
                    let value = self.lexer.read_int()?;
                    if value < i32::MIN as i64 || value > i32::MAX as i64 {
                        return self.err_syntax(
                            value_location,
                            format!("enum constant value {value} does not fit in 32 bits"),
                        );
                    }
                    let mut options = Vec::new();
                    if self.lexer.try_read('[')? {
                        loop {
                            options.push(self.read_option_assignment()?);
                            if !self.lexer.try_read(',')? {
                                break;
                            }
                        }
                        self.lexer.require(']')?;
                    }
                    self.lexer.require(';')?;
                    let mut doc = doc;
                    self.lexer.try_append_trailing_documentation(&mut doc)?;
                    decl.constants.push(EnumConstant {
                        location: member_location,
                        name: word,
                        value: value as i32,
                        documentation: doc,
                        options,
                    });
                }
            }
        }

        if !decl.allows_alias() {
            let mut seen: HashMap<i32, &str> = HashMap::new();
            for constant in &decl.constants {
                if let Some(previous) = seen.insert(constant.value, &constant.name) {
                    return self.err_syntax(
                        constant.location.clone(),
                        format!(
                            "duplicate enum constant value {} for '{}' and '{}' (missing allow_alias?)",
                            constant.value, previous, constant.name
                        ),
                    );
                }
            }
        }
        Ok(decl)
    }

    fn read_extend(&mut self, documentation: String) -> Result<ExtendDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;
        self.lexer.require('{')?;

        let mut fields = Vec::new();
        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            let (label, type_word) = match word.as_str() {
                "optional" => (Some(Label::Optional), self.lexer.read_word()?),
                "required" => (Some(Label::Required), self.lexer.read_word()?),
                "repeated" => (Some(Label::Repeated), self.lexer.read_word()?),
                _ => (None, word),
            };
            let element_type = self.lexer.read_data_type_with(type_word)?;
            fields.push(self.read_field(label, element_type, doc, member_location)?);
        }

        Ok(ExtendDecl {
            location,
            name,
            documentation,
            fields,
        })
    }

    fn read_service(&mut self, documentation: String) -> Result<ServiceDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;
        self.lexer.require('{')?;

        let mut service = ServiceDecl {
            location,
            name,
            documentation,
            rpcs: Vec::new(),
            options: Vec::new(),
        };
        loop {
            let doc = self.lexer.read_documentation()?;
            if self.lexer.try_read('}')? {
                break;
            }
            let member_location = self.lexer.location();
            let word = self.lexer.read_word()?;
            match word.as_str() {
                "option" => {
                    let option = self.read_option_assignment()?;
                    self.lexer.require(';')?;
                    service.options.push(option);
                }
                "rpc" => service.rpcs.push(self.read_rpc(doc)?),
                _ => {
                    return self.err_syntax(
                        member_location,
                        format!("unexpected label '{word}' in service"),
                    );
                }
            }
        }
        Ok(service)
    }

    fn read_rpc(&mut self, documentation: String) -> Result<RpcDecl, ParseError> {
        let location = self.lexer.location();
        let name = self.lexer.read_word()?;

        self.lexer.require('(')?;
        let (request_streaming, request_type) = self.read_rpc_type()?;
        self.lexer.require(')')?;

        let keyword_location = self.lexer.location();
        let keyword = self.lexer.read_word()?;
        if keyword != "returns" {
            return self.err_syntax(
                keyword_location,
                format!("expected 'returns' but was '{keyword}'"),
            );
        }

        self.lexer.require('(')?;
        let (response_streaming, response_type) = self.read_rpc_type()?;
        self.lexer.require(')')?;

        let mut options = Vec::new();
        if self.lexer.try_read('{')? {
            loop {
                self.lexer.read_documentation()?;
                if self.lexer.try_read('}')? {
                    break;
                }
                let option_location = self.lexer.location();
                let word = self.lexer.read_word()?;
                if word != "option" {
                    return self.err_syntax(
                        option_location,
                        format!("expected 'option' but was '{word}'"),
                    );
                }
                options.push(self.read_option_assignment()?);
                self.lexer.require(';')?;
            }
        } else {
            self.lexer.require(';')?;
        }

        Ok(RpcDecl {
            location,
            name,
            documentation,
            request_type,
            response_type,
            request_streaming,
            response_streaming,
            options,
        })
    }

    fn read_rpc_type(&mut self) -> Result<(bool, String), ParseError> {
        let word = self.lexer.read_word()?;
        if word == "stream" {
            Ok((true, self.lexer.read_data_type()?))
        } else {
            Ok((false, self.lexer.read_data_type_with(word)?))
        }
    }

    /// Read one `name = value` option assignment, without its terminator.
    fn read_option_assignment(&mut self) -> Result<OptionDecl, ParseError> {
        let (mut name, is_parenthesized) = self.lexer.read_name()?;
        let paren_len = if is_parenthesized { name.len() } else { 0 };
        while self.lexer.try_read('.')? {
            name.push('.');
            name.push_str(&self.lexer.read_word()?);
        }
        self.lexer.require('=')?;
        let value = self.read_option_value()?;
        Ok(OptionDecl {
            name,
            value,
            paren_len,
        })
    }

    fn read_option_value(&mut self) -> Result<OptionValue, ParseError> {
        match self.lexer.peek_char()? {
            '"' | '\'' => Ok(OptionValue::String(self.lexer.read_quoted_string()?)),
            '{' => {
                self.lexer.require('{')?;
                let mut entries = Vec::new();
                loop {
                    if self.lexer.try_read('}')? {
                        break;
                    }
                    let (key, _) = self.lexer.read_name()?;
                    self.lexer.try_read(':')?;
                    let value = self.read_option_value()?;
                    entries.push((key, value));
                    // Text-format aggregates allow ',' or ';' separators.
                    if !self.lexer.try_read(',')? {
                        self.lexer.try_read(';')?;
                    }
                }
                Ok(OptionValue::Map(entries))
            }
            '[' => {
                self.lexer.require('[')?;
                let mut values = Vec::new();
                loop {
                    if self.lexer.try_read(']')? {
                        break;
                    }
                    values.push(self.read_option_value()?);
                    self.lexer.try_read(',')?;
                }
                Ok(OptionValue::List(values))
            }
            _ => {
                let word = self.lexer.read_word()?;
                Ok(match word.as_str() {
                    "true" => OptionValue::Boolean(true),
                    "false" => OptionValue::Boolean(false),
                    _ if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                        OptionValue::Number(word)
                    }
                    _ => OptionValue::Identifier(word),
                })
            }
        }
    }
}

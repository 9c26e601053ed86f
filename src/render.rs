//! Canonical text rendering of AST nodes.
//!
//! The output is normalized: two-space indentation, one statement per line,
//! messages emitted before enums at every nesting level, string values
//! re-escaped. Reparsing rendered text yields a tree that compares equal to
//! the source tree.

use crate::ast::*;
use crate::wellknown::MAX_TAG_VALUE;

/// Append `documentation` as `// ` comment lines.
pub(crate) fn append_documentation(out: &mut String, documentation: &str) {
    if documentation.is_empty() {
        return;
    }
    for line in documentation.split('\n') {
        out.push_str("// ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Append `value` with every line indented by two spaces.
pub(crate) fn append_indented(out: &mut String, value: &str) {
    for line in value.split('\n') {
        if line.is_empty() {
            continue;
        }
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Escape a string for inclusion in double quotes.
pub(crate) fn add_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

fn option_declaration(option: &OptionDecl) -> String {
    format!("option {};\n", option.render_assignment())
}

/// Messages first, then enums, each in declaration order.
fn render_types(out: &mut String, types: &[TypeDecl], indented: bool) {
    let ordered = types
        .iter()
        .filter(|t| matches!(t, TypeDecl::Message(_)))
        .chain(types.iter().filter(|t| matches!(t, TypeDecl::Enum(_))));
    for decl in ordered {
        let rendered = match decl {
            TypeDecl::Message(m) => m.render(),
            TypeDecl::Enum(e) => e.render(),
        };
        if indented {
            append_indented(out, &rendered);
        } else {
            out.push_str(&rendered);
        }
    }
}

impl SchemaFile {
    /// Render the whole file in canonical form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(syntax) = self.syntax {
            out.push_str(&format!("syntax = \"{syntax}\";\n"));
        }
        if let Some(package_name) = &self.package_name {
            out.push_str(&format!("package {package_name};\n"));
        }
        if !self.imports.is_empty() || !self.public_imports.is_empty() {
            out.push('\n');
            for import in &self.imports {
                out.push_str(&format!("import \"{}\";\n", add_slashes(import)));
            }
            for import in &self.public_imports {
                out.push_str(&format!("import public \"{}\";\n", add_slashes(import)));
            }
        }
        if !self.options.is_empty() {
            out.push('\n');
            for option in &self.options {
                out.push_str(&option_declaration(option));
            }
        }
        if !self.types.is_empty() {
            out.push('\n');
            render_types(&mut out, &self.types, false);
        }
        for extend in &self.extends {
            out.push_str(&extend.render());
        }
        for service in &self.services {
            out.push_str(&service.render());
        }
        out
    }
}

impl MessageDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("message {} {{", self.name));
        if !self.reserveds.is_empty() {
            out.push('\n');
            for reserved in &self.reserveds {
                append_indented(&mut out, &reserved.render());
            }
        }
        if !self.options.is_empty() {
            out.push('\n');
            for option in &self.options {
                append_indented(&mut out, &option_declaration(option));
            }
        }
        for field in &self.fields {
            out.push('\n');
            append_indented(&mut out, &field.render());
        }
        for one_of in &self.one_ofs {
            out.push('\n');
            append_indented(&mut out, &one_of.render());
        }
        for group in &self.groups {
            out.push('\n');
            append_indented(&mut out, &group.render());
        }
        if !self.extensions.is_empty() {
            out.push('\n');
            for extensions in &self.extensions {
                append_indented(&mut out, &extensions.render());
            }
        }
        if !self.nested_types.is_empty() {
            out.push('\n');
            render_types(&mut out, &self.nested_types, true);
        }
        out.push_str("}\n");
        out
    }
}

impl FieldDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        if let Some(label) = self.label {
            out.push_str(label.as_str());
            out.push(' ');
        }
        out.push_str(&format!("{} {} = {}", self.element_type, self.name, self.tag));
        let mut bracketed = Vec::new();
        if let Some(default) = &self.default_value {
            bracketed.push(format!("default = {}", default.render()));
        }
        for option in &self.options {
            bracketed.push(option.render_assignment());
        }
        if !bracketed.is_empty() {
            out.push_str(&format!(" [{}]", bracketed.join(", ")));
        }
        out.push_str(";\n");
        out
    }
}

impl OneOfDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("oneof {} {{", self.name));
        if !self.options.is_empty() {
            out.push('\n');
            for option in &self.options {
                append_indented(&mut out, &option_declaration(option));
            }
        }
        for field in &self.fields {
            out.push('\n');
            append_indented(&mut out, &field.render());
        }
        out.push_str("}\n");
        out
    }
}

impl GroupDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        if let Some(label) = self.label {
            out.push_str(label.as_str());
            out.push(' ');
        }
        out.push_str(&format!("group {} = {} {{", self.name, self.tag));
        for field in &self.fields {
            out.push('\n');
            append_indented(&mut out, &field.render());
        }
        out.push_str("}\n");
        out
    }
}

impl ReservedDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        let values: Vec<String> = self
            .values
            .iter()
            .map(|value| match value {
                ReservedValue::Tag(tag) => tag.to_string(),
                ReservedValue::Range(start, end) if *end == MAX_TAG_VALUE => {
                    format!("{start} to max")
                }
                ReservedValue::Range(start, end) => format!("{start} to {end}"),
                ReservedValue::Name(name) => format!("\"{}\"", add_slashes(name)),
            })
            .collect();
        out.push_str(&format!("reserved {};\n", values.join(", ")));
        out
    }
}

impl ExtensionsDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        if self.start == self.end {
            out.push_str(&format!("extensions {};\n", self.start));
        } else if self.end == MAX_TAG_VALUE {
            out.push_str(&format!("extensions {} to max;\n", self.start));
        } else {
            out.push_str(&format!("extensions {} to {};\n", self.start, self.end));
        }
        out
    }
}

impl EnumDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("enum {} {{", self.name));
        if !self.reserveds.is_empty() {
            out.push('\n');
            for reserved in &self.reserveds {
                append_indented(&mut out, &reserved.render());
            }
        }
        if !self.options.is_empty() {
            out.push('\n');
            for option in &self.options {
                append_indented(&mut out, &option_declaration(option));
            }
        }
        for constant in &self.constants {
            out.push('\n');
            append_indented(&mut out, &constant.render());
        }
        out.push_str("}\n");
        out
    }
}

impl EnumConstant {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("{} = {}", self.name, self.value));
        if !self.options.is_empty() {
            let options: Vec<String> =
                self.options.iter().map(|o| o.render_assignment()).collect();
            out.push_str(&format!(" [{}]", options.join(", ")));
        }
        out.push_str(";\n");
        out
    }
}

impl ServiceDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("service {} {{", self.name));
        if !self.options.is_empty() {
            out.push('\n');
            for option in &self.options {
                append_indented(&mut out, &option_declaration(option));
            }
        }
        for rpc in &self.rpcs {
            out.push('\n');
            append_indented(&mut out, &rpc.render());
        }
        out.push_str("}\n");
        out
    }
}

impl RpcDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        let stream_in = if self.request_streaming { "stream " } else { "" };
        let stream_out = if self.response_streaming { "stream " } else { "" };
        out.push_str(&format!(
            "rpc {} ({stream_in}{}) returns ({stream_out}{})",
            self.name, self.request_type, self.response_type
        ));
        if self.options.is_empty() {
            out.push_str(";\n");
        } else {
            out.push_str(" {\n");
            for option in &self.options {
                append_indented(&mut out, &option_declaration(option));
            }
            out.push_str("}\n");
        }
        out
    }
}

impl ExtendDecl {
    pub fn render(&self) -> String {
        let mut out = String::new();
        append_documentation(&mut out, &self.documentation);
        out.push_str(&format!("extend {} {{", self.name));
        for field in &self.fields {
            out.push('\n');
            append_indented(&mut out, &field.render());
        }
        out.push_str("}\n");
        out
    }
}

impl OptionDecl {
    /// The `name = value` form, without `option` keyword or terminator.
    pub fn render_assignment(&self) -> String {
        if self.is_parenthesized() {
            // Re-emit the parenthesized extension name with its source
            // boundary; the suffix, if any, starts with a dot.
            let (extension, member) = self.name.split_at(self.paren_len);
            format!("({extension}){member} = {}", self.value.render())
        } else {
            format!("{} = {}", self.name, self.value.render())
        }
    }
}

impl OptionValue {
    pub fn render(&self) -> String {
        match self {
            OptionValue::String(s) => format!("\"{}\"", add_slashes(s)),
            OptionValue::Identifier(i) => i.clone(),
            OptionValue::Number(n) => n.clone(),
            OptionValue::Boolean(b) => b.to_string(),
            OptionValue::Map(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", value.render()))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
            OptionValue::List(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.render()).collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_add_slashes() {
        assert_eq!(add_slashes("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(add_slashes("plain"), "plain");
    }

    #[test]
    fn test_field_with_default_and_options() {
        let file = parse(
            "",
            "message M { optional string s = 1 [default = \"x\\n\", deprecated = true]; }",
        )
        .unwrap();
        let rendered = match &file.types[0] {
            TypeDecl::Message(m) => m.fields[0].render(),
            _ => panic!("expected message"),
        };
        assert_eq!(
            rendered,
            "optional string s = 1 [default = \"x\\n\", deprecated = true];\n"
        );
    }

    #[test]
    fn test_message_section_order() {
        let file = parse(
            "",
            r#"
            syntax = "proto3";
            message M {
              // enum first in source
              enum Kind { UNKNOWN = 0; }
              message Inner { string s = 1; }
              string name = 1;
              reserved 5;
              option deprecated = true;
            }
            "#,
        )
        .unwrap();
        let rendered = match &file.types[0] {
            TypeDecl::Message(m) => m.render(),
            _ => panic!("expected message"),
        };
        let reserved_at = rendered.find("reserved 5;").unwrap();
        let option_at = rendered.find("option deprecated").unwrap();
        let field_at = rendered.find("string name").unwrap();
        let inner_at = rendered.find("message Inner").unwrap();
        let enum_at = rendered.find("enum Kind").unwrap();
        assert!(reserved_at < option_at);
        assert!(option_at < field_at);
        assert!(field_at < inner_at);
        // Nested messages render before nested enums.
        assert!(inner_at < enum_at);
    }

    #[test]
    fn test_reserved_and_extensions_forms() {
        let file = parse(
            "",
            "message M { reserved 3, 10 to 20, \"old\"; extensions 100 to max; }",
        )
        .unwrap();
        let rendered = match &file.types[0] {
            TypeDecl::Message(m) => m.render(),
            _ => panic!("expected message"),
        };
        assert!(rendered.contains("reserved 3, 10 to 20, \"old\";"));
        assert!(rendered.contains("extensions 100 to max;"));
    }

    #[test]
    fn test_custom_option_name_keeps_paren_boundary() {
        let option = OptionDecl {
            name: "my.custom.detail".into(),
            value: OptionValue::Boolean(true),
            paren_len: "my.custom".len(),
        };
        assert_eq!(option.render_assignment(), "(my.custom).detail = true");

        let whole = OptionDecl {
            name: "my.custom".into(),
            value: OptionValue::Boolean(true),
            paren_len: "my.custom".len(),
        };
        assert_eq!(whole.render_assignment(), "(my.custom) = true");
    }

    #[test]
    fn test_rpc_rendering() {
        let file = parse(
            "",
            "syntax = \"proto3\"; message E {} service S { rpc Go (E) returns (stream E); }",
        )
        .unwrap();
        let rendered = file.services[0].render();
        assert!(rendered.contains("rpc Go (E) returns (stream E);"));
    }
}

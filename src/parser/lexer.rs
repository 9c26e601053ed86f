use crate::error::LexError;
use crate::location::Location;

/// Grammar-aware tokenizer for protobuf schema text.
///
/// The cursor only ever moves forward; once a primitive returns, the
/// consumed text is never revisited. Newline consumption updates a line
/// counter and a line-start offset so `location()` is O(1).
pub struct Lexer<'a> {
    data: &'a str,
    origin: Location,
    pos: usize,
    /// Number of newline characters consumed so far.
    line: usize,
    /// Byte offset just past the most recent newline.
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a str, origin: Location) -> Self {
        Lexer {
            data,
            origin,
            pos: 0,
            line: 0,
            line_start: 0,
        }
    }

    /// The current cursor position as a 1-based line/column location.
    pub fn location(&self) -> Location {
        self.origin
            .at(self.line as i32 + 1, (self.pos - self.line_start) as i32 + 1)
    }

    /// True once every byte has been consumed.
    pub fn exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.as_bytes().get(self.pos).copied()
    }

    /// Advance one byte, tracking newlines. Only safe on ASCII positions,
    /// which is all the callers ever stand on.
    fn bump(&mut self) {
        if let Some(b) = self.peek_byte() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.line_start = self.pos;
            }
        }
    }

    /// Consume and return the next character with no whitespace skipping,
    /// tracking newlines. Used inside string and comment bodies.
    fn next_char(&mut self) -> Option<char> {
        let c = self.data[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// Skip whitespace, and comments too when `skip_comments` is set.
    fn skip_whitespace(&mut self, skip_comments: bool) -> Result<(), LexError> {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.bump(),
                Some(b'/') if skip_comments => {
                    self.read_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Peek the next non-whitespace, non-comment character.
    pub fn peek_char(&mut self) -> Result<char, LexError> {
        self.skip_whitespace(true)?;
        self.data[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| LexError::UnexpectedEof {
                location: self.location(),
            })
    }

    /// Read the next non-whitespace character.
    pub fn read_char(&mut self) -> Result<char, LexError> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    /// Require the next non-whitespace character to be `c`.
    pub fn require(&mut self, c: char) -> Result<(), LexError> {
        let found = self.peek_char()?;
        if found == c {
            self.pos += found.len_utf8();
            Ok(())
        } else {
            Err(LexError::Expected {
                location: self.location(),
                expected: format!("'{c}'"),
            })
        }
    }

    /// Consume `c` if it is the next non-whitespace character. End of
    /// input reads as "not present".
    pub fn try_read(&mut self, c: char) -> Result<bool, LexError> {
        match self.peek_char() {
            Ok(found) if found == c => {
                self.pos += found.len_utf8();
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(LexError::UnexpectedEof { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a non-empty run of word characters `[A-Za-z0-9_.-]`.
    pub fn read_word(&mut self) -> Result<String, LexError> {
        self.skip_whitespace(true)?;
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(LexError::Expected {
                location: self.location(),
                expected: "a word".into(),
            });
        }
        Ok(self.data[start..self.pos].to_string())
    }

    /// Read an integer, decimal or `0x` hex, optionally negative.
    pub fn read_int(&mut self) -> Result<i64, LexError> {
        self.skip_whitespace(true)?;
        let location = self.location();
        let word = self.read_word()?;
        parse_int(&word).ok_or_else(|| LexError::Expected {
            location,
            expected: format!("an integer but was {word}"),
        })
    }

    /// Read a quoted string or, failing a quote, a bare word.
    pub fn read_string(&mut self) -> Result<String, LexError> {
        match self.peek_char()? {
            '"' | '\'' => self.read_quoted_string(),
            _ => self.read_word(),
        }
    }

    /// Read a quoted string, unescaping its contents. Adjacent string
    /// literals are concatenated.
    pub fn read_quoted_string(&mut self) -> Result<String, LexError> {
        self.skip_whitespace(true)?;
        let start_location = self.location();
        let mut start_quote = match self.peek_byte() {
            Some(b'"') => '"',
            Some(b'\'') => '\'',
            _ => {
                return Err(LexError::Expected {
                    location: self.location(),
                    expected: "a quoted string".into(),
                })
            }
        };
        self.pos += 1;
        let mut result = String::new();
        loop {
            let Some(c) = self.next_char() else {
                return Err(LexError::UnterminatedString {
                    location: start_location,
                });
            };
            if c == start_quote {
                // Adjacent strings concatenate: consume the next quote
                // and keep reading.
                match self.peek_char() {
                    Ok(q @ ('"' | '\'')) => {
                        start_quote = q;
                        self.pos += 1;
                        continue;
                    }
                    _ => return Ok(result),
                }
            }
            if c == '\\' {
                let Some(e) = self.next_char() else {
                    return Err(LexError::UnexpectedEof {
                        location: self.location(),
                    });
                };
                let unescaped = match e {
                    'a' => '\u{0007}',
                    'b' => '\u{0008}',
                    'f' => '\u{000C}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\u{000B}',
                    'x' | 'X' => self.read_numeric_escape(16, 2)?,
                    '0'..='7' => {
                        // The digit itself belongs to the escape.
                        self.pos -= 1;
                        self.read_numeric_escape(8, 3)?
                    }
                    '\\' | '\'' | '"' | '/' | '?' => e,
                    other => {
                        return Err(LexError::InvalidEscape {
                            location: self.location(),
                            message: format!("unknown escape '\\{other}'"),
                        })
                    }
                };
                result.push(unescaped);
                continue;
            }
            result.push(c);
        }
    }

    fn read_numeric_escape(&mut self, radix: u32, length: usize) -> Result<char, LexError> {
        let location = self.location();
        let mut value: Option<u32> = None;
        let end = usize::min(self.pos + length, self.data.len());
        while self.pos < end {
            let Some(digit) = (self.data.as_bytes()[self.pos] as char).to_digit(radix) else {
                break;
            };
            value = Some(value.unwrap_or(0) * radix + digit);
            self.pos += 1;
        }
        let value = value.ok_or_else(|| LexError::InvalidEscape {
            location: location.clone(),
            message: "expected a digit after \\x or \\X".into(),
        })?;
        char::from_u32(value).ok_or_else(|| LexError::InvalidEscape {
            location,
            message: format!("invalid character code {value}"),
        })
    }

    /// Read a paren-wrapped, square-wrapped or naked symbol name. Returns
    /// the name and whether it was parenthesized (custom option form).
    pub fn read_name(&mut self) -> Result<(String, bool), LexError> {
        match self.peek_char()? {
            '(' => {
                self.pos += 1;
                let name = self.read_word()?;
                self.require(')')?;
                Ok((name, true))
            }
            '[' => {
                self.pos += 1;
                let name = self.read_word()?;
                self.require(']')?;
                Ok((name, false))
            }
            _ => Ok((self.read_word()?, false)),
        }
    }

    /// Read a scalar, map, or type name with `name` as its leading word.
    pub fn read_data_type_with(&mut self, name: String) -> Result<String, LexError> {
        if name == "map" {
            self.require('<')?;
            let key_type = self.read_data_type()?;
            self.require(',')?;
            let value_type = self.read_data_type()?;
            self.require('>')?;
            Ok(format!("map<{key_type}, {value_type}>"))
        } else {
            Ok(name)
        }
    }

    /// Read a scalar, map, or type name.
    pub fn read_data_type(&mut self) -> Result<String, LexError> {
        let name = self.read_word()?;
        self.read_data_type_with(name)
    }

    /// Like whitespace skipping, but collects comment text. By convention
    /// comments before a declaration document that declaration.
    pub fn read_documentation(&mut self) -> Result<String, LexError> {
        let mut result = String::new();
        loop {
            self.skip_whitespace(false)?;
            if self.peek_byte() != Some(b'/') {
                return Ok(result);
            }
            let comment = self.read_comment()?;
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&comment);
        }
    }

    /// Read one `//` line comment or `/* */` block comment and return its
    /// body.
    fn read_comment(&mut self) -> Result<String, LexError> {
        let start_location = self.location();
        // Caller guarantees the cursor is on '/'.
        self.pos += 1;
        match self.peek_byte() {
            Some(b'/') => {
                self.pos += 1;
                // Skip a single leading space, if present.
                if self.peek_byte() == Some(b' ') {
                    self.pos += 1;
                }
                let start = self.pos;
                loop {
                    match self.peek_byte() {
                        None => return Ok(self.data[start..].to_string()),
                        Some(b'\n') => {
                            let end = self.pos;
                            self.bump();
                            return Ok(self.data[start..end].to_string());
                        }
                        Some(_) => self.pos += 1,
                    }
                }
            }
            Some(b'*') => {
                self.pos += 1;
                let start = self.pos;
                while self.pos + 1 < self.data.len() {
                    if self.data.as_bytes()[self.pos] == b'*'
                        && self.data.as_bytes()[self.pos + 1] == b'/'
                    {
                        let raw = &self.data[start..self.pos];
                        self.pos += 2;
                        return Ok(normalize_block_comment(raw));
                    }
                    if self.data.as_bytes()[self.pos] == b'\n' {
                        self.bump();
                    } else {
                        self.pos += 1;
                    }
                }
                Err(LexError::UnterminatedComment {
                    location: start_location,
                })
            }
            _ => Err(LexError::Expected {
                location: start_location,
                expected: "'//' or '/*'".into(),
            }),
        }
    }

    /// If a comment follows on the same line (after spaces/tabs only),
    /// append its body to `documentation`.
    pub fn try_append_trailing_documentation(
        &mut self,
        documentation: &mut String,
    ) -> Result<(), LexError> {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t') => self.pos += 1,
                Some(b'/') => break,
                _ => return Ok(()),
            }
        }
        let comment = self.read_comment()?;
        if comment.is_empty() {
            return Ok(());
        }
        if documentation.trim().is_empty() {
            *documentation = comment;
        } else {
            documentation.push('\n');
            documentation.push_str(&comment);
        }
        Ok(())
    }
}

fn parse_int(word: &str) -> Option<i64> {
    let (negative, rest) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Strip the decorative left margin of a block comment: per line, leading
/// whitespace, one `*`, and one space after it.
fn normalize_block_comment(raw: &str) -> String {
    let mut lines = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = if i == 0 { line.trim() } else { line.trim_start() };
        let line = line.strip_prefix('*').unwrap_or(line);
        let line = line.strip_prefix(' ').unwrap_or(line);
        lines.push(line.trim_end());
    }
    lines.join("\n").trim().to_string()
}

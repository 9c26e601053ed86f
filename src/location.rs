use std::fmt;

/// A position within schema source text, attached to AST nodes for
/// diagnostics.
///
/// `line` and `column` are 1-based; `-1` means "no specific position".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Identifier of the source this position belongs to, typically the
    /// import path or registry subject. May be empty.
    pub origin: String,
    pub line: i32,
    pub column: i32,
}

impl Location {
    /// A location naming only its source, with no line/column.
    pub fn origin(origin: impl Into<String>) -> Self {
        Location {
            origin: origin.into(),
            line: -1,
            column: -1,
        }
    }

    /// A copy of this location pinned to a line and column.
    pub fn at(&self, line: i32, column: i32) -> Self {
        Location {
            origin: self.origin.clone(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.origin.is_empty() {
            f.write_str(&self.origin)?;
        }
        if self.line != -1 {
            if !self.origin.is_empty() {
                f.write_str(":")?;
            }
            write!(f, "{}", self.line)?;
            if self.column != -1 {
                write!(f, ":{}", self.column)?;
            }
        } else if self.origin.is_empty() {
            f.write_str("<input>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_full() {
        let loc = Location::origin("order.proto").at(3, 14);
        assert_eq!(loc.to_string(), "order.proto:3:14");
    }

    #[test]
    fn test_display_origin_only() {
        let loc = Location::origin("order.proto");
        assert_eq!(loc.to_string(), "order.proto");
    }

    #[test]
    fn test_display_anonymous() {
        let loc = Location::origin("").at(7, 1);
        assert_eq!(loc.to_string(), "7:1");
        assert_eq!(Location::origin("").to_string(), "<input>");
    }
}

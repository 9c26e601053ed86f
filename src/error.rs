use crate::location::Location;

/// Errors from the schema text lexer. Always fatal to the parse.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unexpected end of input at {location}")]
    UnexpectedEof { location: Location },

    #[error("unterminated string at {location}")]
    UnterminatedString { location: Location },

    #[error("unterminated comment at {location}")]
    UnterminatedComment { location: Location },

    #[error("invalid escape at {location}: {message}")]
    InvalidEscape { location: Location, message: String },

    #[error("expected {expected} at {location}")]
    Expected { location: Location, expected: String },
}

/// Errors from the recursive-descent parser. Fatal: no partial tree is
/// ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("syntax error at {location}: {message}")]
    Syntax { location: Location, message: String },

    #[error("duplicate declaration of '{name}' at {location}, first declared at {previous}")]
    DuplicateName {
        name: String,
        location: Location,
        previous: Location,
    },

    #[error("duplicate tag {tag} in '{scope}' at {location}")]
    DuplicateTag {
        scope: String,
        tag: i32,
        location: Location,
    },

    #[error("tag {tag} is out of range [1, 536870911] at {location}")]
    TagOutOfRange { tag: i64, location: Location },

    #[error("tag {tag} is in the reserved range [19000, 19999] at {location}")]
    TagInReservedRange { tag: i32, location: Location },

    #[error("tag {tag} reuses a reserved tag of '{scope}' at {location}")]
    ReservedTagReused {
        scope: String,
        tag: i32,
        location: Location,
    },

    #[error("name '{name}' reuses a reserved name of '{scope}' at {location}")]
    ReservedNameReused {
        scope: String,
        name: String,
        location: Location,
    },
}

/// Errors from `ParsedSchema` construction.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("could not resolve reference '{name}' (subject '{subject}', version {version})")]
    UnresolvedReference {
        name: String,
        subject: String,
        version: i32,
    },
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

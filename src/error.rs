#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The lexer or parser could not consume the input.
    #[error("parse the filter: {0}")]
    Parse(String),

    #[error("unsupported character {ch:?} at position {pos}")]
    UnsupportedCharacter { ch: char, pos: usize },

    /// The resource does not define the key.
    #[error("unknown key {key:?}")]
    UnknownKey { key: String },

    /// The resource does not define the attribute key under this key.
    #[error("unknown attribute key {key:?}")]
    UnknownAttributeKey { key: String },

    /// The operand cannot be compared against the record attribute, e.g. a
    /// non-RFC-3339 literal against a timestamp.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// Expression-level parentheses do not pair up.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// A user-supplied `~` pattern failed to compile.
    #[error("compile regex {pattern:?}: {source}")]
    RegexCompile {
        pattern: String,
        source: regex::Error,
    },

    /// Resource-specific validation failure.
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

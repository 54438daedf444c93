//! Value parse failures.

pub type ParseResult<T> = Result<T, ParseError>;

/// A raw value that does not read as its type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} in {input:?}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The text that was rejected.
    pub input: String,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid date-time")]
    InvalidDateTime,
    #[error("invalid duration")]
    InvalidDuration,
    #[error("invalid integer")]
    InvalidInteger,
    /// The VALUE parameter names a type that is not read here.
    #[error("unsupported value type")]
    UnsupportedValueType,
}

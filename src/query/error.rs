use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("found {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("unexpected end of statement, expected {0}")]
    UnexpectedEnd(String),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated quoted identifier")]
    UnterminatedIdentifier,

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("{0} specified more than once")]
    DuplicateClause(&'static str),
}

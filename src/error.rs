//! CFI error types

use thiserror::Error;

/// Errors raised while parsing or resolving a CFI
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CfiError {
    /// The input does not have the `epubcfi(...)` wrapper shape
    #[error("Not a valid CFI: {0}")]
    Grammar(String),

    /// A step is missing its node index or the scanner could not advance
    #[error("CFI parse error: {0}")]
    Parse(String),

    /// The CFI could not be resolved against the supplied document
    #[error("CFI resolution failed: {0}")]
    Resolution(String),
}

/// Result type alias for CFI operations
pub type Result<T> = std::result::Result<T, CfiError>;

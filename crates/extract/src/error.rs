//! Extraction Error Types

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The artifact does not exist.
    #[display("artifact not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The artifact is not a well-formed Debian binary package.
    #[display("malformed package: {_0}")]
    Malformed(#[error(not(source))] String),
    /// A required control field is absent.
    #[display("missing required control field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// Reading the artifact failed part way through.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A package is either well-formed or it's not.
        matches!(self, ErrorKind::Io)
    }
}

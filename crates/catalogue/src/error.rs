//! Catalogue error types.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("not found in catalogue: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A stored value could not be converted to or from its model.
    #[display("invalid catalogue data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// The catalogue violates one of its own invariants. Never auto-repaired.
    #[display("catalogue inconsistency: {_0}")]
    Consistency(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}

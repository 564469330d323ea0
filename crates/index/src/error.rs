//! Index generation error types.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("I/O error on {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Reading the package list failed.
    #[display("catalogue error")]
    Catalogue,
    #[display("compression error")]
    Compression,
    #[display("signing executable not found: {_0}")]
    SignerNotFound(#[error(not(source))] String),
    #[display("signing failed: {_0}")]
    Signing(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

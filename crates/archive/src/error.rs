//! Archive Error Types
//!
//! Errors from the crates the engine drives are raised into one of these
//! kinds, so callers can decide per artifact whether to carry on.

use debstash_catalogue::error::{ErrorKind as CatalogueErrorKind, Result as CatalogueResult};
use debstash_storage::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
use derive_more::{Display, Error};
use exn::ResultExt;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// ### Per-artifact errors
/// - [`ErrorKind::Configuration`]
/// - [`ErrorKind::Policy`]
/// - [`ErrorKind::Extraction`]
/// - [`ErrorKind::NotFound`]
///
/// ### Fatal errors
/// - [`ErrorKind::Consistency`] is never repaired automatically.
/// - [`ErrorKind::Store`], [`ErrorKind::Catalogue`]
///
/// ### Publishing errors
/// - [`ErrorKind::Index`], [`ErrorKind::Signing`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Unknown release or component, or an unusable configuration.
    #[display("configuration error: {_0}")]
    Configuration(#[error(not(source))] String),
    /// The request is understood but refused.
    #[display("refused: {_0}")]
    Policy(#[error(not(source))] String),
    /// Catalogue and store disagree, or the catalogue breaks its own rules.
    #[display("inconsistent repository: {_0}")]
    Consistency(#[error(not(source))] String),
    #[display("content store error")]
    Store,
    #[display("could not read package metadata")]
    Extraction,
    #[display("signing failed")]
    Signing,
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("catalogue error")]
    Catalogue,
    #[display("index generation failed")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Whether a batch must stop rather than skip to the next artifact.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Consistency(_) | Self::Store | Self::Catalogue)
    }
}

/// Raise a store error, keeping structural violations distinguishable.
pub(crate) fn store<T>(result: StoreResult<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => match &*e {
            StoreErrorKind::Inconsistent(reason) => {
                let reason = reason.clone();
                Err(e).or_raise(|| ErrorKind::Consistency(reason))
            },
            _ => Err(e).or_raise(|| ErrorKind::Store),
        },
    }
}

/// Raise a catalogue error, keeping broken invariants distinguishable.
pub(crate) fn catalogue<T>(result: CatalogueResult<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => match &*e {
            CatalogueErrorKind::Consistency(reason) => {
                let reason = reason.clone();
                Err(e).or_raise(|| ErrorKind::Consistency(reason))
            },
            CatalogueErrorKind::NotFound(what) => {
                let what = what.clone();
                Err(e).or_raise(|| ErrorKind::NotFound(what))
            },
            _ => Err(e).or_raise(|| ErrorKind::Catalogue),
        },
    }
}

//! Content store trait and its two layouts.
//!
//! A store owns the physical bytes of every package. It is always mutated
//! *before* the catalogue commits the matching change, so every operation
//! must be safe to retry after a crash.

mod pool;
mod tree;

pub use self::pool::PoolStore;
pub use self::tree::TreeStore;
use crate::error::Result;
use crate::models::{PackageFile, Slot, StoredRef};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Layout name, for logging.
    fn name(&self) -> &str;

    /// Path, relative to the repository root, at which the store places
    /// new content for `slot`.
    fn path_for(&self, package: &PackageFile, slot: &Slot) -> PathBuf;

    /// Copy new content (not yet referenced anywhere) into the repository.
    /// Returns the relative path of the stored file.
    async fn place_new(&self, source: &Path, package: &PackageFile, slot: &Slot) -> Result<PathBuf>;

    /// Make already-stored content available in `slot` as well. `existing`
    /// lists every live reference to the content and must not be empty.
    /// Returns the relative path of the new reference.
    async fn add_reference(&self, package: &PackageFile, slot: &Slot, existing: &[StoredRef]) -> Result<PathBuf>;

    /// Drop `removed` while `remaining` (non-empty) still reference the content.
    async fn remove_reference(&self, removed: &StoredRef, remaining: &[StoredRef]) -> Result<()>;

    /// Drop the only reference to some content, deleting (or burying) the bytes.
    async fn remove_last_reference(&self, removed: &StoredRef) -> Result<()>;
}

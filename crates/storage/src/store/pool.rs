//! Debian-style package pool.
//!
//! Files live under `pool/<component>/<prefix>/<source>/`, independent of the
//! release, so identical content in several releases is one file.

use crate::error::Result;
use crate::fs::RepoFs;
use crate::models::{PackageFile, Slot, StoredRef};
use crate::store::ContentStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct PoolStore {
    fs: RepoFs,
}

impl PoolStore {
    pub fn new(fs: RepoFs) -> Self {
        Self { fs }
    }

    /// `h` for `hello`, `libf` for `libfoo`.
    pub fn prefix(source: &str) -> &str {
        let len = if source.starts_with("lib") { 4 } else { 1 };
        match source.char_indices().nth(len) {
            Some((end, _)) => &source[..end],
            None => source,
        }
    }
}

#[async_trait]
impl ContentStore for PoolStore {
    fn name(&self) -> &str {
        "pool"
    }

    fn path_for(&self, package: &PackageFile, slot: &Slot) -> PathBuf {
        PathBuf::from("pool")
            .join(&slot.component)
            .join(Self::prefix(&package.source))
            .join(&package.source)
            .join(package.file_name())
    }

    #[instrument(skip(self, package), fields(package = %package.file_name(), release = %slot.release))]
    async fn place_new(&self, source: &Path, package: &PackageFile, slot: &Slot) -> Result<PathBuf> {
        let path = self.path_for(package, slot);
        self.fs.copy_in(source, &path).await?;
        tracing::info!(path = %path.display(), "stored new package");
        Ok(path)
    }

    async fn add_reference(&self, package: &PackageFile, slot: &Slot, existing: &[StoredRef]) -> Result<PathBuf> {
        // Pure metadata: the new reference shares the existing file.
        Ok(existing
            .first()
            .map(|r| r.path.clone())
            .unwrap_or_else(|| self.path_for(package, slot)))
    }

    async fn remove_reference(&self, removed: &StoredRef, remaining: &[StoredRef]) -> Result<()> {
        if remaining.iter().any(|r| r.path == removed.path) {
            tracing::debug!(path = %removed.path.display(), "file still shared, nothing to remove");
            return Ok(());
        }
        self.fs.remove(&removed.path).await
    }

    #[instrument(skip(self), fields(path = %removed.path.display()))]
    async fn remove_last_reference(&self, removed: &StoredRef) -> Result<()> {
        self.fs.discard(&removed.path).await
    }
}

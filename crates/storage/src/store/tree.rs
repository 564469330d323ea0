//! Per-release tree with symlinks.
//!
//! Files live under `dists/<release>/<component>/`. Each distinct content has
//! exactly one real file, the *primary*, held by the live reference whose
//! release has the smallest ordinal; every other reference is a relative
//! symlink to it. Every mutation restores that invariant before returning.

use crate::error::{ErrorKind, Result};
use crate::fs::RepoFs;
use crate::models::{PackageFile, Slot, StoredRef};
use crate::store::ContentStore;
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct TreeStore {
    fs: RepoFs,
}

/// A reference plus what is actually on disk at its path.
#[derive(Debug, Clone)]
struct Located {
    reference: StoredRef,
    is_link: bool,
}

impl TreeStore {
    pub fn new(fs: RepoFs) -> Self {
        Self { fs }
    }

    /// Check the on-disk state of a reference set and return it sorted by
    /// release ordinal.
    async fn locate(&self, refs: &[StoredRef]) -> Result<Vec<Located>> {
        if refs.is_empty() {
            exn::bail!(ErrorKind::Inconsistent("no references supplied".into()));
        }
        let mut located = Vec::with_capacity(refs.len());
        for reference in refs {
            let is_link = self.fs.is_symlink(&reference.path).await.or_raise(|| {
                ErrorKind::Inconsistent(format!("reference {} has no file", reference.path.display()))
            })?;
            located.push(Located { reference: reference.clone(), is_link });
        }
        located.sort_by_key(|l| l.reference.slot.ordinal);
        if let Some(pair) = located.windows(2).find(|w| w[0].reference.slot.release == w[1].reference.slot.release) {
            exn::bail!(ErrorKind::Inconsistent(format!(
                "two references in release {}",
                pair[0].reference.slot.release
            )));
        }
        match located.iter().filter(|l| !l.is_link).count() {
            1 => Ok(located),
            0 => exn::bail!(ErrorKind::Inconsistent(format!(
                "all references of {} are symlinks",
                refs[0].path.display()
            ))),
            n => exn::bail!(ErrorKind::Inconsistent(format!(
                "{n} real files for content at {}",
                refs[0].path.display()
            ))),
        }
    }

    /// Move the real bytes to `located[to]` and point every other entry at it.
    async fn move_primary(&self, located: &mut [Located], to: usize) -> Result<()> {
        let Some(from) = located.iter().position(|l| !l.is_link) else {
            exn::bail!(ErrorKind::Inconsistent("no primary to move".into()));
        };
        let target = located[to].reference.path.clone();
        if from != to {
            let source = located[from].reference.path.clone();
            tracing::warn!(from = %source.display(), to = %target.display(), "moving primary file");
            self.fs.rename(&source, &target).await?;
            located[from].is_link = true;
            located[to].is_link = false;
        }
        for link in located.iter().filter(|l| l.is_link) {
            self.fs.symlink(&target, &link.reference.path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for TreeStore {
    fn name(&self) -> &str {
        "tree"
    }

    fn path_for(&self, package: &PackageFile, slot: &Slot) -> PathBuf {
        PathBuf::from("dists")
            .join(&slot.release)
            .join(&slot.component)
            .join(package.file_name())
    }

    #[instrument(skip(self, package), fields(package = %package.file_name(), release = %slot.release))]
    async fn place_new(&self, source: &Path, package: &PackageFile, slot: &Slot) -> Result<PathBuf> {
        let path = self.path_for(package, slot);
        self.fs.copy_in(source, &path).await?;
        tracing::info!(path = %path.display(), "stored new package");
        Ok(path)
    }

    #[instrument(skip(self, package, existing), fields(package = %package.file_name(), release = %slot.release))]
    async fn add_reference(&self, package: &PackageFile, slot: &Slot, existing: &[StoredRef]) -> Result<PathBuf> {
        let mut located = self.locate(existing).await?;
        if located.iter().any(|l| l.reference.slot.release == slot.release) {
            exn::bail!(ErrorKind::Inconsistent(format!(
                "{} already present in release {}",
                package.file_name(),
                slot.release
            )));
        }
        let path = self.path_for(package, slot);
        let position = located.partition_point(|l| l.reference.slot.ordinal < slot.ordinal);
        let new = Located {
            reference: StoredRef { slot: slot.clone(), path: path.clone() },
            is_link: true,
        };
        if position > 0 && !located[0].is_link {
            // Primary is already where it belongs.
            self.fs.symlink(&located[0].reference.path, &path).await?;
            return Ok(path);
        }
        located.insert(position, new);
        self.move_primary(&mut located, 0).await?;
        Ok(path)
    }

    #[instrument(skip(self, remaining), fields(path = %removed.path.display()))]
    async fn remove_reference(&self, removed: &StoredRef, remaining: &[StoredRef]) -> Result<()> {
        if remaining.is_empty() {
            exn::bail!(ErrorKind::Inconsistent("no remaining references supplied".into()));
        }
        let mut all = remaining.to_vec();
        all.push(removed.clone());
        let mut located = self.locate(&all).await?;
        let index = located
            .iter()
            .position(|l| l.reference == *removed)
            .ok_or_raise(|| ErrorKind::Inconsistent("removed reference vanished".into()))?;
        let gone = located.remove(index);
        if gone.is_link {
            // Make sure the survivors still honour the invariant.
            self.move_primary(&mut located, 0).await?;
            self.fs.remove(&gone.reference.path).await?;
        } else {
            // The bytes move onto the next reference in release order.
            let target = located[0].reference.path.clone();
            self.fs.rename(&gone.reference.path, &target).await?;
            located[0].is_link = false;
            for link in located.iter().filter(|l| l.is_link) {
                self.fs.symlink(&target, &link.reference.path).await?;
            }
            self.fs.remove_empty_parents(&gone.reference.path).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(path = %removed.path.display()))]
    async fn remove_last_reference(&self, removed: &StoredRef) -> Result<()> {
        if self.fs.exists(&removed.path).await? && self.fs.is_symlink(&removed.path).await? {
            exn::bail!(ErrorKind::Inconsistent(format!(
                "last reference {} is a symlink",
                removed.path.display()
            )));
        }
        self.fs.discard(&removed.path).await
    }
}

//! The ingestion engine.
//!
//! [`Archive`] owns the catalogue, the content store and the extractor, and
//! is the only thing allowed to mutate either of the first two. Every ingest
//! or removal mutates the store *before* committing the matching catalogue
//! change, so a crash part way through leaves an orphaned file rather than a
//! reference to nothing.
//!
//! The primary entry points are [`Archive::ingest`], [`Archive::ingest_all`],
//! [`Archive::remove`] and [`Archive::publish`]. Ingest decisions are
//! described by [`Disposition`].

pub mod error;
mod ingest;
mod outcome;
mod remove;
#[cfg(test)]
mod testing;

pub use crate::ingest::BatchReport;
pub use crate::outcome::{Disposition, Outcome, Removed};
use crate::error::{ErrorKind, Result};
use debstash_catalogue::{Catalogue, Database, Reference};
use debstash_config::{Config, Release, StoreKind};
use debstash_extract::ExtractorHandle;
use debstash_index::error::ErrorKind as IndexErrorKind;
use debstash_index::{DirtySlots, Published, Publisher, SignerHandle, SlotKey};
use debstash_storage::{PoolStore, RepoFs, Slot, StoreHandle, StoredRef, TreeStore};
use exn::ResultExt;
use std::sync::Arc;

pub struct Archive {
    config: Config,
    catalogue: Catalogue,
    store: StoreHandle,
    extractor: ExtractorHandle,
}

impl Archive {
    /// Open the repository described by `config`, creating its root and
    /// catalogue on first use.
    pub async fn open(config: Config, extractor: ExtractorHandle) -> Result<Self> {
        let database = Database::connect(&config.database).await.or_raise(|| ErrorKind::Catalogue)?;
        let store = build_store(&config)?;
        Self::new(config, Catalogue::from(&database), store, extractor).await
    }

    /// Assemble an archive from parts. Registers every configured release
    /// with the catalogue.
    pub async fn new(
        config: Config,
        catalogue: Catalogue,
        store: StoreHandle,
        extractor: ExtractorHandle,
    ) -> Result<Self> {
        catalogue
            .sync_releases(&config.release_names())
            .await
            .or_raise(|| ErrorKind::Catalogue)?;
        tracing::debug!(store = store.name(), releases = config.releases.len(), "archive opened");
        Ok(Self { config, catalogue, store, extractor })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Slots changed since their release was last published, by this or
    /// any earlier process.
    pub async fn dirty(&self) -> Result<DirtySlots> {
        let mut dirty = DirtySlots::new();
        for slot in self.catalogue.dirty_slots().await.or_raise(|| ErrorKind::Catalogue)? {
            dirty.mark(&slot.release, &slot.component, &slot.architecture);
        }
        Ok(dirty)
    }

    /// Recorded before the mutation it stands for, so a crash can only
    /// cause a needless rebuild.
    async fn mark_dirty(&self, release: &str, slots: &[SlotKey]) -> Result<()> {
        for slot in slots {
            self.catalogue
                .mark_dirty(release, &slot.component, &slot.architecture)
                .await
                .or_raise(|| ErrorKind::Catalogue)?;
        }
        Ok(())
    }

    /// Regenerate index files and manifests of every changed release (all
    /// releases when `force`). Without a signer, manifests stay unsigned.
    pub async fn publish(&mut self, force: bool, signer: Option<SignerHandle>) -> Result<Vec<Published>> {
        let mut publisher =
            Publisher::new(&self.config.root, self.catalogue.clone(), self.config.compressions.clone());
        if let Some(signer) = signer {
            publisher = publisher.with_signer(signer);
        }
        let dirty = self.dirty().await?;
        let published = match publisher.publish(&self.config.releases, &dirty, force).await {
            Ok(published) => published,
            Err(e) => {
                let kind = match &*e {
                    IndexErrorKind::Signing(_) | IndexErrorKind::SignerNotFound(_) => ErrorKind::Signing,
                    _ => ErrorKind::Index,
                };
                return Err(e).or_raise(|| kind);
            },
        };
        for release in &published {
            self.catalogue
                .clear_dirty(&release.release)
                .await
                .or_raise(|| ErrorKind::Catalogue)?;
        }
        Ok(published)
    }

    /// Resolve the target release, falling back to the configured default.
    /// Read-only releases are refused.
    fn writable_release(&self, name: Option<&str>) -> Result<&Release> {
        let Some(name) = name.or(self.config.default_release.as_deref()) else {
            exn::bail!(ErrorKind::Configuration("no release given and no default release".into()));
        };
        let Some(release) = self.config.release(name) else {
            exn::bail!(ErrorKind::Configuration(format!("unknown release {name}")));
        };
        if release.read_only {
            exn::bail!(ErrorKind::Policy(format!("release {name} is read-only")));
        }
        Ok(release)
    }

    /// Releases no longer in the configuration rank after every known one.
    fn slot(&self, release: &str, component: &str) -> Slot {
        let ordinal = self.config.release(release).map_or(u32::MAX, |r| r.ordinal);
        Slot::new(release, ordinal, component)
    }

    fn stored(&self, reference: &Reference) -> StoredRef {
        StoredRef { slot: self.slot(&reference.release, &reference.component), path: reference.path.clone() }
    }
}

/// The store layout chosen by configuration, rooted at the repository root.
pub fn build_store(config: &Config) -> Result<StoreHandle> {
    let mut fs = RepoFs::new(&config.root).or_raise(|| ErrorKind::Store)?;
    if let Some(morgue) = &config.morgue {
        fs = fs.with_morgue(morgue).or_raise(|| ErrorKind::Store)?;
    }
    Ok(match config.store {
        StoreKind::Pool => Arc::new(PoolStore::new(fs)),
        StoreKind::Tree => Arc::new(TreeStore::new(fs)),
    })
}

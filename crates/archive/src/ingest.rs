use crate::error::{self, ErrorKind, Result};
use crate::{Archive, Disposition, Outcome};
use debstash_catalogue::{NewPackage, Reference};
use debstash_config::Release;
use debstash_extract::error::ErrorKind as ExtractErrorKind;
use debstash_extract::{Artifact, inspect};
use debstash_index::SlotKey;
use debstash_storage::{PackageFile, StoredRef};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// What happened to each artifact of [`Archive::ingest_all`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub ingested: Vec<Outcome>,
    /// Artifacts that were refused or unreadable; the batch went on without them.
    pub failed: Vec<(PathBuf, error::Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub(crate) fn package_file(artifact: &Artifact) -> PackageFile {
    PackageFile {
        name: artifact.name.clone(),
        source: artifact.source.clone(),
        version: artifact.version.clone(),
        architecture: artifact.architecture.clone(),
    }
}

impl Archive {
    /// Add the package file at `path` to `release` (or the default release),
    /// in `component` (or the one chosen by the component rules).
    pub async fn ingest(&mut self, path: &Path, release: Option<&str>, component: Option<&str>) -> Result<Outcome> {
        self.ingest_inner(path, release, component).await
    }

    /// Ingest several files in order. Refused or unreadable artifacts are
    /// reported and skipped; a fatal error stops the batch.
    pub async fn ingest_all<P: AsRef<Path>>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
        release: Option<&str>,
        component: Option<&str>,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.ingest(path, release, component).await {
                Ok(outcome) => report.ingested.push(outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %*e, "skipping artifact");
                    report.failed.push((path.to_path_buf(), e));
                },
            }
        }
        Ok(report)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn ingest_inner(
        &self,
        path: &Path,
        release: Option<&str>,
        component: Option<&str>,
    ) -> Result<Outcome> {
        let release = self.writable_release(release)?;
        let artifact = match inspect(&*self.extractor, path) {
            Ok(artifact) => artifact,
            Err(e) => {
                let kind = match &*e {
                    ExtractErrorKind::NotFound(what) => ErrorKind::NotFound(what.clone()),
                    _ => ErrorKind::Extraction,
                };
                return Err(e).or_raise(|| kind);
            },
        };
        let component = component.unwrap_or_else(|| self.config.component_for(release, &artifact.name));
        if !release.has_component(component) {
            exn::bail!(ErrorKind::Configuration(format!(
                "release {} has no component {component}",
                release.name
            )));
        }
        if !release.has_architecture(&artifact.architecture) {
            exn::bail!(ErrorKind::Policy(format!(
                "release {} does not carry architecture {}",
                release.name, artifact.architecture
            )));
        }

        let references = error::catalogue(
            self.catalogue
                .references_for_ingest(&artifact.name, &artifact.architecture, &release.name, &artifact.version)
                .await,
        )?;
        let (current, others): (Vec<_>, Vec<_>) = references.into_iter().partition(|r| r.release == release.name);
        if current.len() > 1 {
            exn::bail!(ErrorKind::Consistency(format!(
                "{} references to {}/{} in release {}",
                current.len(),
                artifact.name,
                artifact.architecture,
                release.name
            )));
        }
        let current = current.into_iter().next();
        let sha256 = &artifact.digests.sha256;

        if let Some(current) = &current
            && current.sha256 == *sha256
        {
            tracing::info!(id = current.package_id, release = %release.name, "package already present");
            let outcome = Outcome {
                package_id: current.package_id,
                disposition: Disposition::AlreadyPresent,
                release: release.name.clone(),
                component: current.component.clone(),
                path: current.path.clone(),
            };
            return Ok(outcome);
        }

        if self.config.strict_versions
            && let Some(clash) = others.iter().find(|r| r.version == artifact.version && r.sha256 != *sha256)
        {
            exn::bail!(ErrorKind::Policy(format!(
                "{} {} ({}) exists in release {} with different content",
                artifact.name, artifact.version, artifact.architecture, clash.release
            )));
        }

        let mut touched = vec![SlotKey::new(component, &artifact.architecture)];
        if let Some(current) = &current
            && current.component != component
        {
            touched.push(SlotKey::new(&current.component, &artifact.architecture));
        }
        self.mark_dirty(&release.name, &touched).await?;

        let outcome = match others.iter().find(|r| r.sha256 == *sha256) {
            Some(existing) => {
                self.reuse(&artifact, release, component, existing.package_id, current.as_ref())
                    .await?
            },
            None => self.store_new(&artifact, release, component, current.as_ref()).await?,
        };
        tracing::info!(
            id = outcome.package_id,
            disposition = %outcome.disposition,
            path = %outcome.path.display(),
            "ingested {}",
            artifact.name,
        );
        Ok(outcome)
    }

    /// Publish content the catalogue already knows in one more release.
    async fn reuse(
        &self,
        artifact: &Artifact,
        release: &Release,
        component: &str,
        package_id: i64,
        current: Option<&Reference>,
    ) -> Result<Outcome> {
        tracing::debug!(id = package_id, "identical content found in another release");
        if let Some(current) = current {
            self.drop_from_store(current).await?;
        }
        let existing: Vec<StoredRef> = error::catalogue(self.catalogue.references_of(package_id).await)?
            .iter()
            .map(|r| self.stored(r))
            .collect();
        let slot = self.slot(&release.name, component);
        let path = error::store(
            self.store
                .add_reference(&package_file(artifact), &slot, &existing)
                .await,
        )?;
        match current {
            Some(current) => {
                error::catalogue(
                    self.catalogue
                        .replace_reference(current.package_id, &release.name, package_id, component, &path)
                        .await,
                )?;
            },
            None => {
                error::catalogue(
                    self.catalogue
                        .add_reference(package_id, &release.name, component, &path)
                        .await,
                )?;
            },
        }
        Ok(Outcome {
            package_id,
            disposition: Disposition::Reused,
            release: release.name.clone(),
            component: component.to_string(),
            path,
        })
    }

    /// Place bytes the repository has never seen, replacing whatever
    /// `current` held in this release.
    async fn store_new(
        &self,
        artifact: &Artifact,
        release: &Release,
        component: &str,
        current: Option<&Reference>,
    ) -> Result<Outcome> {
        let package = package_file(artifact);
        let slot = self.slot(&release.name, component);
        let target = self.store.path_for(&package, &slot);
        let occupied = error::catalogue(self.catalogue.references_at(&target).await)?;
        let replaced = |r: &Reference| current.is_some_and(|c| c.package_id == r.package_id && c.release == r.release);
        if let Some(holder) = occupied.iter().find(|r| !replaced(r)) {
            exn::bail!(ErrorKind::Policy(format!(
                "{} still holds {} {} for release {}",
                target.display(),
                holder.name,
                holder.version,
                holder.release
            )));
        }

        let new = NewPackage::from(artifact);
        let (package_id, disposition, path) = match current {
            Some(current) => {
                let remaining = self.drop_from_store(current).await?;
                let path = error::store(self.store.place_new(&artifact.path, &package, &slot).await)?;
                if remaining > 0 {
                    let id = error::catalogue(
                        self.catalogue
                            .supersede(current.package_id, &release.name, &new, component, &path)
                            .await,
                    )?;
                    (id, Disposition::Added, path)
                } else {
                    error::catalogue(
                        self.catalogue
                            .replace_package(current.package_id, &new, &release.name, component, &path)
                            .await,
                    )?;
                    (current.package_id, Disposition::Replaced, path)
                }
            },
            None => {
                let path = error::store(self.store.place_new(&artifact.path, &package, &slot).await)?;
                let id = error::catalogue(
                    self.catalogue
                        .insert_package(&new, &release.name, component, &path)
                        .await,
                )?;
                (id, Disposition::Added, path)
            },
        };
        Ok(Outcome {
            package_id,
            disposition,
            release: release.name.clone(),
            component: component.to_string(),
            path,
        })
    }
}

//! Rebuilding index files and the signed manifest of each release.

use crate::dirty::{DirtySlots, SlotKey};
use crate::error::{ErrorKind, Result};
use crate::manifest::ReleaseManifest;
use crate::sign::{SignerHandle, remove_signatures};
use crate::stanza::render;
use crate::writer::{IndexFile, IndexWriter};
use debstash_catalogue::Catalogue;
use debstash_compress::Compression;
use debstash_config::Release;
use exn::ResultExt;
use futures::TryStreamExt;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

pub const MANIFEST: &str = "Release";

/// What publishing did for one release.
#[derive(Debug, Clone)]
pub struct Published {
    pub release: String,
    /// Slots whose index files were regenerated; the others were re-hashed.
    pub rebuilt: Vec<SlotKey>,
    pub files: Vec<IndexFile>,
    pub signed: bool,
}

#[derive(Clone)]
pub struct Publisher {
    root: PathBuf,
    catalogue: Catalogue,
    compressions: Vec<Compression>,
    signer: Option<SignerHandle>,
}

impl Publisher {
    /// Without a signer, manifests are written unsigned.
    pub fn new(root: impl Into<PathBuf>, catalogue: Catalogue, compressions: Vec<Compression>) -> Self {
        Self { root: root.into(), catalogue, compressions, signer: None }
    }

    pub fn with_signer(mut self, signer: SignerHandle) -> Self {
        self.signer = Some(signer);
        self
    }

    /// `<root>/dists/<release>`
    pub fn release_dir(&self, release: &str) -> PathBuf {
        self.root.join("dists").join(release)
    }

    /// Publish every release with dirty slots, every release whose manifest
    /// is missing, or every release when `force` is set.
    pub async fn publish(&self, releases: &[Release], dirty: &DirtySlots, force: bool) -> Result<Vec<Published>> {
        let mut published = Vec::new();
        for release in releases {
            let missing = !self.release_dir(&release.name).join(MANIFEST).is_file();
            if !(force || missing || dirty.is_dirty(&release.name)) {
                tracing::debug!(release = %release.name, "release is clean, not publishing");
                continue;
            }
            published.push(self.publish_release(release, dirty.slots(&release.name), force || missing).await?);
        }
        Ok(published)
    }

    /// Rebuild the dirty slots of one release (all of them when `force`),
    /// re-hash the rest, write the manifest and sign it.
    #[instrument(skip(self, release, dirty), fields(release = %release.name))]
    pub async fn publish_release(
        &self,
        release: &Release,
        dirty: Option<&BTreeSet<SlotKey>>,
        force: bool,
    ) -> Result<Published> {
        let dir = self.release_dir(&release.name);
        let mut files = Vec::new();
        let mut rebuilt = Vec::new();
        for component in &release.components {
            for architecture in &release.architectures {
                let slot = SlotKey::new(component, architecture);
                if !force && !dirty.is_some_and(|d| d.contains(&slot)) {
                    if let Some(existing) = self.rehash_slot(&dir, &slot)? {
                        files.extend(existing);
                        continue;
                    }
                    tracing::warn!(slot = %slot.index_base(), "index files missing, rebuilding");
                }
                files.extend(self.build_slot(&dir, &release.name, &slot).await?);
                rebuilt.push(slot);
            }
        }

        let manifest = ReleaseManifest::new(release, files);
        let path = dir.join(MANIFEST);
        // A stale signature must never sit beside a newer manifest.
        remove_signatures(&path)?;
        write_atomic(&path, manifest.render(OffsetDateTime::now_utc()).as_bytes())?;
        let signed = match &self.signer {
            Some(signer) => {
                signer.sign(&path, release.gpg_key.as_deref())?;
                true
            },
            None => {
                tracing::warn!(release = %release.name, "release manifest left unsigned");
                false
            },
        };
        tracing::info!(rebuilt = rebuilt.len(), files = manifest.files().len(), signed, "release published");
        Ok(Published {
            release: release.name.clone(),
            rebuilt,
            files: manifest.files().to_vec(),
            signed,
        })
    }

    /// Digests of a slot's existing files, or `None` when any is missing.
    fn rehash_slot(&self, dir: &Path, slot: &SlotKey) -> Result<Option<Vec<IndexFile>>> {
        let base = slot.index_base();
        let mut files = Vec::with_capacity(self.compressions.len());
        for format in &self.compressions {
            match IndexFile::rehash(dir, format.file_name(&base))? {
                Some(file) => files.push(file),
                None => return Ok(None),
            }
        }
        Ok(Some(files))
    }

    async fn build_slot(&self, dir: &Path, release: &str, slot: &SlotKey) -> Result<Vec<IndexFile>> {
        let base = slot.index_base();
        let mut writer = IndexWriter::create(dir, &base, &self.compressions)?;
        let mut entries = self.catalogue.index_entries(release, &slot.component, &slot.architecture);
        let mut count = 0usize;
        while let Some(entry) = entries.try_next().await.or_raise(|| ErrorKind::Catalogue)? {
            let mut unit = render(&entry);
            if count > 0 {
                unit.insert(0, '\n');
            }
            writer.write_all(unit.as_bytes()).or_raise(|| ErrorKind::Io(dir.join(&base)))?;
            count += 1;
        }
        tracing::debug!(slot = %base, packages = count, "index rebuilt");
        writer.finish()
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    let mut partial = path.to_path_buf().into_os_string();
    partial.push(".new");
    let partial = PathBuf::from(partial);
    std::fs::write(&partial, bytes).or_raise(|| ErrorKind::Io(partial.clone()))?;
    std::fs::rename(&partial, path).or_raise(|| ErrorKind::Io(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::{DETACHED, INLINE, Signer};
    use debstash_catalogue::{Database, NewPackage};
    use debstash_extract::hash_file;
    use std::sync::{Arc, Mutex};

    /// Writes placeholder signatures and records the key it was asked for.
    #[derive(Default)]
    struct RecordingSigner {
        keys: Mutex<Vec<Option<String>>>,
    }
    impl Signer for RecordingSigner {
        fn sign(&self, release: &Path, key: Option<&str>) -> crate::error::Result<()> {
            let dir = release.parent().unwrap();
            std::fs::write(dir.join(DETACHED), "sig").unwrap();
            std::fs::write(dir.join(INLINE), "inline").unwrap();
            self.keys.lock().unwrap().push(key.map(str::to_string));
            Ok(())
        }
    }

    fn release() -> Release {
        Release {
            name: "unstable".into(),
            ordinal: 0,
            suite: None,
            version: None,
            origin: None,
            label: None,
            description: None,
            components: vec!["main".into()],
            architectures: vec!["amd64".into(), "all".into()],
            component_rules: vec![],
            read_only: false,
            gpg_key: Some("repo@example.org".into()),
        }
    }

    fn package(name: &str) -> NewPackage {
        NewPackage {
            name: name.into(),
            version: "1.0".into(),
            architecture: "amd64".into(),
            udeb: false,
            control: format!("Package: {name}\nVersion: 1.0\nArchitecture: amd64\n"),
            size: 10,
            md5sum: "m".into(),
            sha1: "s".into(),
            sha256: format!("sha-{name}"),
            description_md5: None,
        }
    }

    async fn fixture() -> (tempfile::TempDir, Publisher, Arc<RecordingSigner>) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let catalogue = Catalogue::from(&db);
        catalogue.sync_releases(&["unstable"]).await.unwrap();
        for name in ["b", "a"] {
            let path = PathBuf::from(format!("pool/main/{name}/{name}/{name}_1.0_amd64.deb"));
            catalogue.insert_package(&package(name), "unstable", "main", &path).await.unwrap();
        }
        let signer = Arc::new(RecordingSigner::default());
        let publisher = Publisher::new(
            temp_dir.path(),
            catalogue,
            vec![Compression::None, Compression::Gzip, Compression::Xz],
        )
        .with_signer(signer.clone());
        (temp_dir, publisher, signer)
    }

    /// `(digest, size, path)` lines of one manifest section.
    fn section(manifest: &str, name: &str) -> Vec<(String, u64, String)> {
        manifest
            .lines()
            .skip_while(|line| *line != format!("{name}:"))
            .skip(1)
            .take_while(|line| line.starts_with(' '))
            .map(|line| {
                let parts: Vec<_> = line.split_whitespace().collect();
                (parts[0].to_string(), parts[1].parse().unwrap(), parts[2].to_string())
            })
            .collect()
    }

    #[tokio::test]
    async fn manifest_digests_match_written_files() {
        let (temp_dir, publisher, signer) = fixture().await;
        let published = publisher.publish(&[release()], &DirtySlots::new(), false).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].rebuilt.len(), 2);
        assert!(published[0].signed);
        assert_eq!(*signer.keys.lock().unwrap(), [Some("repo@example.org".to_string())]);

        let dir = temp_dir.path().join("dists/unstable");
        let manifest = std::fs::read_to_string(dir.join("Release")).unwrap();
        assert!(manifest.contains("Codename: unstable\n"));
        assert!(manifest.contains("Architectures: amd64 all\n"));
        let sha256 = section(&manifest, "SHA256");
        assert_eq!(sha256.len(), 6);
        for (digest, size, path) in &sha256 {
            let actual = hash_file(&dir.join(path)).unwrap();
            assert_eq!(&actual.sha256, digest, "{path}");
            assert_eq!(actual.size, *size, "{path}");
        }
        let md5 = section(&manifest, "MD5Sum");
        assert_eq!(md5[0].2, "main/binary-all/Packages");
        assert_eq!(md5[0].0, hash_file(&dir.join(&md5[0].2)).unwrap().md5);

        let plain = std::fs::read(dir.join("main/binary-amd64/Packages")).unwrap();
        let gz = std::fs::read(dir.join("main/binary-amd64/Packages.gz")).unwrap();
        let xz = std::fs::read(dir.join("main/binary-amd64/Packages.xz")).unwrap();
        assert_eq!(Compression::Gzip.decompress(&gz).unwrap(), plain);
        assert_eq!(Compression::Xz.decompress(&xz).unwrap(), plain);
        let text = String::from_utf8(plain).unwrap();
        assert!(text.starts_with("Package: a\n"));
        assert!(text.contains("SHA256: sha-a\n\nPackage: b\n"));
        assert!(text.ends_with("SHA256: sha-b\n"));
        assert!(std::fs::read(dir.join("main/binary-all/Packages")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_releases_are_skipped_and_dirty_slots_rebuilt() {
        let (temp_dir, publisher, signer) = fixture().await;
        let releases = [release()];
        publisher.publish(&releases, &DirtySlots::new(), false).await.unwrap();

        // Manifest present and nothing dirty.
        assert!(publisher.publish(&releases, &DirtySlots::new(), false).await.unwrap().is_empty());

        let mut dirty = DirtySlots::new();
        dirty.mark("unstable", "main", "amd64");
        let published = publisher.publish(&releases, &dirty, false).await.unwrap();
        assert_eq!(published[0].rebuilt, [SlotKey::new("main", "amd64")]);
        assert_eq!(published[0].files.len(), 6);

        // A missing file of a clean slot gets rebuilt.
        std::fs::remove_file(temp_dir.path().join("dists/unstable/main/binary-all/Packages.xz")).unwrap();
        let published = publisher.publish(&releases, &dirty, false).await.unwrap();
        assert_eq!(published[0].rebuilt.len(), 2);

        let published = publisher.publish(&releases, &DirtySlots::new(), true).await.unwrap();
        assert_eq!(published[0].rebuilt.len(), 2);
        assert_eq!(signer.keys.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unsigned_publish_removes_stale_signatures() {
        let (temp_dir, publisher, _signer) = fixture().await;
        publisher.publish(&[release()], &DirtySlots::new(), false).await.unwrap();
        let dir = temp_dir.path().join("dists/unstable");
        assert!(dir.join(DETACHED).exists());

        let unsigned = Publisher::new(temp_dir.path(), publisher.catalogue.clone(), vec![Compression::None]);
        let published = unsigned.publish(&[release()], &DirtySlots::new(), true).await.unwrap();
        assert!(!published[0].signed);
        assert!(!dir.join(DETACHED).exists());
        assert!(!dir.join(INLINE).exists());
        assert!(dir.join(MANIFEST).exists());
    }

    #[tokio::test]
    async fn failed_manifest_write_leaves_no_signature_behind() {
        let (temp_dir, publisher, _signer) = fixture().await;
        publisher.publish(&[release()], &DirtySlots::new(), false).await.unwrap();
        let dir = temp_dir.path().join("dists/unstable");
        assert!(dir.join(DETACHED).exists());

        // The temporary manifest cannot be created over a directory.
        std::fs::create_dir(dir.join("Release.new")).unwrap();
        let err = publisher.publish(&[release()], &DirtySlots::new(), true).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)), "{err:?}");
        assert!(!dir.join(DETACHED).exists());
        assert!(!dir.join(INLINE).exists());
    }
}

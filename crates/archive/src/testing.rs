//! A scratch repository for engine tests.

use crate::Archive;
use debstash_catalogue::{Database, ListFilter, Reference};
use debstash_config::figment::Figment;
use debstash_config::figment::providers::{Format, Yaml};
use debstash_config::{Config, StoreKind};
use debstash_extract::mock::StaticExtractor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) struct Fixture {
    dir: TempDir,
    extractor: Arc<StaticExtractor>,
    pub archive: Archive,
}

impl Fixture {
    /// Releases are ranked in the order given.
    pub async fn new(store: StoreKind, releases: &[&str]) -> Self {
        Self::from_yaml(store, &Self::releases_yaml(releases)).await
    }

    pub async fn relaxed(store: StoreKind, releases: &[&str]) -> Self {
        let yaml = format!("strict_versions: false\n{}", Self::releases_yaml(releases));
        Self::from_yaml(store, &yaml).await
    }

    pub async fn from_yaml(store: StoreKind, yaml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("incoming")).unwrap();
        let root = dir.path().join("repo");
        let figment = Figment::from(Yaml::string(yaml)).merge(("store", store.to_string()));
        let config = Config::from_figment(figment, root, dir.path()).unwrap();

        let database = Database::connect_in_memory().await.unwrap();
        let extractor = Arc::new(StaticExtractor::new());
        let store = crate::build_store(&config).unwrap();
        let archive = Archive::new(config, (&database).into(), store, extractor.clone())
            .await
            .unwrap();
        Self { dir, extractor, archive }
    }

    fn releases_yaml(releases: &[&str]) -> String {
        let mut yaml = String::from("releases:\n");
        for release in releases {
            yaml.push_str(&format!("  - name: {release}\n"));
        }
        yaml
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    /// A path outside the repository for files waiting to be ingested.
    pub fn incoming(&self, name: &str) -> PathBuf {
        self.dir.path().join("incoming").join(name)
    }

    /// Write `bytes` as an `amd64` package and register its control stanza.
    pub fn artifact(&self, name: &str, version: &str, bytes: &[u8]) -> PathBuf {
        self.artifact_for(name, version, "amd64", bytes)
    }

    pub fn artifact_for(&self, name: &str, version: &str, architecture: &str, bytes: &[u8]) -> PathBuf {
        let path = self.incoming(&format!("{name}_{version}_{architecture}_{}.deb", hex_name(bytes)));
        std::fs::write(&path, bytes).unwrap();
        self.extractor.insert(
            &path,
            format!("Package: {name}\nVersion: {version}\nArchitecture: {architecture}\nDescription: {name} for tests\n"),
        );
        path
    }

    pub async fn references(&self) -> Vec<Reference> {
        self.archive.catalogue().list(&ListFilter::default()).await.unwrap()
    }

    pub fn read(&self, path: &Path) -> Vec<u8> {
        std::fs::read(self.root().join(path)).unwrap()
    }

    pub fn is_link(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(self.root().join(path)).unwrap().file_type().is_symlink()
    }

    /// Files and symlinks (not directories) below `dir`, sorted.
    pub fn files_under(&self, dir: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        walk(&self.root().join(dir), &mut found);
        found.sort();
        found
    }

    pub fn real_files_under(&self, dir: &str) -> Vec<PathBuf> {
        self.files_under(dir)
            .into_iter()
            .filter(|p| !std::fs::symlink_metadata(p).unwrap().file_type().is_symlink())
            .collect()
    }
}

fn hex_name(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let entry = entry.unwrap();
        let file_type = entry.file_type().unwrap();
        if file_type.is_dir() {
            walk(&entry.path(), found);
        } else {
            found.push(entry.path());
        }
    }
}

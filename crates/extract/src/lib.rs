//! Identity, control metadata and digests of Debian binary packages.
//!
//! [`inspect`] is the top-level entrypoint: it hashes the artifact in one
//! streaming pass and asks a [`ControlExtractor`] for its control stanza.

mod control;
mod deb;
mod digest;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

pub use crate::control::Control;
pub use crate::deb::DebExtractor;
pub use crate::digest::{Digests, Hasher, HashingWriter, hash_file, hash_reader};
use crate::error::Result;

/// Source of the control stanza of an artifact on disk.
pub trait ControlExtractor {
    fn control(&self, path: &Path) -> Result<Control>;
}

pub type ExtractorHandle = Arc<dyn ControlExtractor + Send + Sync>;

/// Everything the repository needs to know about one incoming package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub name: String,
    pub version: String,
    pub architecture: String,
    /// Source package name, used for the pool directory.
    pub source: String,
    pub udeb: bool,
    pub control: Control,
    pub digests: Digests,
    pub description_md5: Option<String>,
}

#[instrument(skip(extractor), fields(path = %path.display()))]
pub fn inspect(extractor: &dyn ControlExtractor, path: &Path) -> Result<Artifact> {
    let digests = hash_file(path)?;
    let control = extractor.control(path)?;
    let name = control.require("Package")?.to_string();
    let version = control.require("Version")?.to_string();
    let architecture = control.require("Architecture")?.to_string();
    let source = control.source_name().unwrap_or(&name).to_string();
    let description_md5 = control.description().map(|description| {
        let mut hasher = Md5::new();
        hasher.update(description.as_bytes());
        hasher.update(b"\n");
        hex::encode(hasher.finalize())
    });
    let udeb = path.extension().is_some_and(|ext| ext == "udeb");
    tracing::debug!(%name, %version, %architecture, sha256 = %digests.sha256, "inspected artifact");
    Ok(Artifact {
        path: path.to_path_buf(),
        name,
        version,
        architecture,
        source,
        udeb,
        control,
        digests,
        description_md5,
    })
}

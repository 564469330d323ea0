use derive_more::Display;
use std::path::PathBuf;

/// How an ingest changed the repository.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// New content under a fresh package id.
    #[display("added")]
    Added,
    /// New content took over the id of the content it replaced.
    #[display("replaced")]
    Replaced,
    /// Content already known from another release now also published here.
    #[display("reused")]
    Reused,
    /// The release already held this exact content; nothing changed.
    #[display("already present")]
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub package_id: i64,
    pub disposition: Disposition,
    pub release: String,
    pub component: String,
    /// Stored path, relative to the repository root.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub package_id: i64,
    pub release: String,
    pub component: String,
    /// References the package still has. Zero means its bytes are gone.
    pub remaining: u64,
}

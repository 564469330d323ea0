//! Physical package storage.
//!
//! [`RepoFs`] holds the filesystem primitives; [`ContentStore`] is the seam
//! between the ingestion engine and the two layouts, [`PoolStore`] and
//! [`TreeStore`], one of which is chosen at startup.

pub mod error;
mod fs;
mod models;
mod path;
pub mod store;

pub use crate::fs::{RepoFs, relative_target};
pub use crate::models::{PackageFile, Slot, StoredRef};
pub use crate::path::{PARTIAL_SUFFIX, repo_relative};
pub use crate::store::{ContentStore, PoolStore, TreeStore};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ContentStore + Send + Sync>;

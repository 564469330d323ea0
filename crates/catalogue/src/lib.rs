//! SQLite catalogue for the repository.
//!
//! The catalogue is the source of truth for *what* the repository contains:
//! one row per distinct package content and one reference per (release,
//! component) the content is published in. The content store holds the bytes
//! and is always mutated before the catalogue commits the matching change.
//!
//! # Architecture
//! - **Packages**: keyed by a surrogate integer id. Identity for
//!   deduplication is `(name, architecture, sha256)`.
//! - **References**: bind a package id to one release and component, with
//!   the artifact path relative to the repository root. A package row only
//!   lives while at least one reference points at it.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{DirtySlot, IndexEntry, ListFilter, NewPackage, Package, Reference};
pub use crate::repo::Catalogue;

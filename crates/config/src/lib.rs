//! Configuration loading and validation.
//!
//! The configuration is a YAML file (`debstash.yaml`) read with [`figment`],
//! with `DEBSTASH_*` environment variables layered on top. Lists may be
//! written as YAML sequences or as whitespace-separated strings.
//!
//! ```yaml
//! store: tree
//! default_gpg_key: repo@example.org
//! component_rules:
//!   - component: contrib
//!     packages: ["lib*-nonfree"]
//! releases:
//!   - name: stable
//!     read_only: true
//!   - name: testing
//!     components: main contrib
//! ```

pub mod error;
mod load;
mod model;
mod raw;

pub use crate::load::{ENV_PREFIX, FILE_NAME, Location, discover};
pub use crate::model::{ComponentRule, Config, DatabaseType, Release, StoreKind};
pub use figment;

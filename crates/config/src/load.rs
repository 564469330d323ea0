//! Locating and reading the configuration file.

use crate::error::{ErrorKind, Result};
use crate::model::Config;
use crate::raw::RawConfig;
use directories::{BaseDirs, ProjectDirs};
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const FILE_NAME: &str = "debstash.yaml";
pub const ENV_PREFIX: &str = "DEBSTASH_";
const SYSTEM_DIR: &str = "/etc/debstash";

/// Where a configuration file was found. Determines the default root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Given on the command line.
    Explicit,
    /// `./debstash.yaml`
    Local,
    /// The user's configuration directory.
    User,
    /// `/etc/debstash/debstash.yaml`
    System,
}

impl Location {
    /// Repository root used when the file does not set one.
    pub fn default_root(self, cwd: &Path) -> PathBuf {
        match self {
            Location::Explicit | Location::Local => cwd.to_path_buf(),
            Location::User => BaseDirs::new()
                .map(|dirs| dirs.home_dir().join("public_html").join("repo"))
                .unwrap_or_else(|| cwd.join("repo")),
            Location::System => PathBuf::from("/var/www/repo"),
        }
    }
}

/// Find the configuration file: explicit path first, then the current
/// directory, the user configuration directory, and the system directory.
pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(PathBuf, Location)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        return Ok((path.to_path_buf(), Location::Explicit));
    }
    let mut candidates = vec![(cwd.join(FILE_NAME), Location::Local)];
    if let Some(dirs) = ProjectDirs::from("", "", "debstash") {
        candidates.push((dirs.config_dir().join(FILE_NAME), Location::User));
    }
    candidates.push((Path::new(SYSTEM_DIR).join(FILE_NAME), Location::System));
    candidates
        .into_iter()
        .find(|(path, _)| path.is_file())
        .ok_or_raise(|| ErrorKind::Missing)
}

impl Config {
    /// Discover, read and validate the configuration, with `DEBSTASH_*`
    /// environment variables overriding the file.
    #[instrument(skip_all)]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().or_raise(|| ErrorKind::Parse)?;
        let (path, location) = discover(explicit, &cwd)?;
        tracing::debug!(path = %path.display(), ?location, "loading configuration");
        let figment = Figment::new()
            .merge(Yaml::file_exact(&path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(figment, location.default_root(&cwd), &cwd)
    }

    /// Validate configuration from any figment, e.g. an inline YAML string.
    pub fn from_figment(figment: Figment, default_root: PathBuf, base: &Path) -> Result<Self> {
        let raw: RawConfig = figment.extract().or_raise(|| ErrorKind::Parse)?;
        Self::resolve(raw, default_root, base)
    }
}

//! The configuration file exactly as written.

use serde::Deserialize;
use std::path::PathBuf;

/// A list that can be written either as a YAML sequence or as one
/// whitespace-separated string (handy for environment overrides).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Words {
    Line(String),
    List(Vec<String>),
}
impl Words {
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            Words::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Words::List(list) => list,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRule {
    pub component: String,
    pub packages: Words,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawConfig {
    pub root: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub database_type: Option<String>,
    pub store: Option<String>,
    pub default_architectures: Option<Words>,
    pub default_components: Option<Words>,
    pub component_rules: Vec<RawRule>,
    pub default_release: Option<String>,
    pub default_gpg_key: Option<String>,
    pub morgue: Option<PathBuf>,
    pub strict_versions: Option<bool>,
    pub compressions: Option<Words>,
    pub releases: Vec<RawRelease>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRelease {
    pub name: String,
    pub suite: Option<String>,
    pub version: Option<String>,
    pub origin: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub components: Option<Words>,
    pub architectures: Option<Words>,
    #[serde(default)]
    pub component_rules: Vec<RawRule>,
    #[serde(default)]
    pub read_only: bool,
    pub gpg_key: Option<String>,
}

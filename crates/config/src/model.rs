//! Validated configuration.

use crate::error::{ErrorKind, Result};
use crate::raw::{RawConfig, RawRelease, RawRule, Words};
use debstash_compress::Compression;
use derive_more::Display;
use exn::ResultExt;
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_ARCHITECTURES: &[&str] = &["all", "amd64", "i386"];
const DEFAULT_COMPONENTS: &[&str] = &["main"];
const DEFAULT_COMPRESSIONS: &[&str] = &["none", "gzip", "xz"];

/// Physical layout of package files.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    #[display("pool")]
    Pool,
    #[display("tree")]
    Tree,
}
impl FromStr for StoreKind {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "pool" => Ok(Self::Pool),
            "tree" | "symtree" => Ok(Self::Tree),
            other => exn::bail!(ErrorKind::Invalid(format!("unknown store '{other}'"))),
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    #[display("sqlite")]
    Sqlite,
}
impl FromStr for DatabaseType {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "sqlite" => Ok(Self::Sqlite),
            other => exn::bail!(ErrorKind::Invalid(format!("unknown database type '{other}'"))),
        }
    }
}

/// Assigns packages whose name matches any pattern to `component`.
#[derive(Debug, Clone)]
pub struct ComponentRule {
    pub component: String,
    pub packages: Vec<Pattern>,
}
impl ComponentRule {
    pub fn matches(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p.matches(package))
    }
}

#[derive(Debug, Clone)]
pub struct Release {
    pub name: String,
    /// Position in the configuration; lower is more canonical.
    pub ordinal: u32,
    pub suite: Option<String>,
    pub version: Option<String>,
    pub origin: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Never empty. The first one is the fallback component.
    pub components: Vec<String>,
    pub architectures: Vec<String>,
    /// Replaces the top-level rules when not empty.
    pub component_rules: Vec<ComponentRule>,
    pub read_only: bool,
    /// Release key, or the default key when the release has none.
    pub gpg_key: Option<String>,
}
impl Release {
    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    pub fn has_architecture(&self, architecture: &str) -> bool {
        self.architectures.iter().any(|a| a == architecture)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute repository root.
    pub root: PathBuf,
    pub database: PathBuf,
    pub database_type: DatabaseType,
    pub store: StoreKind,
    pub component_rules: Vec<ComponentRule>,
    /// `None` only when every release is read-only.
    pub default_release: Option<String>,
    pub default_gpg_key: Option<String>,
    /// Relative to the root.
    pub morgue: Option<PathBuf>,
    pub strict_versions: bool,
    pub compressions: Vec<Compression>,
    /// In declaration order, so `releases[i].ordinal == i`.
    pub releases: Vec<Release>,
}

impl Config {
    /// Resolve defaults and validate. Relative paths are taken relative to `base`.
    pub(crate) fn resolve(raw: RawConfig, default_root: PathBuf, base: &Path) -> Result<Self> {
        let root = base.join(raw.root.unwrap_or(default_root));
        let database = match raw.database {
            Some(path) => base.join(path),
            None => root.join("db").join("repo.db"),
        };
        let database_type = raw.database_type.as_deref().unwrap_or("sqlite").parse()?;
        let store = raw.store.as_deref().unwrap_or("pool").parse()?;
        let default_architectures = words_or(raw.default_architectures, DEFAULT_ARCHITECTURES);
        let default_components = words_or(raw.default_components, DEFAULT_COMPONENTS);
        let component_rules = compile_rules(raw.component_rules)?;
        let compressions = words_or(raw.compressions, DEFAULT_COMPRESSIONS)
            .iter()
            .map(|name| {
                name.parse::<Compression>()
                    .or_raise(|| ErrorKind::Invalid(format!("unknown compression '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        if compressions.is_empty() {
            exn::bail!(ErrorKind::Invalid("no index compressions configured".into()));
        }
        if let Some(morgue) = &raw.morgue
            && (morgue.is_absolute() || morgue.as_os_str().is_empty())
        {
            exn::bail!(ErrorKind::Invalid("morgue must be a path relative to the root".into()));
        }

        if raw.releases.is_empty() {
            exn::bail!(ErrorKind::Invalid("no releases configured".into()));
        }
        let mut seen = HashSet::new();
        let mut releases = Vec::with_capacity(raw.releases.len());
        for (ordinal, release) in raw.releases.into_iter().enumerate() {
            if !seen.insert(release.name.clone()) {
                exn::bail!(ErrorKind::Invalid(format!("release '{}' declared twice", release.name)));
            }
            let ordinal = u32::try_from(ordinal).or_raise(|| ErrorKind::Invalid("too many releases".into()))?;
            releases.push(Self::resolve_release(
                release,
                ordinal,
                &default_architectures,
                &default_components,
                raw.default_gpg_key.as_deref(),
            )?);
        }

        let default_release = match raw.default_release {
            Some(name) => {
                if !releases.iter().any(|r| r.name == name) {
                    exn::bail!(ErrorKind::Invalid(format!("unknown default release '{name}'")));
                }
                Some(name)
            },
            None => releases.iter().find(|r| !r.read_only).map(|r| r.name.clone()),
        };

        Ok(Self {
            root,
            database,
            database_type,
            store,
            component_rules,
            default_release,
            default_gpg_key: raw.default_gpg_key,
            morgue: raw.morgue,
            strict_versions: raw.strict_versions.unwrap_or(true),
            compressions,
            releases,
        })
    }

    fn resolve_release(
        raw: RawRelease,
        ordinal: u32,
        default_architectures: &[String],
        default_components: &[String],
        default_gpg_key: Option<&str>,
    ) -> Result<Release> {
        if raw.name.trim().is_empty() || raw.name.contains('/') {
            exn::bail!(ErrorKind::Invalid(format!("invalid release name '{}'", raw.name)));
        }
        let components = raw.components.map_or_else(|| default_components.to_vec(), Words::into_vec);
        if components.is_empty() {
            exn::bail!(ErrorKind::Invalid(format!("release '{}' has no components", raw.name)));
        }
        let architectures = raw.architectures.map_or_else(|| default_architectures.to_vec(), Words::into_vec);
        let component_rules = compile_rules(raw.component_rules)?;
        Ok(Release {
            ordinal,
            suite: raw.suite,
            version: raw.version,
            origin: raw.origin,
            label: raw.label,
            description: raw.description,
            components,
            architectures,
            component_rules,
            read_only: raw.read_only,
            gpg_key: raw.gpg_key.or_else(|| default_gpg_key.map(str::to_string)),
            name: raw.name,
        })
    }

    pub fn release(&self, name: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.name == name)
    }

    pub fn release_names(&self) -> Vec<&str> {
        self.releases.iter().map(|r| r.name.as_str()).collect()
    }

    /// Component for `package` in `release`: the first matching rule of the
    /// release (or the top-level rules when the release has none), falling
    /// back to the release's first component.
    pub fn component_for<'a>(&'a self, release: &'a Release, package: &str) -> &'a str {
        let rules = if release.component_rules.is_empty() {
            &self.component_rules
        } else {
            &release.component_rules
        };
        rules
            .iter()
            .find(|rule| rule.matches(package))
            .map_or(release.components[0].as_str(), |rule| rule.component.as_str())
    }
}

fn words_or(words: Option<Words>, default: &[&str]) -> Vec<String> {
    words.map_or_else(|| default.iter().map(|s| s.to_string()).collect(), Words::into_vec)
}

fn compile_rules(rules: Vec<RawRule>) -> Result<Vec<ComponentRule>> {
    rules
        .into_iter()
        .map(|rule| {
            let packages = rule
                .packages
                .into_vec()
                .iter()
                .map(|p| Pattern::new(p).or_raise(|| ErrorKind::Invalid(format!("invalid package pattern '{p}'"))))
                .collect::<Result<Vec<_>>>()?;
            Ok(ComponentRule { component: rule.component, packages })
        })
        .collect()
}

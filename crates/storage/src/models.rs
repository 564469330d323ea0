//! Storage models.

use std::path::PathBuf;

/// The identity fields a store needs to lay out one package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub name: String,
    /// Source package name; determines the pool directory.
    pub source: String,
    pub version: String,
    pub architecture: String,
}
impl PackageFile {
    /// `<name>_<version-without-epoch>_<arch>.deb`
    pub fn file_name(&self) -> String {
        let version = self.version.split_once(':').map_or(self.version.as_str(), |(_, v)| v);
        format!("{}_{}_{}.deb", self.name, version, self.architecture)
    }
}

/// A (release, component) location, with the release's ordinal from
/// configuration so that stores can rank references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub release: String,
    pub ordinal: u32,
    pub component: String,
}
impl Slot {
    pub fn new(release: impl Into<String>, ordinal: u32, component: impl Into<String>) -> Self {
        Self { release: release.into(), ordinal, component: component.into() }
    }
}

/// A live reference as the store sees it: where it is and what file backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRef {
    pub slot: Slot,
    /// Relative to the repository root.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0-1", "hello_1.0-1_amd64.deb")]
    #[case("2:1.0-1", "hello_1.0-1_amd64.deb")]
    fn file_name_drops_epoch(#[case] version: &str, #[case] expected: &str) {
        let file = PackageFile {
            name: "hello".into(),
            source: "hello".into(),
            version: version.into(),
            architecture: "amd64".into(),
        };
        assert_eq!(file.file_name(), expected);
    }
}

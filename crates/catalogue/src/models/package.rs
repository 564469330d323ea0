use crate::error::{Error, ErrorKind};
use debstash_extract::Artifact;
use exn::ResultExt;
use std::path::PathBuf;

/// Package content about to be written to the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPackage {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub udeb: bool,
    /// Rendered control stanza, `\n` terminated.
    pub control: String,
    pub size: u64,
    pub md5sum: String,
    pub sha1: String,
    pub sha256: String,
    pub description_md5: Option<String>,
}
impl From<&Artifact> for NewPackage {
    fn from(artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            architecture: artifact.architecture.clone(),
            udeb: artifact.udeb,
            control: artifact.control.to_string(),
            size: artifact.digests.size,
            md5sum: artifact.digests.md5.clone(),
            sha1: artifact.digests.sha1.clone(),
            sha256: artifact.digests.sha256.clone(),
            description_md5: artifact.description_md5.clone(),
        }
    }
}

/// A catalogued package row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub udeb: bool,
    pub control: String,
    pub size: u64,
    pub md5sum: String,
    pub sha1: String,
    pub sha256: String,
    pub description_md5: Option<String>,
}

/// One package as it appears in a slot's index, with the path of its
/// reference in that release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub package: Package,
    pub path: PathBuf,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    id: i64,
    name: String,
    control: String,
    version: String,
    architecture: String,
    udeb: bool,
    size: i64,
    md5sum: String,
    sha1: String,
    sha256: String,
    description_md5: Option<String>,
}
impl TryFrom<PackageRow> for Package {
    type Error = Error;
    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            version: row.version,
            architecture: row.architecture,
            udeb: row.udeb,
            control: row.control,
            size: u64::try_from(row.size).or_raise(|| ErrorKind::InvalidData("package size"))?,
            md5sum: row.md5sum,
            sha1: row.sha1,
            sha256: row.sha256,
            description_md5: row.description_md5,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct IndexRow {
    #[sqlx(flatten)]
    package: PackageRow,
    path: String,
}
impl TryFrom<IndexRow> for IndexEntry {
    type Error = Error;
    fn try_from(row: IndexRow) -> Result<Self, Self::Error> {
        Ok(Self { package: row.package.try_into()?, path: PathBuf::from(row.path) })
    }
}

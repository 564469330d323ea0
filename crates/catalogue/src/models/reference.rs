use std::path::PathBuf;

/// A package published in one (release, component), with denormalized
/// identity fields of the package it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub package_id: i64,
    pub release_id: i64,
    pub release: String,
    pub component: String,
    /// Relative to the repository root.
    pub path: PathBuf,
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub sha256: String,
}

/// Optional filters for [`Catalogue::list`](crate::Catalogue::list).
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub release: Option<String>,
    pub component: Option<String>,
    pub architecture: Option<String>,
    /// Shell-style glob on the package name.
    pub pattern: Option<String>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReferenceRow {
    package_id: i64,
    release_id: i64,
    release: String,
    component: String,
    path: String,
    name: String,
    version: String,
    architecture: String,
    sha256: String,
}
impl From<ReferenceRow> for Reference {
    fn from(row: ReferenceRow) -> Self {
        Self {
            package_id: row.package_id,
            release_id: row.release_id,
            release: row.release,
            component: row.component,
            path: PathBuf::from(row.path),
            name: row.name,
            version: row.version,
            architecture: row.architecture,
            sha256: row.sha256,
        }
    }
}

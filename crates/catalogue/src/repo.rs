//! Repository for packages and their release references.
//!
//! Packages and references are tightly coupled: a package row only exists
//! while a reference points at it, so every operation that could leave a
//! package unreferenced handles both in one transaction.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{DirtySlot, IndexEntry, IndexRow, ListFilter, NewPackage, Package, PackageRow, Reference, ReferenceRow};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::instrument;

/// Repository over the catalogue tables.
///
/// Releases are addressed by codename; they must have been registered with
/// [`sync_releases`](Self::sync_releases) before references can point at them.
#[derive(Debug, Clone)]
pub struct Catalogue {
    pool: SqlitePool,
}
impl From<&Database> for Catalogue {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Catalogue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn sqlx_hates_paths(path: &Path) -> Result<&str> {
        path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))
    }

    fn sqlx_hates_u64(size: u64) -> Result<i64> {
        i64::try_from(size).or_raise(|| ErrorKind::InvalidData("package size"))
    }

    // =========================================================================
    // Releases
    // =========================================================================

    /// Register every configured release. Releases found in the catalogue but
    /// no longer configured are kept, and reported.
    #[instrument(skip_all)]
    pub async fn sync_releases(&self, codenames: &[impl AsRef<str>]) -> Result<()> {
        for codename in codenames {
            sqlx::query(include_str!("../queries/sync_release.sql"))
                .bind(codename.as_ref())
                .execute(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        let known: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_release_codenames.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for codename in known {
            if !codenames.iter().any(|c| c.as_ref() == codename) {
                tracing::warn!(release = %codename, "release in catalogue is not configured");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// References relevant to ingesting `(name, architecture)` at `version`
    /// into `release`: every reference in `release` plus every reference
    /// elsewhere with the same version. References in `release` come first.
    pub async fn references_for_ingest(
        &self,
        name: &str,
        architecture: &str,
        release: &str,
        version: &str,
    ) -> Result<Vec<Reference>> {
        let rows: Vec<ReferenceRow> = sqlx::query_as(include_str!("../queries/references_for_ingest.sql"))
            .bind(name)
            .bind(architecture)
            .bind(release)
            .bind(version)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Reference::from).collect())
    }

    /// Every live reference to a package, in release registration order.
    pub async fn references_of(&self, package_id: i64) -> Result<Vec<Reference>> {
        let rows: Vec<ReferenceRow> = sqlx::query_as(include_str!("../queries/references_of.sql"))
            .bind(package_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Reference::from).collect())
    }

    /// The reference for `(name, architecture)` in `release`, if any.
    ///
    /// Returns [`ErrorKind::Consistency`] if the release holds more than one.
    pub async fn reference_in(&self, release: &str, name: &str, architecture: &str) -> Result<Option<Reference>> {
        let mut rows: Vec<ReferenceRow> = sqlx::query_as(include_str!("../queries/reference_in.sql"))
            .bind(release)
            .bind(name)
            .bind(architecture)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if rows.len() > 1 {
            exn::bail!(ErrorKind::Consistency(format!(
                "{} references for {name}/{architecture} in {release}",
                rows.len()
            )));
        }
        Ok(rows.pop().map(Reference::from))
    }

    /// Every live reference whose artifact lives at `path`.
    pub async fn references_at(&self, path: &Path) -> Result<Vec<Reference>> {
        let rows: Vec<ReferenceRow> = sqlx::query_as(include_str!("../queries/references_at.sql"))
            .bind(Self::sqlx_hates_paths(path)?)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Reference::from).collect())
    }

    pub async fn get_package(&self, id: i64) -> Result<Option<Package>> {
        let row: Option<PackageRow> = sqlx::query_as(include_str!("../queries/get_package.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Package::try_from).transpose()
    }

    /// Number of live references to a package.
    pub async fn refcount(&self, package_id: i64) -> Result<u64> {
        Self::count_references(&self.pool, package_id).await
    }

    async fn count_references<'e, E>(executor: E, package_id: i64) -> Result<u64>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_references.sql"))
            .bind(package_id)
            .fetch_one(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("reference count"))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Packages published in one (release, component, architecture) slot,
    /// ordered by name.
    pub fn index_entries<'a>(
        &'a self,
        release: &'a str,
        component: &'a str,
        architecture: &'a str,
    ) -> BoxStream<'a, Result<IndexEntry>> {
        sqlx::query_as::<_, IndexRow>(include_str!("../queries/index_entries.sql"))
            .bind(release)
            .bind(component)
            .bind(architecture)
            .fetch(&self.pool)
            .map(|row| row.or_raise(|| ErrorKind::Database).and_then(IndexEntry::try_from))
            .boxed()
    }

    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Reference>> {
        let rows: Vec<ReferenceRow> = sqlx::query_as(include_str!("../queries/list_references.sql"))
            .bind(filter.release.as_deref())
            .bind(filter.component.as_deref())
            .bind(filter.architecture.as_deref())
            .bind(filter.pattern.as_deref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Reference::from).collect())
    }

    // =========================================================================
    // Insert/Update
    // =========================================================================

    /// Insert new content together with its first reference. Returns the new id.
    #[instrument(skip(self, package, path), fields(name = %package.name, version = %package.version))]
    pub async fn insert_package(
        &self,
        package: &NewPackage,
        release: &str,
        component: &str,
        path: &Path,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let id = Self::insert_package_row(&mut tx, package).await?;
        Self::insert_reference(&mut tx, id, release, component, path).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(id, "package added to catalogue");
        Ok(id)
    }

    /// Publish already-catalogued content in another release.
    #[instrument(skip(self, path))]
    pub async fn add_reference(&self, package_id: i64, release: &str, component: &str, path: &Path) -> Result<()> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        Self::insert_reference(&mut conn, package_id, release, component, path).await?;
        tracing::info!("reference added to catalogue");
        Ok(())
    }

    /// Overwrite the content of package `id` in place, keeping its id, and
    /// point its reference in `release` at the new path.
    ///
    /// Only valid when `release` is the sole referencer of `id`.
    #[instrument(skip(self, package, path), fields(name = %package.name, version = %package.version))]
    pub async fn replace_package(
        &self,
        id: i64,
        package: &NewPackage,
        release: &str,
        component: &str,
        path: &Path,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let refcount = Self::count_references(&mut *tx, id).await?;
        if refcount != 1 {
            exn::bail!(ErrorKind::Consistency(format!(
                "package {id} has {refcount} references, cannot replace in place"
            )));
        }
        let updated = sqlx::query(include_str!("../queries/update_package.sql"))
            .bind(&package.name)
            .bind(&package.control)
            .bind(&package.version)
            .bind(&package.architecture)
            .bind(package.udeb)
            .bind(Self::sqlx_hates_u64(package.size)?)
            .bind(&package.md5sum)
            .bind(&package.sha1)
            .bind(&package.sha256)
            .bind(package.description_md5.as_deref())
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if updated.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("package {id}")));
        }
        let updated = sqlx::query(include_str!("../queries/update_reference.sql"))
            .bind(component)
            .bind(Self::sqlx_hates_paths(path)?)
            .bind(id)
            .bind(release)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if updated.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("package {id} in {release}")));
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(id, "package replaced in catalogue");
        Ok(())
    }

    /// Drop the reference of `old_id` in `release` and publish new content
    /// there under a fresh id. The old package must still be referenced
    /// elsewhere. Returns the new id.
    #[instrument(skip(self, package, path), fields(name = %package.name, version = %package.version))]
    pub async fn supersede(
        &self,
        old_id: i64,
        release: &str,
        package: &NewPackage,
        component: &str,
        path: &Path,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::delete_reference_row(&mut tx, old_id, release).await?;
        if Self::count_references(&mut *tx, old_id).await? == 0 {
            exn::bail!(ErrorKind::Consistency(format!(
                "package {old_id} would be left without references"
            )));
        }
        let id = Self::insert_package_row(&mut tx, package).await?;
        Self::insert_reference(&mut tx, id, release, component, path).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(old_id, id, "package superseded in catalogue");
        Ok(id)
    }

    /// Point `release` at already-catalogued package `new_id` instead of
    /// `old_id`, deleting the old package row if that was its last reference.
    ///
    /// Returns the number of references `old_id` has left.
    #[instrument(skip(self, path))]
    pub async fn replace_reference(
        &self,
        old_id: i64,
        release: &str,
        new_id: i64,
        component: &str,
        path: &Path,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::delete_reference_row(&mut tx, old_id, release).await?;
        let remaining = Self::count_references(&mut *tx, old_id).await?;
        if remaining == 0 {
            Self::delete_package_row(&mut tx, old_id).await?;
        }
        Self::insert_reference(&mut tx, new_id, release, component, path).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(remaining, "reference moved to other package");
        Ok(remaining)
    }

    async fn insert_package_row(conn: &mut SqliteConnection, package: &NewPackage) -> Result<i64> {
        let inserted = sqlx::query(include_str!("../queries/insert_package.sql"))
            .bind(&package.name)
            .bind(&package.control)
            .bind(&package.version)
            .bind(&package.architecture)
            .bind(package.udeb)
            .bind(Self::sqlx_hates_u64(package.size)?)
            .bind(&package.md5sum)
            .bind(&package.sha1)
            .bind(&package.sha256)
            .bind(package.description_md5.as_deref())
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(inserted.last_insert_rowid())
    }

    async fn insert_reference(
        conn: &mut SqliteConnection,
        package_id: i64,
        release: &str,
        component: &str,
        path: &Path,
    ) -> Result<()> {
        sqlx::query(include_str!("../queries/insert_reference.sql"))
            .bind(release)
            .bind(component)
            .bind(package_id)
            .bind(Self::sqlx_hates_paths(path)?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Dirty slots
    // =========================================================================

    /// Remember that the index of `(release, component, architecture)` must
    /// be rebuilt at the next publish.
    pub async fn mark_dirty(&self, release: &str, component: &str, architecture: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/mark_dirty.sql"))
            .bind(release)
            .bind(component)
            .bind(architecture)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::trace!(release, component, architecture, "slot marked dirty");
        Ok(())
    }

    pub async fn dirty_slots(&self) -> Result<Vec<DirtySlot>> {
        sqlx::query_as(include_str!("../queries/list_dirty.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Forget the dirty slots of a release once it has been published.
    pub async fn clear_dirty(&self, release: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/clear_dirty.sql"))
            .bind(release)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove the reference of `package_id` in `release`. The package row is
    /// deleted along with its last reference.
    ///
    /// Returns the number of references left.
    #[instrument(skip(self))]
    pub async fn delete_reference(&self, package_id: i64, release: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::delete_reference_row(&mut tx, package_id, release).await?;
        let remaining = Self::count_references(&mut *tx, package_id).await?;
        if remaining == 0 {
            Self::delete_package_row(&mut tx, package_id).await?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(remaining, "reference removed from catalogue");
        Ok(remaining)
    }

    async fn delete_package_row(conn: &mut SqliteConnection, package_id: i64) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_package.sql"))
            .bind(package_id)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete_reference_row(conn: &mut SqliteConnection, package_id: i64, release: &str) -> Result<()> {
        let deleted = sqlx::query(include_str!("../queries/delete_reference.sql"))
            .bind(package_id)
            .bind(release)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if deleted.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("package {package_id} in {release}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn package(name: &str, version: &str, sha256: &str) -> NewPackage {
        NewPackage {
            name: name.to_string(),
            version: version.to_string(),
            architecture: "amd64".to_string(),
            udeb: false,
            control: format!("Package: {name}\nVersion: {version}\nArchitecture: amd64\n"),
            size: 1,
            md5sum: "md5".to_string(),
            sha1: "sha1".to_string(),
            sha256: sha256.to_string(),
            description_md5: None,
        }
    }

    async fn catalogue() -> Catalogue {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Catalogue::from(&db);
        repo.sync_releases(&["unstable", "testing"]).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = catalogue().await;
        let id = repo
            .insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("pool/main/a/a/a.deb"))
            .await
            .unwrap();
        assert_eq!(id, 1);
        let stored = repo.get_package(id).await.unwrap().unwrap();
        assert_eq!(stored.sha256, "aa");
        assert_eq!(repo.refcount(id).await.unwrap(), 1);
        let reference = repo.reference_in("unstable", "a", "amd64").await.unwrap().unwrap();
        assert_eq!(reference.package_id, id);
        assert_eq!(reference.path, Path::new("pool/main/a/a/a.deb"));
        assert!(repo.reference_in("testing", "a", "amd64").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dirty_slots_persist_until_cleared() {
        let repo = catalogue().await;
        repo.mark_dirty("testing", "main", "amd64").await.unwrap();
        repo.mark_dirty("unstable", "main", "all").await.unwrap();
        repo.mark_dirty("unstable", "main", "all").await.unwrap();
        let slots = repo.dirty_slots().await.unwrap();
        assert_eq!(slots.len(), 2);
        // Release registration order.
        assert_eq!(slots[0].release, "unstable");
        repo.clear_dirty("unstable").await.unwrap();
        let slots = repo.dirty_slots().await.unwrap();
        assert_eq!(
            slots,
            [DirtySlot { release: "testing".into(), component: "main".into(), architecture: "amd64".into() }]
        );
        // Unknown releases cannot be marked.
        assert!(repo.mark_dirty("stable", "main", "amd64").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_release_is_rejected() {
        let repo = catalogue().await;
        let result = repo.insert_package(&package("a", "1.0", "aa"), "stable", "main", Path::new("a.deb")).await;
        assert!(result.is_err());
        // Nothing committed.
        assert!(repo.get_package(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_references_for_ingest_puts_target_first() {
        let repo = catalogue().await;
        let path = Path::new("a.deb");
        let id = repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", path).await.unwrap();
        repo.add_reference(id, "testing", "main", path).await.unwrap();
        let refs = repo.references_for_ingest("a", "amd64", "testing", "2.0").await.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].release, "testing");
        let refs = repo.references_for_ingest("a", "amd64", "testing", "1.0").await.unwrap();
        assert_eq!(refs.iter().map(|r| r.release.as_str()).collect::<Vec<_>>(), ["testing", "unstable"]);
        assert!(repo.references_for_ingest("b", "amd64", "testing", "1.0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_keeps_id() {
        let repo = catalogue().await;
        let id = repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("a1.deb")).await.unwrap();
        repo.replace_package(id, &package("a", "2.0", "bb"), "unstable", "main", Path::new("a2.deb"))
            .await
            .unwrap();
        let stored = repo.get_package(id).await.unwrap().unwrap();
        assert_eq!(stored.version, "2.0");
        assert_eq!(stored.sha256, "bb");
        let reference = repo.reference_in("unstable", "a", "amd64").await.unwrap().unwrap();
        assert_eq!(reference.path, Path::new("a2.deb"));
    }

    #[tokio::test]
    async fn test_replace_refuses_shared_package() {
        let repo = catalogue().await;
        let id = repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("a.deb")).await.unwrap();
        repo.add_reference(id, "testing", "main", Path::new("a.deb")).await.unwrap();
        let err = repo
            .replace_package(id, &package("a", "2.0", "bb"), "unstable", "main", Path::new("a2.deb"))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Consistency(_)));
    }

    #[tokio::test]
    async fn test_supersede_mints_new_id() {
        let repo = catalogue().await;
        let old = repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("a.deb")).await.unwrap();
        repo.add_reference(old, "testing", "main", Path::new("a.deb")).await.unwrap();
        let new = repo
            .supersede(old, "unstable", &package("a", "2.0", "bb"), "main", Path::new("a2.deb"))
            .await
            .unwrap();
        assert_eq!(new, 2);
        assert_eq!(repo.refcount(old).await.unwrap(), 1);
        assert_eq!(repo.refcount(new).await.unwrap(), 1);
        assert_eq!(repo.reference_in("unstable", "a", "amd64").await.unwrap().unwrap().package_id, new);
        assert_eq!(repo.reference_in("testing", "a", "amd64").await.unwrap().unwrap().package_id, old);
    }

    #[tokio::test]
    async fn test_last_reference_deletes_package() {
        let repo = catalogue().await;
        let id = repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("a.deb")).await.unwrap();
        repo.add_reference(id, "testing", "main", Path::new("a.deb")).await.unwrap();
        assert_eq!(repo.delete_reference(id, "testing").await.unwrap(), 1);
        assert!(repo.get_package(id).await.unwrap().is_some());
        assert_eq!(repo.delete_reference(id, "unstable").await.unwrap(), 0);
        assert!(repo.get_package(id).await.unwrap().is_none());
        let err = repo.delete_reference(id, "unstable").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_reference_drops_orphaned_package() {
        let repo = catalogue().await;
        let shared = Path::new("pool/main/a/a/a_1.0_amd64.deb");
        let new = repo.insert_package(&package("a", "1.0", "aa"), "testing", "main", shared).await.unwrap();
        let old = repo.insert_package(&package("a", "0.9", "99"), "unstable", "main", Path::new("a0.deb")).await.unwrap();
        assert_eq!(repo.replace_reference(old, "unstable", new, "main", shared).await.unwrap(), 0);
        assert!(repo.get_package(old).await.unwrap().is_none());
        assert_eq!(repo.refcount(new).await.unwrap(), 2);
        let at_path = repo.references_at(shared).await.unwrap();
        assert_eq!(at_path.iter().map(|r| r.release.as_str()).collect::<Vec<_>>(), ["unstable", "testing"]);
    }

    #[tokio::test]
    async fn test_duplicate_references_are_inconsistent() {
        let repo = catalogue().await;
        repo.insert_package(&package("a", "1.0", "aa"), "unstable", "main", Path::new("a1.deb")).await.unwrap();
        repo.insert_package(&package("a", "2.0", "bb"), "unstable", "main", Path::new("a2.deb")).await.unwrap();
        let err = repo.reference_in("unstable", "a", "amd64").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Consistency(_)));
    }

    #[tokio::test]
    async fn test_index_entries_ordered_by_name() {
        let repo = catalogue().await;
        for name in ["zed", "alpha", "mid"] {
            repo.insert_package(&package(name, "1.0", name), "unstable", "main", Path::new(name)).await.unwrap();
        }
        repo.insert_package(&package("other", "1.0", "o"), "unstable", "contrib", Path::new("o")).await.unwrap();
        let entries: Vec<IndexEntry> = repo.index_entries("unstable", "main", "amd64").try_collect().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.package.name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zed"]);
        assert_eq!(entries[0].path, Path::new("alpha"));
        let empty: Vec<IndexEntry> = repo.index_entries("testing", "main", "amd64").try_collect().await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let repo = catalogue().await;
        let id = repo.insert_package(&package("libfoo", "1.0", "f"), "unstable", "main", Path::new("f")).await.unwrap();
        repo.add_reference(id, "testing", "main", Path::new("f")).await.unwrap();
        repo.insert_package(&package("hello", "1.0", "h"), "unstable", "contrib", Path::new("h")).await.unwrap();

        assert_eq!(repo.list(&ListFilter::default()).await.unwrap().len(), 3);
        let filter = ListFilter { release: Some("unstable".into()), ..Default::default() };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        let filter = ListFilter { pattern: Some("lib*".into()), ..Default::default() };
        let refs = repo.list(&filter).await.unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.name == "libfoo"));
        let filter = ListFilter { component: Some("contrib".into()), architecture: Some("i386".into()), ..Default::default() };
        assert!(repo.list(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_releases_is_idempotent() {
        let repo = catalogue().await;
        repo.sync_releases(&["unstable", "testing"]).await.unwrap();
        // Dropping a release from the configuration keeps its row.
        repo.sync_releases(&["unstable"]).await.unwrap();
        repo.insert_package(&package("a", "1.0", "aa"), "testing", "main", Path::new("a.deb")).await.unwrap();
    }
}

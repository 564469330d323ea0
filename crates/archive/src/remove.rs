use crate::error::{self, ErrorKind, Result};
use crate::{Archive, Removed};
use debstash_catalogue::Reference;
use debstash_index::SlotKey;
use debstash_storage::StoredRef;
use tracing::instrument;

impl Archive {
    /// Withdraw `name`/`architecture` from `release`. The bytes go away (or
    /// to the morgue) once no release references them.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, name: &str, architecture: &str, release: &str) -> Result<Removed> {
        let release = self.writable_release(Some(release))?.name.clone();
        let Some(reference) = error::catalogue(self.catalogue.reference_in(&release, name, architecture).await)?
        else {
            exn::bail!(ErrorKind::NotFound(format!("{name} ({architecture}) in release {release}")));
        };
        self.mark_dirty(&release, &[SlotKey::new(&reference.component, architecture)])
            .await?;
        self.drop_from_store(&reference).await?;
        let remaining =
            error::catalogue(self.catalogue.delete_reference(reference.package_id, &release).await)?;
        tracing::info!(id = reference.package_id, remaining, "removed {name} from {release}");
        Ok(Removed {
            package_id: reference.package_id,
            release,
            component: reference.component,
            remaining,
        })
    }

    /// Have the store forget `reference`, handing it the references that
    /// survive. Returns how many survive.
    pub(crate) async fn drop_from_store(&self, reference: &Reference) -> Result<usize> {
        let remaining: Vec<StoredRef> = error::catalogue(self.catalogue.references_of(reference.package_id).await)?
            .iter()
            .filter(|r| r.release != reference.release)
            .map(|r| self.stored(r))
            .collect();
        let removed = self.stored(reference);
        if remaining.is_empty() {
            error::store(self.store.remove_last_reference(&removed).await)?;
        } else {
            error::store(self.store.remove_reference(&removed, &remaining).await)?;
        }
        Ok(remaining.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::testing::Fixture;
    use debstash_config::StoreKind;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn removing_the_last_reference_deletes_everything(
        #[values(StoreKind::Pool, StoreKind::Tree)] store: StoreKind,
    ) {
        let mut f = Fixture::new(store, &["unstable"]).await;
        let deb = f.artifact("hello", "1.0", b"\xAA");
        let added = f.archive.ingest(&deb, None, None).await.unwrap();

        let removed = f.archive.remove("hello", "amd64", "unstable").await.unwrap();
        assert_eq!((removed.package_id, removed.remaining), (1, 0));
        assert!(!f.root().join(&added.path).exists());
        assert!(f.archive.catalogue().get_package(1).await.unwrap().is_none());
        assert!(f.archive.dirty().await.unwrap().is_dirty("unstable"));
    }

    #[tokio::test]
    async fn removing_the_primary_promotes_the_next_release() {
        let mut f = Fixture::new(StoreKind::Tree, &["stable", "testing", "unstable"]).await;
        let deb = f.artifact("hello", "1.0", b"\xAA");
        let stable = f.archive.ingest(&deb, Some("stable"), None).await.unwrap();
        let testing = f.archive.ingest(&deb, Some("testing"), None).await.unwrap();
        let unstable = f.archive.ingest(&deb, Some("unstable"), None).await.unwrap();

        let removed = f.archive.remove("hello", "amd64", "stable").await.unwrap();
        assert_eq!(removed.remaining, 2);
        assert!(!f.root().join(&stable.path).exists());
        assert!(!f.is_link(&testing.path));
        assert!(f.is_link(&unstable.path));
        assert_eq!(f.read(&unstable.path), b"\xAA");
        assert_eq!(f.archive.catalogue().refcount(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn pool_keeps_shared_file() {
        let mut f = Fixture::new(StoreKind::Pool, &["unstable", "testing"]).await;
        let deb = f.artifact("hello", "1.0", b"\xAA");
        let added = f.archive.ingest(&deb, Some("unstable"), None).await.unwrap();
        f.archive.ingest(&deb, Some("testing"), None).await.unwrap();

        let removed = f.archive.remove("hello", "amd64", "unstable").await.unwrap();
        assert_eq!(removed.remaining, 1);
        assert_eq!(f.read(&added.path), b"\xAA");
    }

    #[tokio::test]
    async fn removal_goes_to_the_morgue() {
        let mut f = Fixture::from_yaml(StoreKind::Pool, "morgue: morgue\nreleases:\n  - name: unstable\n").await;
        let deb = f.artifact("hello", "1.0", b"\xAA");
        f.archive.ingest(&deb, None, None).await.unwrap();
        f.archive.remove("hello", "amd64", "unstable").await.unwrap();
        assert_eq!(f.files_under("morgue").len(), 1);
    }

    #[tokio::test]
    async fn refusals() {
        let mut f = Fixture::from_yaml(
            StoreKind::Pool,
            "releases:\n  - name: stable\n    read_only: true\n  - name: unstable\n",
        )
        .await;
        let err = f.archive.remove("hello", "amd64", "unstable").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = f.archive.remove("hello", "amd64", "stable").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Policy(_)));
    }
}

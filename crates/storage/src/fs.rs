//! Filesystem primitives shared by both store layouts.
//!
//! All paths handed to [`RepoFs`] are relative to the repository root and
//! validated before use. Operations go through `tokio::fs`.

use crate::error::{ErrorKind, Result};
use crate::path::{PARTIAL_SUFFIX, repo_relative};
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct RepoFs {
    root: PathBuf,
    /// Relative directory that receives removed artifacts instead of deleting them.
    morgue: Option<PathBuf>,
}

impl RepoFs {
    /// # Errors
    ///
    /// Returns an error if the root is not absolute or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Only happens once, when the repository is first used.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root, morgue: None })
    }

    pub fn with_morgue(mut self, morgue: impl AsRef<Path>) -> Result<Self> {
        self.morgue = Some(repo_relative(morgue)?);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = repo_relative(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    pub(crate) fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn create_parent(&self, abs_path: &Path, path: &Path) -> Result<()> {
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(())
    }

    /// Copy an outside file into the repository, replacing whatever is there.
    ///
    /// The bytes land in a temporary sibling first so that an interrupted copy
    /// never leaves a truncated artifact at the final path.
    pub async fn copy_in(&self, source: &Path, path: &Path) -> Result<u64> {
        let abs_path = self.absolute_path(path)?;
        self.create_parent(&abs_path, path).await?;
        let mut partial = abs_path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        let size = fs::copy(source, &partial).await.map_err(|e| Self::map_io_error(e, source))?;
        fs::rename(&partial, &abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Ok(size)
    }

    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        self.create_parent(&to_path, to).await?;
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, from))?)
    }

    /// Replace whatever is at `link` with a relative symlink resolving to `target`.
    pub async fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        let abs_link = self.absolute_path(link)?;
        let target = repo_relative(target)?;
        let link = repo_relative(link)?;
        self.create_parent(&abs_link, &link).await?;
        if fs::symlink_metadata(&abs_link).await.is_ok() {
            fs::remove_file(&abs_link).await.map_err(|e| Self::map_io_error(e, &link))?;
        }
        let relative = relative_target(&link, &target);
        tracing::debug!(link = %link.display(), target = %relative.display(), "symlink");
        Ok(fs::symlink(&relative, &abs_link).await.map_err(|e| Self::map_io_error(e, &link))?)
    }

    /// Whether `path` is a symlink (`true`) or a real file (`false`).
    pub async fn is_symlink(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::symlink_metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Ok(metadata.file_type().is_symlink())
    }

    /// Whether anything (including a dangling symlink) exists at `path`.
    pub async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        match fs::symlink_metadata(&abs_path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => exn::bail!(Self::map_io_error(e, path)),
        }
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    /// Remove the file at `path`, then prune directories it leaves empty.
    ///
    /// A file that is already gone only logs a warning.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        match fs::remove_file(&abs_path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "removing file: not found");
            },
            Err(e) => exn::bail!(Self::map_io_error(e, path)),
        }
        self.prune(&abs_path).await;
        Ok(())
    }

    /// Remove an artifact for good: moved into the morgue when one is
    /// configured, deleted otherwise.
    pub async fn discard(&self, path: &Path) -> Result<()> {
        let Some(morgue) = &self.morgue else {
            return self.remove(path).await;
        };
        let abs_path = self.absolute_path(path)?;
        if fs::symlink_metadata(&abs_path).await.is_err() {
            tracing::warn!(path = %path.display(), "moving file to morgue: not found");
            self.prune(&abs_path).await;
            return Ok(());
        }
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");
        let buried = morgue.join(format!("{file_name}-{}", OffsetDateTime::now_utc().unix_timestamp()));
        self.rename(path, &buried).await?;
        tracing::info!(path = %path.display(), morgue = %buried.display(), "moved to morgue");
        self.prune(&abs_path).await;
        Ok(())
    }

    pub async fn remove_empty_parents(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        self.prune(&abs_path).await;
        Ok(())
    }

    /// Walk up from a removed file removing empty directories, stopping at
    /// the root or the first directory that cannot be removed.
    async fn prune(&self, abs_path: &Path) {
        let mut current = abs_path.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

/// Symlink target for `link` so that it resolves to `target`; both relative
/// to the same root.
pub fn relative_target(link: &Path, target: &Path) -> PathBuf {
    let link_dir: Vec<Component> = link.parent().map(|p| p.components().collect()).unwrap_or_default();
    let target_parts: Vec<Component> = target.components().collect();
    let common = link_dir
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = PathBuf::new();
    for _ in common..link_dir.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part);
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dists/testing/main/a.deb", "dists/stable/main/a.deb", "../../stable/main/a.deb")]
    #[case("dists/stable/contrib/a.deb", "dists/stable/main/a.deb", "../main/a.deb")]
    #[case("dists/stable/main/b.deb", "dists/stable/main/a.deb", "a.deb")]
    fn relative_targets(#[case] link: &str, #[case] target: &str, #[case] expected: &str) {
        assert_eq!(relative_target(Path::new(link), Path::new(target)), Path::new(expected));
    }

    #[test]
    fn new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(RepoFs::new(temp_dir.path()).is_ok());
        assert!(RepoFs::new("relative/path").is_err());
    }

    #[tokio::test]
    async fn copy_in_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("incoming.deb");
        std::fs::write(&source, [0xAA]).unwrap();
        let repo = RepoFs::new(temp_dir.path().join("repo")).unwrap();
        let path = Path::new("pool/main/h/hello/hello_1.0_all.deb");
        assert_eq!(repo.copy_in(&source, path).await.unwrap(), 1);
        assert_eq!(repo.read(path).await.unwrap(), [0xAA]);
        assert!(!repo.is_symlink(path).await.unwrap());
    }

    #[tokio::test]
    async fn symlink_resolves_to_target() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = RepoFs::new(temp_dir.path()).unwrap();
        let source = temp_dir.path().join("in.deb");
        std::fs::write(&source, b"bytes").unwrap();
        let target = Path::new("dists/stable/main/a.deb");
        let link = Path::new("dists/testing/main/a.deb");
        repo.copy_in(&source, target).await.unwrap();
        repo.symlink(target, link).await.unwrap();
        assert!(repo.is_symlink(link).await.unwrap());
        assert_eq!(repo.read(link).await.unwrap(), b"bytes");
        // Relinking over an existing link replaces it.
        repo.symlink(target, link).await.unwrap();
        assert_eq!(repo.read(link).await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn remove_prunes_empty_directories_and_tolerates_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = RepoFs::new(temp_dir.path()).unwrap();
        let source = temp_dir.path().join("in.deb");
        std::fs::write(&source, b"x").unwrap();
        let path = Path::new("pool/main/h/hello/hello_1.0_all.deb");
        repo.copy_in(&source, path).await.unwrap();
        repo.remove(path).await.unwrap();
        assert!(!temp_dir.path().join("pool").exists());
        assert!(temp_dir.path().exists());
        // Already gone: warning only.
        repo.remove(path).await.unwrap();
    }

    #[tokio::test]
    async fn discard_moves_into_morgue() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = RepoFs::new(temp_dir.path()).unwrap().with_morgue("morgue").unwrap();
        let source = temp_dir.path().join("in.deb");
        std::fs::write(&source, b"x").unwrap();
        let path = Path::new("pool/main/h/hello/hello_1.0_all.deb");
        repo.copy_in(&source, path).await.unwrap();
        repo.discard(path).await.unwrap();
        assert!(!repo.exists(path).await.unwrap());
        let buried: Vec<_> = std::fs::read_dir(temp_dir.path().join("morgue"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(buried.len(), 1);
        assert!(buried[0].starts_with("hello_1.0_all.deb-"));
    }

    #[tokio::test]
    async fn path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = RepoFs::new(temp_dir.path()).unwrap();
        assert!(repo.read(Path::new("../etc/passwd")).await.is_err());
        assert!(repo.remove(Path::new("../../file")).await.is_err());
        // Not quietly rebased onto the root.
        std::fs::write(temp_dir.path().join("Release"), b"x").unwrap();
        assert!(repo.read(Path::new("/Release")).await.is_err());
        assert!(repo.exists(Path::new("/Release")).await.is_err());
    }
}

//! Repository-relative paths.
//!
//! Every path the stores hand to [`RepoFs`](crate::RepoFs) is built from
//! catalogue fields (`pool/main/h/hello/...`, `dists/stable/main/...`), so a
//! well-formed one is always a plain chain of names below the root. Anything
//! else came from a corrupt row or a hostile control field and is refused
//! rather than repaired.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Suffix of a file still being copied into the repository.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Check that `path` names something strictly inside the repository root and
/// return it without `.` components or doubled slashes.
///
/// Refused: absolute paths, any `..`, NUL bytes, names ending in
/// [`PARTIAL_SUFFIX`] and paths that name the root itself.
///
/// ```
/// use std::path::Path;
/// use debstash_storage::repo_relative;
///
/// assert_eq!(
///     repo_relative("./pool//main/h/hello/hello_1.0_amd64.deb").unwrap(),
///     Path::new("pool/main/h/hello/hello_1.0_amd64.deb")
/// );
/// assert!(repo_relative("/dists/stable/Release").is_err());
/// assert!(repo_relative("dists/../pool/x.deb").is_err());
/// ```
pub fn repo_relative(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(name) if is_plain_name(name) => relative.push(name),
            Component::CurDir => {},
            _ => exn::bail!(invalid()),
        }
    }
    if relative.as_os_str().is_empty() {
        exn::bail!(invalid());
    }
    Ok(relative)
}

// NUL passes through Path::components() on Unix but truncates the name in syscalls.
fn is_plain_name(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    !bytes.contains(&0) && !bytes.ends_with(PARTIAL_SUFFIX.as_bytes())
}

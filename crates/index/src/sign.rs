//! Signing a release manifest.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

pub const DETACHED: &str = "Release.gpg";
pub const INLINE: &str = "InRelease";

/// Produces `Release.gpg` and `InRelease` beside a `Release` file.
pub trait Signer {
    fn sign(&self, release: &Path, key: Option<&str>) -> Result<()>;
}

pub type SignerHandle = Arc<dyn Signer + Send + Sync>;

/// Paths of the detached and clear-signed variants of `release`.
pub fn signature_paths(release: &Path) -> (PathBuf, PathBuf) {
    let dir = release.parent().unwrap_or(Path::new(""));
    (dir.join(DETACHED), dir.join(INLINE))
}

/// Remove stale signatures so that a failed or skipped signing never leaves
/// a signature over an older manifest.
pub fn remove_signatures(release: &Path) -> Result<()> {
    let (detached, inline) = signature_paths(release);
    for path in [detached, inline] {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed old signature"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io(path)),
        }
    }
    Ok(())
}

/// Signs with the `gpg` executable found on `PATH`.
#[derive(Debug, Clone)]
pub struct GpgSigner {
    program: PathBuf,
}

impl GpgSigner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn discover() -> Result<Self> {
        for name in ["gpg", "gpg2"] {
            if let Ok(program) = which::which(name) {
                tracing::debug!(program = %program.display(), "found signing executable");
                return Ok(Self::new(program));
            }
        }
        exn::bail!(ErrorKind::SignerNotFound("gpg".into()));
    }

    pub(crate) fn args(key: Option<&str>, mode: &str, output: &Path, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--no-tty".into(), "--batch".into(), "--yes".into()];
        if let Some(key) = key {
            args.push("--local-user".into());
            args.push(key.into());
        }
        args.push(mode.into());
        args.push("--output".into());
        args.push(output.into());
        args.push(input.into());
        args
    }

    fn run(&self, args: Vec<OsString>) -> Result<()> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .or_raise(|| ErrorKind::Signing(format!("could not run {}", self.program.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            exn::bail!(ErrorKind::Signing(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(())
    }
}

impl Signer for GpgSigner {
    fn sign(&self, release: &Path, key: Option<&str>) -> Result<()> {
        let (detached, inline) = signature_paths(release);
        tracing::info!(release = %release.display(), key = key.unwrap_or("default"), "signing release");
        self.run(Self::args(key, "--detach-sign", &detached, release))?;
        self.run(Self::args(key, "--clearsign", &inline, release))?;
        Ok(())
    }
}

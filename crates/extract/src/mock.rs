//! Test doubles for crates that ingest packages.

use crate::control::Control;
use crate::error::{ErrorKind, Result};
use crate::ControlExtractor;
use debstash_compress::Compression;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// An extractor that answers from a table of `path => control text`, so that
/// tests can ingest files whose bytes are arbitrary.
#[derive(Debug, Default)]
pub struct StaticExtractor {
    controls: RwLock<HashMap<PathBuf, String>>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, control: impl Into<String>) {
        if let Ok(mut controls) = self.controls.write() {
            controls.insert(path.into(), control.into());
        }
    }
}

impl ControlExtractor for StaticExtractor {
    fn control(&self, path: &Path) -> Result<Control> {
        let text = self
            .controls
            .read()
            .ok()
            .and_then(|controls| controls.get(path).cloned());
        match text {
            Some(text) => Control::parse(&text),
            None => exn::bail!(ErrorKind::Malformed(format!("no control registered for {}", path.display()))),
        }
    }
}

/// Assemble a minimal `.deb` whose `control.tar` holds `control`.
pub fn build_deb(control: &str, format: Compression) -> io::Result<Vec<u8>> {
    let control_tar = {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(control.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "./control", control.as_bytes())?;
        builder.into_inner()?
    };
    let data_tar = tar::Builder::new(Vec::new()).into_inner()?;

    let mut out = Vec::new();
    out.write_all(b"!<arch>\n")?;
    append_member(&mut out, "debian-binary", b"2.0\n")?;
    let control_name = format!("control.tar{}", format.extension());
    append_member(&mut out, &control_name, &compress(format, &control_tar)?)?;
    append_member(&mut out, "data.tar", &data_tar)?;
    Ok(out)
}

fn compress(format: Compression, bytes: &[u8]) -> io::Result<Vec<u8>> {
    format.compress(bytes).map_err(|e| io::Error::other(e.to_string()))
}

fn append_member(out: &mut Vec<u8>, name: &str, data: &[u8]) -> io::Result<()> {
    write!(out, "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", name, 0, 0, 0, "100644", data.len())?;
    out.write_all(data)?;
    if data.len() % 2 == 1 {
        out.write_all(b"\n")?;
    }
    Ok(())
}

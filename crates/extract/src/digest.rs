//! Size and multi-digest hashing in a single pass.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use tracing::instrument;

const BUFFER_SIZE: usize = 64 * 1024;

/// Byte count plus every digest an index stanza or release manifest lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digests {
    pub size: u64,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

#[derive(Clone, Default)]
pub struct Hasher {
    size: u64,
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.size += bytes.len() as u64;
        self.md5.update(bytes);
        self.sha1.update(bytes);
        self.sha256.update(bytes);
    }

    pub fn finalize(self) -> Digests {
        Digests {
            size: self.size,
            md5: hex::encode(self.md5.finalize()),
            sha1: hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
        }
    }

    pub fn digest(bytes: &[u8]) -> Digests {
        let mut hasher = Self::new();
        hasher.update(bytes);
        hasher.finalize()
    }
}

/// Hash everything read from `reader` until EOF.
pub fn hash_reader(mut reader: impl Read) -> io::Result<Digests> {
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize())
}

pub(crate) fn open(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            exn::bail!(ErrorKind::NotFound(path.display().to_string()))
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Io),
    }
}

#[instrument(level = "debug", fields(path = %path.display()))]
pub fn hash_file(path: &Path) -> Result<Digests> {
    let file = open(path)?;
    hash_reader(BufReader::new(file)).or_raise(|| ErrorKind::Io)
}

/// A writer that hashes and counts exactly the bytes it passes through.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Hasher,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, hasher: Hasher::new() }
    }

    pub fn into_parts(self) -> (W, Digests) {
        (self.inner, self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn known_digests_of_empty_input() {
        let digests = Hasher::digest(b"");
        assert_eq!(digests.size, 0);
        assert_eq!(digests.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digests.sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            digests.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_digests_of_abc() {
        let digests = Hasher::digest(b"abc");
        assert_eq!(digests.size, 3);
        assert_eq!(digests.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digests.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            digests.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = vec![0xAAu8; BUFFER_SIZE * 2 + 17];
        assert_eq!(hash_reader(Cursor::new(&data)).unwrap(), Hasher::digest(&data));
    }

    #[test]
    fn writer_hashes_what_it_writes() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(b"ab").unwrap();
        writer.write_all(b"c").unwrap();
        let (inner, digests) = writer.into_parts();
        assert_eq!(inner, b"abc");
        assert_eq!(digests, Hasher::digest(b"abc"));
    }

    #[test]
    fn hash_file_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(&dir.path().join("missing.deb")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}

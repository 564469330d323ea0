//! Writing one logical index to several compressed files at once.

use crate::error::{ErrorKind, Result};
use debstash_compress::{Compression, Encoder};
use debstash_extract::{Digests, HashingWriter, hash_file};
use exn::ResultExt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A written index file as listed in the release manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    /// Relative to the release directory, `/` separated.
    pub path: String,
    pub digests: Digests,
}

impl IndexFile {
    /// Hash an index file already on disk, or `None` if it does not exist.
    pub fn rehash(release_dir: &Path, path: String) -> Result<Option<Self>> {
        let absolute = release_dir.join(&path);
        if !absolute.is_file() {
            return Ok(None);
        }
        let digests = hash_file(&absolute).or_raise(|| ErrorKind::Io(absolute.clone()))?;
        Ok(Some(Self { path, digests }))
    }
}

struct Sink {
    path: String,
    partial: PathBuf,
    target: PathBuf,
    encoder: Encoder<HashingWriter<BufWriter<File>>>,
}

/// Fans every write out to one sink per compression. Each sink hashes and
/// counts the bytes it actually writes to disk, so the digests describe the
/// compressed files.
///
/// Files are written beside their final name and only renamed into place by
/// [`finish`](Self::finish).
pub struct IndexWriter {
    sinks: Vec<Sink>,
}

impl IndexWriter {
    /// `base` is the uncompressed file path relative to `release_dir`, e.g.
    /// `main/binary-amd64/Packages`.
    pub fn create(release_dir: &Path, base: &str, compressions: &[Compression]) -> Result<Self> {
        let mut sinks = Vec::with_capacity(compressions.len());
        for format in compressions {
            let path = format.file_name(base);
            let target = release_dir.join(&path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
            }
            let mut partial = target.clone().into_os_string();
            partial.push(".new");
            let partial = PathBuf::from(partial);
            let file = File::create(&partial).or_raise(|| ErrorKind::Io(partial.clone()))?;
            let encoder = format
                .encoder(HashingWriter::new(BufWriter::new(file)))
                .or_raise(|| ErrorKind::Compression)?;
            sinks.push(Sink { path, partial, target, encoder });
        }
        Ok(Self { sinks })
    }

    /// Flush every sink, move the files into place and return what was written.
    pub fn finish(self) -> Result<Vec<IndexFile>> {
        let mut written = Vec::with_capacity(self.sinks.len());
        for sink in self.sinks {
            let hashing = sink.encoder.finish().or_raise(|| ErrorKind::Compression)?;
            let (_file, digests) = hashing.into_parts();
            fs::rename(&sink.partial, &sink.target).or_raise(|| ErrorKind::Io(sink.target.clone()))?;
            tracing::debug!(path = %sink.path, size = digests.size, "index file written");
            written.push(IndexFile { path: sink.path, digests });
        }
        Ok(written)
    }
}

impl Write for IndexWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.encoder.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.encoder.flush()?;
        }
        Ok(())
    }
}

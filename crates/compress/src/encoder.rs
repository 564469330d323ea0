//! Owned streaming encoder.
//!
//! Unlike a boxed `dyn Write`, an [`Encoder`] can be finished explicitly so
//! that the trailer is flushed and the inner writer handed back, which the
//! index builder relies on to read the final digests of each sink.

use crate::Compression;
use crate::error::{ErrorKind, Result};
use crate::ops::{BZIP2_LEVEL, GZIP_LEVEL};
#[cfg(feature = "xz")]
use crate::ops::XZ_LEVEL;
#[cfg(feature = "zstd")]
use crate::ops::ZSTD_LEVEL;
use bzip2::write::BzEncoder;
use exn::ResultExt;
use flate2::write::GzEncoder;
use std::io::{self, Write};
#[cfg(feature = "xz")]
use xz2::write::XzEncoder;
#[cfg(feature = "zstd")]
use zstd::stream::write::Encoder as ZstdEncoder;

pub enum Encoder<W: Write> {
    None(W),
    Bzip2(BzEncoder<W>),
    Gzip(GzEncoder<W>),
    #[cfg(feature = "xz")]
    Xz(XzEncoder<W>),
    #[cfg(feature = "zstd")]
    Zstd(ZstdEncoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(format: Compression, writer: W) -> Result<Self> {
        Ok(match format {
            Compression::None => Self::None(writer),
            Compression::Bzip2 => Self::Bzip2(BzEncoder::new(writer, BZIP2_LEVEL)),
            Compression::Gzip => Self::Gzip(GzEncoder::new(writer, GZIP_LEVEL)),
            #[cfg(feature = "xz")]
            Compression::Xz => Self::Xz(XzEncoder::new(writer, XZ_LEVEL)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Self::Zstd(ZstdEncoder::new(writer, ZSTD_LEVEL).or_raise(|| ErrorKind::Encoder)?),
        })
    }

    pub fn format(&self) -> Compression {
        match self {
            Self::None(_) => Compression::None,
            Self::Bzip2(_) => Compression::Bzip2,
            Self::Gzip(_) => Compression::Gzip,
            #[cfg(feature = "xz")]
            Self::Xz(_) => Compression::Xz,
            #[cfg(feature = "zstd")]
            Self::Zstd(_) => Compression::Zstd,
        }
    }

    /// Write the format trailer and return the inner writer.
    pub fn finish(self) -> Result<W> {
        let mut inner = match self {
            Self::None(w) => w,
            Self::Bzip2(e) => e.finish().or_raise(|| ErrorKind::Io)?,
            Self::Gzip(e) => e.finish().or_raise(|| ErrorKind::Io)?,
            #[cfg(feature = "xz")]
            Self::Xz(e) => e.finish().or_raise(|| ErrorKind::Io)?,
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.finish().or_raise(|| ErrorKind::Io)?,
        };
        inner.flush().or_raise(|| ErrorKind::Io)?;
        Ok(inner)
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::None(w) => w.write(buf),
            Self::Bzip2(e) => e.write(buf),
            Self::Gzip(e) => e.write(buf),
            #[cfg(feature = "xz")]
            Self::Xz(e) => e.write(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::None(w) => w.flush(),
            Self::Bzip2(e) => e.flush(),
            Self::Gzip(e) => e.flush(),
            #[cfg(feature = "xz")]
            Self::Xz(e) => e.flush(),
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.flush(),
        }
    }
}

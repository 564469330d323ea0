//! Compression Operations

use crate::error::{ErrorKind, Result};
use crate::{Compression, Encoder};
use bzip2::{Compression as BzCompression, read::BzDecoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder};
use std::io::{Read, Write};
use tracing::instrument;
#[cfg(feature = "xz")]
use xz2::read::XzDecoder;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

// Index files are small and written rarely; use the highest levels.
pub(crate) const BZIP2_LEVEL: BzCompression = BzCompression::best();
pub(crate) const GZIP_LEVEL: GzCompression = GzCompression::best();
#[cfg(feature = "xz")]
pub(crate) const XZ_LEVEL: u32 = 9;
#[cfg(feature = "zstd")]
pub(crate) const ZSTD_LEVEL: i32 = 19;

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use debstash_compress::Compression;
    ///
    /// let data = b"Package: hello\n";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert_eq!(compressed[..2], [0x1F, 0x8B]);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len()))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder(Vec::new())?;
        encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
        encoder.finish()
    }

    /// Decompress a byte slice in memory.
    #[instrument(skip(input), fields(format = %self, input_size = input.len()))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut reader = self.wrap_reader(input)?;
        reader.read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
        Ok(output)
    }

    /// Wrap a reader with the appropriate decompression layer.
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Box::new(ZstdDecoder::new(reader).or_raise(|| ErrorKind::Encoder)?),
        })
    }

    /// Wrap a writer in an owned [`Encoder`] for this format.
    pub fn encoder<W: Write>(&self, writer: W) -> Result<Encoder<W>> {
        Encoder::new(*self, writer)
    }
}

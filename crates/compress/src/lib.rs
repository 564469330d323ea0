//! Compression codecs for repository index files.
//!
//! A `Packages` index is published once per configured [`Compression`], and
//! every variant must be readable back (for re-hashing published indices and
//! for unpacking `control.tar.*` members of a `.deb`). This crate wraps the
//! codec libraries behind a single enum, providing:
//!
//! - **Format detection** from file extensions ([`Compression::from_path`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** via a wrapped reader ([`Compression::wrap_reader`]) or an
//!   owned [`Encoder`] that hands the inner writer back on
//!   [`finish`](Encoder::finish)
//!
//! Bzip2 and Gzip are always available; XZ and Zstandard sit behind the
//! default `xz` and `zstd` features. Current dpkg writes `control.tar.zst`
//! by default, so dropping `zstd` makes such packages unreadable.

mod construct;
mod encoder;
pub mod error;
mod ops;
mod util;

pub use crate::encoder::Encoder;

/// A supported compression format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
    /// XZ/LZMA compression (.xz)
    #[cfg(feature = "xz")]
    Xz,
    /// Zstandard compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}

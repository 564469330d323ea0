//! Index generation for a repository.
//!
//! Each (release, component, architecture) slot gets a `Packages` index,
//! written once per configured compression from a single pass over the
//! catalogue. Each release then gets a `Release` manifest listing every index
//! file with its size and digests, signed by a [`Signer`].
//!
//! Layout under the repository root:
//!
//! ```text
//! dists/<release>/Release
//! dists/<release>/Release.gpg
//! dists/<release>/InRelease
//! dists/<release>/<component>/binary-<arch>/Packages[.gz|.bz2|.xz]
//! ```

mod dirty;
pub mod error;
mod manifest;
mod publish;
mod sign;
mod stanza;
mod writer;

pub use crate::dirty::{DirtySlots, SlotKey};
pub use crate::manifest::ReleaseManifest;
pub use crate::publish::{MANIFEST, Published, Publisher};
pub use crate::sign::{GpgSigner, Signer, SignerHandle, remove_signatures, signature_paths};
pub use crate::writer::{IndexFile, IndexWriter};

//! Bounded streaming extraction from MTA deployment archives.
//!
//! A deployment archive is a ZIP file carrying a package manifest
//! (`META-INF/MANIFEST.MF`), a deployment descriptor (`META-INF/mtad.yaml`)
//! and arbitrary named module content. This crate pulls individual entries
//! out of such an archive safely:
//!
//! - single forward pass over the local headers, no central-directory
//!   pre-read and no whole-archive buffering
//! - a caller-supplied byte limit per retrieval, enforced on the actual
//!   decompressed byte count rather than the archive's (untrusted) metadata,
//!   defending against decompression bombs
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use mtarc::handler;
//!
//! let descriptor = handler::descriptor(File::open("app.mtar")?, 1024 * 1024)?;
//! println!("{descriptor}");
//!
//! let archive = File::open("app.mtar")?;
//! let content = handler::file_content(archive, "web/content.zip", 64 * 1024 * 1024)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bounded;
mod error;
pub mod handler;
pub mod zip;

#[cfg(test)]
mod testsupport;

pub use bounded::{BoundedReader, DefaultOverflow, LimitExceeded, OverflowHook};
pub use error::{Error, Result};
pub use handler::{EntryStream, DEPLOYMENT_DESCRIPTOR_NAME, MANIFEST_NAME};
pub use zip::{CompressionMethod, EntryHeader, EntryReader, ZipStream};

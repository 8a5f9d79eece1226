//! Error types for the mtarc crate.

use thiserror::Error;

/// Errors that can occur when extracting entries from a deployment archive.
///
/// Every failure kind is a distinct variant so that orchestration code can
/// decide per-kind handling: a missing entry may be non-fatal, while a size
/// violation always is.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading the archive stream.
    #[error("I/O error while reading archive: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncated fixed-size structure).
    #[error("{0}")]
    Common(#[from] mtarc_common::Error),

    /// Invalid ZIP magic bytes.
    #[error("invalid ZIP signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// Unsupported compression method on the requested entry.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// The requested entry is encrypted.
    #[error("entry is encrypted: {0}")]
    EncryptedEntry(String),

    /// The entry defers its sizes to a data descriptor but is stored
    /// uncompressed, so its end cannot be found in a forward-only pass.
    #[error("entry cannot be read from a non-seekable stream: {0}")]
    UnstreamableEntry(String),

    /// Entry not found after a full forward scan.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The entry's size exceeds the configured limit.
    ///
    /// `size` is the declared size when the metadata pre-check fires and the
    /// actually observed byte count when the streaming enforcement fires.
    #[error("size of entry {entry:?} is {size} bytes, exceeding the maximum of {limit}")]
    ContentSizeExceeded {
        entry: String,
        size: u64,
        limit: u64,
    },

    /// The manifest entry was found but could not be read.
    #[error("error retrieving archive manifest: {0}")]
    ManifestUnreadable(#[source] std::io::Error),

    /// A content entry was found but could not be read.
    #[error("error retrieving content of entry {entry:?}: {source}")]
    ContentUnreadable {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    /// The deployment descriptor is not valid UTF-8.
    #[error("deployment descriptor is not valid UTF-8: {0}")]
    DescriptorNotUtf8(#[from] std::string::FromUtf8Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Local File Header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Local File Header.
///
/// This structure precedes the actual file data of every entry. In a
/// forward-only pass it is the sole source of entry metadata; the central
/// directory at the end of the archive is never consulted.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LocalFileHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// File last modification time and date (DOS format)
    pub last_modified: u32,
    /// CRC-32 of uncompressed data
    pub crc32: u32,
    /// Compressed size (untrusted; 0 or u32::MAX when deferred)
    pub compressed_size: u32,
    /// Uncompressed size (untrusted; 0 or u32::MAX when deferred)
    pub uncompressed_size: u32,
    /// File name length
    pub file_name_length: u16,
    /// Extra field length
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Local File Header signature as u32 (PK\x03\x04).
    pub const SIGNATURE: u32 = 0x04034b50;

    /// Entry content is encrypted.
    pub const FLAG_ENCRYPTED: u16 = 1 << 0;

    /// CRC and sizes are zero here and follow the content in a data
    /// descriptor (set by streaming archive writers).
    pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

    /// Whether the entry content is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & Self::FLAG_ENCRYPTED != 0
    }

    /// Whether sizes are deferred to a trailing data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & Self::FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Data descriptor signature (PK\x07\x08).
///
/// The signature is optional in the format; descriptors may start directly
/// with the CRC field.
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// Central Directory File Header signature (PK\x01\x02).
///
/// Seeing this in entry position means the local headers are exhausted.
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// End of Central Directory signature (PK\x05\x06).
///
/// An empty archive starts directly with this record.
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;

/// Extra field ID for ZIP64 extended information.
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

//! ZIP format structures and the forward-only entry scanner.

mod local;
mod stream;

pub use local::{
    LocalFileHeader, CENTRAL_DIRECTORY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE, ZIP64_EXTRA_FIELD_ID,
};
pub use stream::{EntryHeader, EntryReader, ZipStream};

/// Compression methods supported for entry content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionMethod {
    /// No compression (stored).
    Store = 0,
    /// DEFLATE compression.
    Deflate = 8,
}

impl TryFrom<u16> for CompressionMethod {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Store),
            8 => Ok(Self::Deflate),
            other => Err(other),
        }
    }
}

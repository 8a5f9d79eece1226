//! Forward-only ZIP entry scanner.
//!
//! [`ZipStream`] walks an archive local header by local header in a single
//! pass, without reading the central directory first. This keeps memory flat
//! for arbitrarily large archives and preserves physical entry order, which
//! is what resolves duplicate names (first occurrence wins).

use std::io::{self, BufReader, Read};

use flate2::bufread::DeflateDecoder;
use mtarc_common::{BinaryReader, ReadExt};

use crate::zip::{
    CompressionMethod, LocalFileHeader, CENTRAL_DIRECTORY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE, ZIP64_EXTRA_FIELD_ID,
};
use crate::{Error, Result};

/// Metadata of one entry, parsed from its local header.
///
/// All sizes are untrusted archive claims; nothing here is relied on for
/// enforcement.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    /// Path within the archive, exactly as recorded.
    pub name: String,
    /// Raw compression method code.
    pub method: u16,
    /// Compressed size claim, ZIP64-resolved.
    pub compressed_size: u64,
    /// Uncompressed size claim, ZIP64-resolved.
    pub uncompressed_size: u64,
    flags: u16,
}

impl EntryHeader {
    /// Whether sizes are deferred to a trailing data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & LocalFileHeader::FLAG_DATA_DESCRIPTOR != 0
    }

    /// Whether the entry content is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & LocalFileHeader::FLAG_ENCRYPTED != 0
    }

    /// The self-reported uncompressed size, if the header carries one.
    ///
    /// Entries written by streaming archivers defer sizes to a data
    /// descriptor and declare nothing up front.
    pub fn declared_size(&self) -> Option<u64> {
        if self.has_data_descriptor() && self.uncompressed_size == 0 {
            None
        } else {
            Some(self.uncompressed_size)
        }
    }

    /// The compressed length of the entry content, if recorded.
    pub fn known_compressed_size(&self) -> Option<u64> {
        if self.has_data_descriptor() && self.compressed_size == 0 {
            None
        } else {
            Some(self.compressed_size)
        }
    }

    /// The compression method, if supported.
    pub fn compression(&self) -> Result<CompressionMethod> {
        CompressionMethod::try_from(self.method).map_err(Error::UnsupportedCompression)
    }
}

/// Decompressed content stream of a single matched entry.
///
/// Obtained from [`ZipStream::into_entry_reader`]; owns the archive source.
pub enum EntryReader<R: Read> {
    /// Stored entry with a known length; the source ending before that
    /// length is a truncation error, not a short success.
    Stored(io::Take<BufReader<R>>),
    /// DEFLATE entry with a known compressed length.
    Deflate(DeflateDecoder<io::Take<BufReader<R>>>),
    /// DEFLATE entry with sizes deferred to a data descriptor; the deflate
    /// stream finds its own end.
    DeflateToEnd(DeflateDecoder<BufReader<R>>),
}

impl<R: Read> Read for EntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryReader::Stored(inner) => {
                let n = inner.read(buf)?;
                if n == 0 && !buf.is_empty() && inner.limit() > 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("entry content truncated: {} bytes missing", inner.limit()),
                    ));
                }
                Ok(n)
            }
            EntryReader::Deflate(inner) => inner.read(buf),
            EntryReader::DeflateToEnd(inner) => inner.read(buf),
        }
    }
}

/// Forward-only scanner over the local headers of a ZIP stream.
///
/// A `ZipStream` owns its byte source exclusively for the duration of one
/// scan and cannot be rewound; each logical lookup opens a fresh scan.
///
/// # Example
///
/// ```no_run
/// use mtarc::ZipStream;
///
/// let file = std::fs::File::open("app.mtar")?;
/// let mut stream = ZipStream::new(file);
/// while let Some(entry) = stream.next_entry()? {
///     println!("{}: {} bytes", entry.name, entry.uncompressed_size);
///     stream.skip_entry(&entry)?;
/// }
/// # Ok::<(), mtarc::Error>(())
/// ```
pub struct ZipStream<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> ZipStream<R> {
    /// Open a scan over a byte source positioned at the start of an archive.
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Parse the next entry's local header.
    ///
    /// Returns `Ok(None)` once the central directory (or clean end of input)
    /// is reached. The stream is then positioned at the start of the entry's
    /// raw content; the caller must either [`skip_entry`](Self::skip_entry)
    /// or [`into_entry_reader`](Self::into_entry_reader) before asking for
    /// the next header.
    pub fn next_entry(&mut self) -> Result<Option<EntryHeader>> {
        let signature = match self.read_signature()? {
            Some(signature) => signature,
            None => return Ok(None),
        };

        match signature {
            LocalFileHeader::SIGNATURE => {}
            CENTRAL_DIRECTORY_SIGNATURE | END_OF_CENTRAL_DIRECTORY_SIGNATURE => {
                return Ok(None);
            }
            actual => {
                return Err(Error::InvalidSignature {
                    expected: LocalFileHeader::SIGNATURE,
                    actual,
                });
            }
        }

        let header: LocalFileHeader = self.reader.read_struct()?;
        let name_bytes = self.reader.read_vec(header.file_name_length as usize)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let extra = self.reader.read_vec(header.extra_field_length as usize)?;
        let (compressed_size, uncompressed_size) = resolve_sizes(&header, &extra)?;

        Ok(Some(EntryHeader {
            name,
            method: header.compression_method,
            compressed_size,
            uncompressed_size,
            flags: header.flags,
        }))
    }

    /// Advance past the content of the entry returned by the last
    /// [`next_entry`](Self::next_entry) call, without surfacing it.
    pub fn skip_entry(&mut self, entry: &EntryHeader) -> Result<()> {
        if let Some(compressed) = entry.known_compressed_size() {
            let copied = io::copy(&mut (&mut self.reader).take(compressed), &mut io::sink())?;
            if copied != compressed {
                return Err(Error::Common(mtarc_common::Error::UnexpectedEof {
                    needed: compressed as usize,
                    available: copied as usize,
                }));
            }
            if entry.has_data_descriptor() {
                self.skip_data_descriptor(compressed, entry.uncompressed_size)?;
            }
            return Ok(());
        }

        // No recorded length: only DEFLATE content can find its own end.
        match entry.compression()? {
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(&mut self.reader);
                let produced = io::copy(&mut decoder, &mut io::sink())?;
                let consumed = decoder.total_in();
                self.skip_data_descriptor(consumed, produced)
            }
            CompressionMethod::Store => Err(Error::UnstreamableEntry(entry.name.clone())),
        }
    }

    /// Consume the scan and return the decompressed content stream of the
    /// entry returned by the last [`next_entry`](Self::next_entry) call.
    pub fn into_entry_reader(self, entry: &EntryHeader) -> Result<EntryReader<R>> {
        if entry.is_encrypted() {
            return Err(Error::EncryptedEntry(entry.name.clone()));
        }

        match (entry.compression()?, entry.known_compressed_size()) {
            (CompressionMethod::Store, Some(n)) => Ok(EntryReader::Stored(self.reader.take(n))),
            (CompressionMethod::Store, None) => {
                Err(Error::UnstreamableEntry(entry.name.clone()))
            }
            (CompressionMethod::Deflate, Some(n)) => Ok(EntryReader::Deflate(
                DeflateDecoder::new(self.reader.take(n)),
            )),
            (CompressionMethod::Deflate, None) => {
                Ok(EntryReader::DeflateToEnd(DeflateDecoder::new(self.reader)))
            }
        }
    }

    /// Read a 4-byte record signature, mapping clean end-of-input to `None`.
    fn read_signature(&mut self) -> Result<Option<u32>> {
        let mut bytes = [0u8; 4];
        let mut filled = 0;
        while filled < bytes.len() {
            let n = self.reader.read(&mut bytes[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::Common(mtarc_common::Error::UnexpectedEof {
                    needed: bytes.len(),
                    available: filled,
                }));
            }
            filled += n;
        }
        Ok(Some(u32::from_le_bytes(bytes)))
    }

    /// Consume a data descriptor, cross-checking it against the byte counts
    /// actually seen for the entry.
    ///
    /// The descriptor's leading signature is optional, and its size fields
    /// are 4 bytes each for classic archives or 8 bytes each for ZIP64
    /// writers; the width is disambiguated against `consumed`/`produced`.
    fn skip_data_descriptor(&mut self, consumed: u64, produced: u64) -> Result<()> {
        let mut word = self.reader.read_u32_le().map_err(Error::Io)?;
        if word == DATA_DESCRIPTOR_SIGNATURE {
            word = self.reader.read_u32_le().map_err(Error::Io)?;
        }
        let _crc = word;

        let compressed_low = self.reader.read_u32_le().map_err(Error::Io)? as u64;
        if compressed_low != consumed & 0xFFFF_FFFF {
            return Err(descriptor_mismatch(consumed, compressed_low));
        }

        let next = self.reader.read_u32_le().map_err(Error::Io)? as u64;
        if next == produced & 0xFFFF_FFFF && consumed >> 32 == 0 {
            // Classic 4-byte descriptor.
            return Ok(());
        }

        // ZIP64 descriptor: the two words read so far are the halves of the
        // 8-byte compressed size; the 8-byte uncompressed size remains.
        let compressed = (next << 32) | compressed_low;
        let uncompressed = self.reader.read_u64_le().map_err(Error::Io)?;
        if compressed != consumed || uncompressed != produced {
            return Err(descriptor_mismatch(consumed, compressed));
        }
        Ok(())
    }
}

fn descriptor_mismatch(consumed: u64, recorded: u64) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "data descriptor does not match entry content: read {consumed} compressed bytes, descriptor records {recorded}"
        ),
    ))
}

/// Resolve the 32-bit size fields against a ZIP64 extended-information extra
/// field, if present.
fn resolve_sizes(header: &LocalFileHeader, extra: &[u8]) -> Result<(u64, u64)> {
    let compressed = header.compressed_size;
    let uncompressed = header.uncompressed_size;
    if compressed != u32::MAX && uncompressed != u32::MAX {
        return Ok((compressed as u64, uncompressed as u64));
    }

    let mut compressed = compressed as u64;
    let mut uncompressed = uncompressed as u64;
    let mut fields = BinaryReader::new(extra);
    while fields.remaining() >= 4 {
        let id = fields.read_u16()?;
        let size = fields.read_u16()?;
        if id == ZIP64_EXTRA_FIELD_ID {
            // In the local header the 64-bit uncompressed size comes first.
            if header.uncompressed_size == u32::MAX {
                uncompressed = fields.read_u64()?;
            }
            if header.compressed_size == u32::MAX {
                compressed = fields.read_u64()?;
            }
            break;
        }
        fields.advance(size as usize);
    }

    Ok((compressed, uncompressed))
}

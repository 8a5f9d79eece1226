//! Builder for byte-true test archives.
//!
//! Writes real local headers, entry content, a central directory and an EOCD
//! record, so the scanner is tested against the actual wire format, including
//! deliberately hostile archives (falsified declared sizes, streamed entries
//! with data descriptors).

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use crate::zip::{
    LocalFileHeader, CENTRAL_DIRECTORY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE, ZIP64_EXTRA_FIELD_ID,
};

const METHOD_STORE: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

pub struct ZipBuilder {
    buf: Vec<u8>,
    central: Vec<u8>,
    count: u16,
}

struct Entry<'a> {
    name: &'a str,
    method: u16,
    flags: u16,
    crc: u32,
    content: &'a [u8],
    /// True uncompressed length, for the central directory and descriptor.
    uncompressed: u32,
    /// (compressed, uncompressed) as recorded in the local header.
    lfh_sizes: (u32, u32),
    extra: Vec<u8>,
    descriptor: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            central: Vec::new(),
            count: 0,
        }
    }

    /// Append a stored (uncompressed) entry with truthful metadata.
    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        let len = data.len() as u32;
        self.push(Entry {
            name,
            method: METHOD_STORE,
            flags: 0,
            crc: crc32(data),
            content: data,
            uncompressed: len,
            lfh_sizes: (len, len),
            extra: Vec::new(),
            descriptor: false,
        })
    }

    /// Append a DEFLATE entry with truthful metadata.
    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let compressed = deflate(data);
        self.push(Entry {
            name,
            method: METHOD_DEFLATE,
            flags: 0,
            crc: crc32(data),
            content: &compressed,
            uncompressed: data.len() as u32,
            lfh_sizes: (compressed.len() as u32, data.len() as u32),
            extra: Vec::new(),
            descriptor: false,
        })
    }

    /// Append a DEFLATE entry whose declared uncompressed size is a lie.
    pub fn deflated_lying(self, name: &str, data: &[u8], declared: u32) -> Self {
        let compressed = deflate(data);
        self.push(Entry {
            name,
            method: METHOD_DEFLATE,
            flags: 0,
            crc: crc32(data),
            content: &compressed,
            uncompressed: data.len() as u32,
            lfh_sizes: (compressed.len() as u32, declared),
            extra: Vec::new(),
            descriptor: false,
        })
    }

    /// Append a DEFLATE entry in streaming-writer style: zero sizes in the
    /// local header, a data descriptor after the content.
    pub fn deflated_with_descriptor(self, name: &str, data: &[u8]) -> Self {
        let compressed = deflate(data);
        self.push(Entry {
            name,
            method: METHOD_DEFLATE,
            flags: LocalFileHeader::FLAG_DATA_DESCRIPTOR,
            crc: crc32(data),
            content: &compressed,
            uncompressed: data.len() as u32,
            lfh_sizes: (0, 0),
            extra: Vec::new(),
            descriptor: true,
        })
    }

    /// Append an entry with an arbitrary compression method code, content
    /// written as-is.
    pub fn with_method(self, name: &str, data: &[u8], method: u16) -> Self {
        let len = data.len() as u32;
        self.push(Entry {
            name,
            method,
            flags: 0,
            crc: crc32(data),
            content: data,
            uncompressed: len,
            lfh_sizes: (len, len),
            extra: Vec::new(),
            descriptor: false,
        })
    }

    /// Append a stored entry whose sizes live in a ZIP64 extra field.
    pub fn stored_zip64(self, name: &str, data: &[u8]) -> Self {
        let mut extra = Vec::new();
        extra.write_u16::<LittleEndian>(ZIP64_EXTRA_FIELD_ID).unwrap();
        extra.write_u16::<LittleEndian>(16).unwrap();
        extra.write_u64::<LittleEndian>(data.len() as u64).unwrap();
        extra.write_u64::<LittleEndian>(data.len() as u64).unwrap();
        self.push(Entry {
            name,
            method: METHOD_STORE,
            flags: 0,
            crc: crc32(data),
            content: data,
            uncompressed: data.len() as u32,
            lfh_sizes: (u32::MAX, u32::MAX),
            extra,
            descriptor: false,
        })
    }

    /// Append the central directory and EOCD record, yielding the archive.
    pub fn finish(mut self) -> Vec<u8> {
        let central_offset = self.buf.len() as u32;
        let central_size = self.central.len() as u32;
        self.buf.extend_from_slice(&self.central);

        let w = &mut self.buf;
        w.write_u32::<LittleEndian>(END_OF_CENTRAL_DIRECTORY_SIGNATURE)
            .unwrap();
        w.write_u16::<LittleEndian>(0).unwrap(); // disk number
        w.write_u16::<LittleEndian>(0).unwrap(); // central directory disk
        w.write_u16::<LittleEndian>(self.count).unwrap();
        w.write_u16::<LittleEndian>(self.count).unwrap();
        w.write_u32::<LittleEndian>(central_size).unwrap();
        w.write_u32::<LittleEndian>(central_offset).unwrap();
        w.write_u16::<LittleEndian>(0).unwrap(); // comment length

        self.buf
    }

    fn push(mut self, entry: Entry<'_>) -> Self {
        let offset = self.buf.len() as u32;

        let w = &mut self.buf;
        w.write_u32::<LittleEndian>(LocalFileHeader::SIGNATURE).unwrap();
        w.write_u16::<LittleEndian>(20).unwrap(); // version needed
        w.write_u16::<LittleEndian>(entry.flags).unwrap();
        w.write_u16::<LittleEndian>(entry.method).unwrap();
        w.write_u32::<LittleEndian>(0).unwrap(); // modification time/date
        if entry.descriptor {
            w.write_u32::<LittleEndian>(0).unwrap();
            w.write_u32::<LittleEndian>(0).unwrap();
            w.write_u32::<LittleEndian>(0).unwrap();
        } else {
            w.write_u32::<LittleEndian>(entry.crc).unwrap();
            w.write_u32::<LittleEndian>(entry.lfh_sizes.0).unwrap();
            w.write_u32::<LittleEndian>(entry.lfh_sizes.1).unwrap();
        }
        w.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        w.write_u16::<LittleEndian>(entry.extra.len() as u16).unwrap();
        w.extend_from_slice(entry.name.as_bytes());
        w.extend_from_slice(&entry.extra);
        w.extend_from_slice(entry.content);

        if entry.descriptor {
            w.write_u32::<LittleEndian>(DATA_DESCRIPTOR_SIGNATURE).unwrap();
            w.write_u32::<LittleEndian>(entry.crc).unwrap();
            w.write_u32::<LittleEndian>(entry.content.len() as u32).unwrap();
            w.write_u32::<LittleEndian>(entry.uncompressed).unwrap();
        }

        let c = &mut self.central;
        c.write_u32::<LittleEndian>(CENTRAL_DIRECTORY_SIGNATURE).unwrap();
        c.write_u16::<LittleEndian>(20).unwrap(); // version made by
        c.write_u16::<LittleEndian>(20).unwrap(); // version needed
        c.write_u16::<LittleEndian>(entry.flags).unwrap();
        c.write_u16::<LittleEndian>(entry.method).unwrap();
        c.write_u32::<LittleEndian>(0).unwrap(); // modification time/date
        c.write_u32::<LittleEndian>(entry.crc).unwrap();
        c.write_u32::<LittleEndian>(entry.content.len() as u32).unwrap();
        c.write_u32::<LittleEndian>(entry.uncompressed).unwrap();
        c.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        c.write_u16::<LittleEndian>(0).unwrap(); // extra length
        c.write_u16::<LittleEndian>(0).unwrap(); // comment length
        c.write_u16::<LittleEndian>(0).unwrap(); // disk number start
        c.write_u16::<LittleEndian>(0).unwrap(); // internal attributes
        c.write_u32::<LittleEndian>(0).unwrap(); // external attributes
        c.write_u32::<LittleEndian>(offset).unwrap();
        c.extend_from_slice(entry.name.as_bytes());

        self.count += 1;
        self
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

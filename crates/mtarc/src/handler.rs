//! Entry retrieval with hard size limits.
//!
//! These operations pull well-known (or caller-named) entries out of a
//! deployment archive in a single forward pass, never trusting the archive's
//! self-reported sizes: a cheap declared-size pre-check rejects obviously
//! oversized entries before any decompression work, and the returned stream
//! is wrapped in a [`BoundedReader`] that aborts the moment actual
//! decompressed bytes exceed the limit.
//!
//! Every call opens its own scan over a caller-supplied byte source and owns
//! it exclusively; nothing is cached between calls.

use std::io::{self, Read};

use crate::bounded::{BoundedReader, OverflowHook};
use crate::zip::{EntryReader, ZipStream};
use crate::{Error, Result};

/// Well-known path of the package manifest.
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

/// Well-known path of the deployment descriptor.
pub const DEPLOYMENT_DESCRIPTOR_NAME: &str = "META-INF/mtad.yaml";

/// Overflow strategy that names the entry whose content outgrew its limit.
#[derive(Debug, Clone)]
pub struct EntrySizeHook {
    entry: String,
}

impl OverflowHook for EntrySizeHook {
    fn overflow(&self, limit: u64, delivered: u64) -> io::Error {
        io::Error::other(Error::ContentSizeExceeded {
            entry: self.entry.clone(),
            size: delivered,
            limit,
        })
    }
}

/// Bounded decompressed content stream of one located entry.
pub type EntryStream<R> = BoundedReader<EntryReader<R>, EntrySizeHook>;

/// Locate `entry_name` in the archive and return its decompressed content,
/// capped at `limit` bytes.
///
/// Entries are compared in physical stream order with exact, case-sensitive
/// name equality; the first match wins and later duplicates are never
/// inspected. The archive byte source is consumed by the returned stream.
///
/// # Errors
///
/// [`Error::EntryNotFound`] if the scan exhausts the archive without a match,
/// [`Error::ContentSizeExceeded`] if the entry's declared size already
/// exceeds `limit` (reads of the returned stream raise the same error once
/// actual bytes do), and I/O or structure errors for unreadable archives.
pub fn open_entry<R: Read>(source: R, entry_name: &str, limit: u64) -> Result<EntryStream<R>> {
    let mut stream = ZipStream::new(source);
    loop {
        let header = match stream.next_entry()? {
            Some(header) => header,
            None => return Err(Error::EntryNotFound(entry_name.to_owned())),
        };

        if header.name != entry_name {
            stream.skip_entry(&header)?;
            continue;
        }

        // Quick, unreliable check against the declared size before spending
        // decompression work. Archives may lie here; the bounded reader
        // below is the enforcement that counts.
        if let Some(declared) = header.declared_size() {
            if declared > limit {
                return Err(Error::ContentSizeExceeded {
                    entry: header.name,
                    size: declared,
                    limit,
                });
            }
        }

        let hook = EntrySizeHook {
            entry: header.name.clone(),
        };
        let content = stream.into_entry_reader(&header)?;
        return Ok(BoundedReader::with_hook(content, limit, hook));
    }
}

/// Read the raw bytes of `META-INF/MANIFEST.MF`, capped at `limit`.
///
/// Size violations and a missing manifest propagate unchanged; any other
/// failure while draining the entry surfaces as
/// [`Error::ManifestUnreadable`].
pub fn manifest<R: Read>(source: R, limit: u64) -> Result<Vec<u8>> {
    let mut stream = open_entry(source, MANIFEST_NAME, limit)?;
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .map_err(|e| match e.downcast::<Error>() {
            Ok(domain) => domain,
            Err(other) => Error::ManifestUnreadable(other),
        })?;
    Ok(content)
}

/// Read `META-INF/mtad.yaml` as UTF-8 text, capped at `limit` bytes.
pub fn descriptor<R: Read>(source: R, limit: u64) -> Result<String> {
    let content = file_content(source, DEPLOYMENT_DESCRIPTOR_NAME, limit)?;
    Ok(String::from_utf8(content)?)
}

/// Read the raw bytes of an arbitrary named entry, capped at `limit`.
pub fn file_content<R: Read>(source: R, entry_name: &str, limit: u64) -> Result<Vec<u8>> {
    let mut stream = open_entry(source, entry_name, limit)?;
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .map_err(|e| match e.downcast::<Error>() {
            Ok(domain) => domain,
            Err(other) => Error::ContentUnreadable {
                entry: entry_name.to_owned(),
                source: other,
            },
        })?;
    Ok(content)
}

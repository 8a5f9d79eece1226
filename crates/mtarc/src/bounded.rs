//! Cap-enforcing reader wrapper.
//!
//! [`BoundedReader`] guarantees that no more than a fixed number of bytes is
//! ever observed by a downstream consumer, regardless of what the underlying
//! source would provide. It is the authoritative defense against entries
//! whose metadata under-reports their decompressed size.

use std::io::{self, Read};

use thiserror::Error;

/// Payload of the default overflow error.
///
/// Carried inside the `io::Error` raised when a [`BoundedReader`] trips, so
/// callers can recover the limit and the observed byte count.
#[derive(Debug, Error)]
#[error("read limit of {limit} bytes exceeded after {delivered} bytes")]
pub struct LimitExceeded {
    /// The configured cap.
    pub limit: u64,
    /// Bytes observed at the moment the cap tripped (greater than `limit`).
    pub delivered: u64,
}

/// Strategy for the error raised when the cap is exceeded.
///
/// The reader defines the detection; the composing context supplies the error
/// shape. Any `Fn(u64, u64) -> io::Error` closure works, `(limit, delivered)`.
pub trait OverflowHook {
    /// Build the error to raise for an overflow at `delivered` of `limit`.
    fn overflow(&self, limit: u64, delivered: u64) -> io::Error;
}

impl<F> OverflowHook for F
where
    F: Fn(u64, u64) -> io::Error,
{
    fn overflow(&self, limit: u64, delivered: u64) -> io::Error {
        self(limit, delivered)
    }
}

/// Default hook raising [`LimitExceeded`] wrapped in an `io::Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOverflow;

impl OverflowHook for DefaultOverflow {
    fn overflow(&self, limit: u64, delivered: u64) -> io::Error {
        io::Error::other(LimitExceeded { limit, delivered })
    }
}

/// A reader that delivers at most `limit` bytes from its underlying source.
///
/// The running total is checked before any bytes are handed to the caller: a
/// read that would push the total above the limit fails instead of returning
/// the bytes, and the reader stays in that failed state for all subsequent
/// reads. End-of-source at or under the limit is a normal completion.
///
/// Dropping the bounded reader drops the underlying source.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use mtarc::BoundedReader;
///
/// let mut reader = BoundedReader::new(&b"hello"[..], 16);
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).unwrap();
/// assert_eq!(out, b"hello");
///
/// let mut reader = BoundedReader::new(&b"hello"[..], 4);
/// assert!(reader.read_to_end(&mut Vec::new()).is_err());
/// ```
#[derive(Debug)]
pub struct BoundedReader<R, H = DefaultOverflow> {
    inner: R,
    limit: u64,
    delivered: u64,
    tripped: bool,
    hook: H,
}

impl<R: Read> BoundedReader<R> {
    /// Wrap `inner`, delivering at most `limit` bytes.
    pub fn new(inner: R, limit: u64) -> Self {
        Self::with_hook(inner, limit, DefaultOverflow)
    }
}

impl<R: Read, H: OverflowHook> BoundedReader<R, H> {
    /// Wrap `inner` with a caller-supplied overflow error strategy.
    pub fn with_hook(inner: R, limit: u64, hook: H) -> Self {
        Self {
            inner,
            limit,
            delivered: 0,
            tripped: false,
            hook,
        }
    }

    /// The configured cap.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Bytes delivered to the caller so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, H: OverflowHook> Read for BoundedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.tripped {
            return Err(self.hook.overflow(self.limit, self.delivered));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.inner.read(buf)?;
        let total = self.delivered + n as u64;
        if total > self.limit {
            // The over-limit bytes are already consumed from the source but
            // are never reported to the caller.
            self.tripped = true;
            self.delivered = total;
            return Err(self.hook.overflow(self.limit, total));
        }

        self.delivered = total;
        Ok(n)
    }
}

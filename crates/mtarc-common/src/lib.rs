//! Common utilities for mtarc.
//!
//! This crate provides the foundational reading primitives used by the
//! archive crates:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`ReadExt`] - Reading fixed-size structures from `io::Read` streams

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

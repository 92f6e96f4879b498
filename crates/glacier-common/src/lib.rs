//! Common utilities for the Glacier TEX crates.
//!
//! This crate provides the foundational pieces shared by the codec, DDS and
//! container crates:
//!
//! - [`BinaryReader`] - bounds-checked little-endian reading from byte slices
//! - [`text`] - archive-local (Latin-1) string decoding and tag helpers

mod error;
mod reader;

pub mod text;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

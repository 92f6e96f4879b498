//! Error types for glacier-common.

use thiserror::Error;

/// Common error type for binary reading.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer at {offset:#x}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A seek target lies outside the buffer.
    #[error("offset {offset:#x} lies outside the buffer (length {len:#x})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// Missing null terminator in string.
    #[error("string at {0:#x} missing null terminator")]
    MissingNullTerminator(usize),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

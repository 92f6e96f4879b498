//! Error types for DDS parsing.

use thiserror::Error;

use crate::header::{DdsVariant, FourCC};

/// Result type alias for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading or writing DDS files.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Common error: {0}")]
    Common(#[from] glacier_common::Error),

    #[error("Pixel error: {0}")]
    Pixel(#[from] glacier_pixel::Error),

    #[error("Invalid DDS magic: expected 'DDS ', got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("Invalid DDS header size: {0} (expected 124)")]
    InvalidHeaderSize(u32),

    #[error("Header rejected for {variant:?}: {source}")]
    Validation {
        variant: DdsVariant,
        #[source]
        source: ValidationError,
    },

    #[error("Truncated payload: level {level} needs {needed} bytes, {available} available")]
    TruncatedPayload {
        level: usize,
        needed: usize,
        available: usize,
    },

    #[error("{0} mip levels declared (at most 32)")]
    TooManyLevels(u32),

    #[error("Surface has no levels")]
    EmptySurface,

    #[error("Dimension {0} does not fit in a DDS header")]
    DimensionOverflow(usize),
}

/// A single failed header check. Checks run in declaration order and the
/// first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("header flags {actual:#x} lack required {required:#x}")]
    HeaderFlags { required: u32, actual: u32 },

    #[error("{0} levels declared without the MIPMAPCOUNT flag")]
    MissingMipmapCountFlag(u32),

    #[error("pixel format size {0} (expected 32)")]
    PixelFormatSize(u32),

    #[error("pixel format flags {actual:#x} do not match {expected:#x}")]
    PixelFormatFlags { expected: u32, actual: u32 },

    #[error("{actual} bits per pixel (expected {expected})")]
    BitCount { expected: u32, actual: u32 },

    #[error("channel masks {actual:08x?} (expected {expected:08x?})")]
    ChannelMasks { expected: [u32; 4], actual: [u32; 4] },

    #[error("compression {actual} (expected {expected})")]
    FourCC { expected: FourCC, actual: FourCC },

    #[error("caps {actual:#x} (expected {expected:#x})")]
    Caps { expected: u32, actual: u32 },
}

//! Error types for pixel conversion.

use thiserror::Error;

use crate::PixelFormat;

/// Errors that can occur while converting pixel data.
#[derive(Debug, Error)]
pub enum Error {
    /// Input buffer is shorter than the dimensions require.
    #[error("pixel buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// Operation requires a block-compressed format.
    #[error("{0:?} is not a block-compressed format")]
    NotBlockCompressed(PixelFormat),

    /// Surface dimensions whose byte size does not fit in memory.
    #[error("{width}x{height} {format:?} surface size overflows")]
    SizeOverflow {
        format: PixelFormat,
        width: u32,
        height: u32,
    },

    /// Palette index has no matching palette entry.
    #[error("palette index {index} out of range for palette of {palette_len} colors")]
    IndexOutOfRange { index: u8, palette_len: usize },

    /// Source has more distinct colors than a byte index can address.
    #[error("{0} distinct colors cannot be addressed by 8-bit palette indices (max 256)")]
    TooManyColors(usize),

    /// Source pixel does not appear in a fixed palette.
    #[error("pixel {pixel} has color {color:02X?} which is not in the palette")]
    ColorNotInPalette { pixel: usize, color: [u8; 4] },
}

/// Result type for pixel operations.
pub type Result<T> = std::result::Result<T, Error>;

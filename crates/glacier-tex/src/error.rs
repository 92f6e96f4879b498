//! Error types for TEX archives and texture operations.

use std::fmt;

use thiserror::Error;

use crate::entry::TypeTag;

/// Result type for TEX operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with TEX archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Truncated or out-of-bounds read.
    #[error("{0}")]
    Common(#[from] glacier_common::Error),

    /// Pixel conversion failure.
    #[error("{0}")]
    Pixel(#[from] glacier_pixel::Error),

    /// DDS read, validation or write failure.
    #[error("{0}")]
    Dds(#[from] glacier_dds::Error),

    /// Raster decode or encode failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Manifest serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table offset points outside the archive.
    #[error("offset {offset:#x} lies outside the archive ({len} bytes)")]
    OffsetOutOfBounds { offset: u32, len: usize },

    /// A declared mip level runs past the end of the archive.
    #[error("entry at {entry_offset:#x}: level {level} declares {size} bytes, {available} available")]
    LevelOverrun {
        entry_offset: u32,
        level: usize,
        size: i64,
        available: usize,
    },

    /// A declared count is negative.
    #[error("negative {what} count {count} at {offset:#x}")]
    NegativeCount {
        what: &'static str,
        count: i32,
        offset: usize,
    },

    /// The entry's type tag has no pixel semantics.
    #[error("unknown texture format {0}")]
    UnknownFormat(TypeTag),

    /// A palette entry has no palette.
    #[error("entry {0} is indexed but has no palette")]
    MissingPalette(u32),

    /// No entry carries the requested logical index.
    #[error("no entry with index {0}")]
    EntryNotFound(u32),

    /// Requested mip level does not exist.
    #[error("entry {index} has {mip_count} levels, level {level} requested")]
    LevelOutOfRange {
        index: u32,
        level: usize,
        mip_count: usize,
    },

    /// The target or source path has an extension no codec handles.
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    /// Dimensions exceed what the record or target format can hold.
    #[error("dimensions {width}x{height} exceed the {limit} limit")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        limit: &'static str,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or truncated archive, header or asset.
    Format,
    /// Well-formed input that does not match what the operation requires.
    Validation,
    /// A logical index, mip level or palette index that does not exist.
    IndexOutOfRange,
    /// Underlying storage failure.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Format => "format error",
            Self::Validation => "validation error",
            Self::IndexOutOfRange => "index out of range",
            Self::Io => "I/O error",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Common(_)
            | Self::OffsetOutOfBounds { .. }
            | Self::LevelOverrun { .. }
            | Self::NegativeCount { .. }
            | Self::UnknownFormat(_)
            | Self::MissingPalette(_)
            | Self::Json(_) => ErrorKind::Format,
            Self::Pixel(e) => match e {
                glacier_pixel::Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
                glacier_pixel::Error::TooManyColors(_)
                | glacier_pixel::Error::ColorNotInPalette { .. } => ErrorKind::Validation,
                _ => ErrorKind::Format,
            },
            Self::Dds(e) => match e {
                glacier_dds::Error::Io(_) => ErrorKind::Io,
                glacier_dds::Error::Validation { .. } => ErrorKind::Validation,
                _ => ErrorKind::Format,
            },
            Self::Image(e) => match e {
                image::ImageError::IoError(_) => ErrorKind::Io,
                _ => ErrorKind::Format,
            },
            Self::EntryNotFound(_) | Self::LevelOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::UnsupportedExtension(_) | Self::DimensionsTooLarge { .. } => {
                ErrorKind::Validation
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::EntryNotFound(3).kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(
            Error::OffsetOutOfBounds { offset: 9, len: 4 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(
            Error::from(glacier_dds::Error::InvalidMagic(*b"XXXX")).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            Error::from(glacier_pixel::Error::IndexOutOfRange {
                index: 20,
                palette_len: 16
            })
            .kind(),
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).kind(),
            ErrorKind::Io
        );
    }
}

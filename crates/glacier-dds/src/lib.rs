//! DDS interchange for Glacier TEX textures.
//!
//! TEX payloads are exported to and imported from DirectDraw Surface files
//! in exactly four layouts: DXT1, DXT3, uncompressed `A8R8G8B8` and `L8`
//! luminance. This crate writes those headers and validates incoming ones
//! against the layout an import expects, check by check, before any payload
//! byte is trusted.
//!
//! # Example
//!
//! ```
//! use glacier_dds::{decode_and_validate, encode, DdsSurface, DdsVariant};
//!
//! let surface = DdsSurface {
//!     width: 4,
//!     height: 4,
//!     levels: vec![vec![0u8; 8]],
//! };
//!
//! let mut file = Vec::new();
//! encode(&mut file, &surface, DdsVariant::Dxt1)?;
//!
//! let decoded = decode_and_validate(&mut file.as_slice(), DdsVariant::Dxt1)?;
//! assert_eq!(decoded, surface);
//! # Ok::<(), glacier_dds::Error>(())
//! ```

mod codec;
mod error;
mod header;

pub use codec::{
    decode_and_validate, encode, read_header, validate_header, DdsSurface, MAX_LEVELS,
};
pub use error::{Error, Result, ValidationError};
pub use header::{caps, flags, pixel_flags, DdsHeader, DdsPixelFormat, DdsVariant, FourCC};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";

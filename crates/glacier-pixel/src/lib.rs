//! Pixel codecs for Glacier TEX textures.
//!
//! Every texture payload in a TEX archive is one of a handful of raw
//! encodings. This crate converts between those encodings and a 4-byte
//! per pixel working buffer:
//!
//! - [`format`] - per-format byte sizes and the archive's mip-chain size rule
//! - [`block`] - DXT1 / DXT3 4x4 block decoding and encoding
//! - [`channel`] - channel-order swaps, dual-channel expansion, row flips
//! - [`palette`] - exact-match palette quantization and its inverse
//!
//! All functions are pure and run on the caller's thread.
//!
//! # Example
//!
//! ```
//! use glacier_pixel::{mip_chain_sizes, PixelFormat};
//!
//! let sizes = mip_chain_sizes(PixelFormat::Dxt1, 256, 256, 8).unwrap();
//! assert_eq!(sizes, [32768, 8192, 2048, 512, 128, 32, 8, 8]);
//! ```

mod error;

pub mod block;
pub mod channel;
pub mod format;
pub mod palette;

pub use block::{decode_block_compressed, encode_block_compressed};
pub use channel::{channel_swap, color_to_dual_channel, dual_channel_to_color, ChannelOrder};
pub use error::{Error, Result};
pub use format::{
    block_compressed_size, level0_size, level_dimensions, mip_chain_sizes, mip_count_for,
    PixelFormat,
};
pub use palette::{
    expand, grayscale_palette, map_to_palette, map_to_palette_lossy, quantize, Color, Palette,
};

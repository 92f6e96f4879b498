//! Pixel formats and payload size arithmetic.

use crate::{Error, Result};

/// Raw pixel encodings stored in TEX payloads and DDS files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// DXT1 / BC1: opaque 4-color blocks, 8 bytes per 4x4 block.
    Dxt1,
    /// DXT3 / BC2: explicit 4-bit alpha blocks, 16 bytes per 4x4 block.
    Dxt3,
    /// 4 bytes per pixel color.
    Rgba8,
    /// 1 byte palette index per pixel.
    Indexed8,
    /// 1 byte luminance per pixel.
    Luminance8,
    /// 2 bytes per pixel: two independent 8-bit channels.
    Uv88,
}

impl PixelFormat {
    /// Bytes per 4x4 block, for block-compressed formats.
    #[inline]
    pub const fn block_bytes(self) -> Option<usize> {
        match self {
            Self::Dxt1 => Some(8),
            Self::Dxt3 => Some(16),
            _ => None,
        }
    }

    /// Check if this is a 4x4 block-compressed format.
    #[inline]
    pub const fn is_block_compressed(self) -> bool {
        self.block_bytes().is_some()
    }

    /// Bytes per pixel for linear formats; zero for block formats.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Dxt1 | Self::Dxt3 => 0,
            Self::Indexed8 | Self::Luminance8 => 1,
            Self::Uv88 => 2,
            Self::Rgba8 => 4,
        }
    }
}

/// Calculate the size in bytes of a block-compressed surface, `None` on
/// overflow.
pub fn mipmap_size(width: u32, height: u32, block_size: usize) -> Option<usize> {
    let blocks_x = (width as usize).div_ceil(4).max(1);
    let blocks_y = (height as usize).div_ceil(4).max(1);
    blocks_x.checked_mul(blocks_y)?.checked_mul(block_size)
}

/// Size in bytes of a block-compressed surface.
pub fn block_compressed_size(format: PixelFormat, width: u32, height: u32) -> Result<usize> {
    let block_size = format
        .block_bytes()
        .ok_or(Error::NotBlockCompressed(format))?;
    mipmap_size(width, height, block_size).ok_or(Error::SizeOverflow {
        format,
        width,
        height,
    })
}

/// Size in bytes of the full-resolution level of a surface.
pub fn level0_size(format: PixelFormat, width: u32, height: u32) -> Result<usize> {
    if format.is_block_compressed() {
        return block_compressed_size(format, width, height);
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(format.bytes_per_pixel()))
        .ok_or(Error::SizeOverflow {
            format,
            width,
            height,
        })
}

/// Level sizes of a mip chain the way TEX archives record them.
///
/// Each level is a quarter of the previous one. Block-compressed chains stop
/// shrinking as soon as a level would reach the block size; that level and
/// every later one are clamped to exactly one block.
pub fn mip_chain_sizes(
    format: PixelFormat,
    width: u32,
    height: u32,
    count: usize,
) -> Result<Vec<usize>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut size = level0_size(format, width, height)?;
    let mut sizes = Vec::with_capacity(count.min(32));
    sizes.push(size);

    for _ in 1..count {
        size = match format.block_bytes() {
            Some(floor) if size / 4 <= floor => floor,
            _ => size / 4,
        };
        sizes.push(size);
    }

    Ok(sizes)
}

/// Number of mip levels generated for a raster import.
///
/// Counts halvings while both dimensions are above one, so a 256x256 image
/// yields 8 levels (256 down to 2).
pub fn mip_count_for(width: u32, height: u32) -> usize {
    let (mut w, mut h) = (width, height);
    let mut count = 0;
    while w > 1 && h > 1 {
        w /= 2;
        h /= 2;
        count += 1;
    }
    count.max(1)
}

/// Dimensions of a given mip level.
#[inline]
pub fn level_dimensions(width: u32, height: u32, level: usize) -> (u32, u32) {
    let shift = level.min(31) as u32;
    ((width >> shift).max(1), (height >> shift).max(1))
}

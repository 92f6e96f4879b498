//! DXT1 / DXT3 block compression.
//!
//! Decoding follows the standard BC1/BC2 rules: two RGB565 endpoints and
//! 2-bit indices per pixel, with DXT3 adding 4 bits of explicit alpha per
//! pixel in front of an always-opaque color block. Output pixels are RGBA.
//!
//! Encoding uses bounding-box endpoints per block. It exists so raster
//! images can be imported into DXT entries; quality is adequate for that but
//! it is not a production compressor.

use crate::{Error, PixelFormat, Result};

/// Decode a block-compressed surface into an RGBA buffer.
pub fn decode_block_compressed(
    format: PixelFormat,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let block_size = format
        .block_bytes()
        .ok_or(Error::NotBlockCompressed(format))?;

    let blocks_x = width.div_ceil(4).max(1);
    let blocks_y = height.div_ceil(4).max(1);
    let expected = blocks_x as usize * blocks_y as usize * block_size;
    if data.len() < expected {
        return Err(Error::BufferTooSmall {
            expected,
            actual: data.len(),
        });
    }

    let mut out = vec![0u8; width as usize * height as usize * 4];
    let mut blocks = data.chunks_exact(block_size);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let Some(block) = blocks.next() else {
                break;
            };
            let pixels = match format {
                PixelFormat::Dxt1 => decode_bc1_block(block),
                _ => decode_bc2_block(block),
            };
            write_block(&mut out, width, height, bx * 4, by * 4, &pixels);
        }
    }

    Ok(out)
}

/// Encode an RGBA buffer into a block-compressed surface.
pub fn encode_block_compressed(
    format: PixelFormat,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let block_size = format
        .block_bytes()
        .ok_or(Error::NotBlockCompressed(format))?;

    let expected = width as usize * height as usize * 4;
    if rgba.len() < expected || width == 0 || height == 0 {
        return Err(Error::BufferTooSmall {
            expected,
            actual: rgba.len(),
        });
    }

    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut out = Vec::with_capacity(blocks_x as usize * blocks_y as usize * block_size);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let pixels = read_block(rgba, width, height, bx * 4, by * 4);
            match format {
                PixelFormat::Dxt1 => out.extend_from_slice(&encode_bc1_block(&pixels)),
                _ => out.extend_from_slice(&encode_bc2_block(&pixels)),
            }
        }
    }

    Ok(out)
}

fn rgb565_to_rgb888(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1f) as u8;
    let g6 = ((c >> 5) & 0x3f) as u8;
    let b5 = (c & 0x1f) as u8;

    // replicate top bits into the low bits
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

fn rgb888_to_rgb565(rgb: [u8; 3]) -> u16 {
    let r = u16::from(rgb[0]) * 31 / 255;
    let g = u16::from(rgb[1]) * 63 / 255;
    let b = u16::from(rgb[2]) * 31 / 255;
    (r << 11) | (g << 5) | b
}

fn lerp(a: u8, b: u8, num: u32, den: u32) -> u8 {
    ((u32::from(a) * (den - num) + u32::from(b) * num) / den) as u8
}

fn mix(c0: [u8; 3], c1: [u8; 3], num: u32, den: u32) -> [u8; 4] {
    [
        lerp(c0[0], c1[0], num, den),
        lerp(c0[1], c1[1], num, den),
        lerp(c0[2], c1[2], num, den),
        255,
    ]
}

/// Color palette of a block. `four_color` forces the opaque 4-color mode,
/// which DXT3 always uses regardless of endpoint order.
fn color_palette(color0: u16, color1: u16, four_color: bool) -> [[u8; 4]; 4] {
    let c0 = rgb565_to_rgb888(color0);
    let c1 = rgb565_to_rgb888(color1);
    let p0 = [c0[0], c0[1], c0[2], 255];
    let p1 = [c1[0], c1[1], c1[2], 255];

    if four_color || color0 > color1 {
        [p0, p1, mix(c0, c1, 1, 3), mix(c0, c1, 2, 3)]
    } else {
        [p0, p1, mix(c0, c1, 1, 2), [0, 0, 0, 0]]
    }
}

fn decode_color_block(block: &[u8], four_color: bool) -> [[u8; 4]; 16] {
    let color0 = u16::from_le_bytes([block[0], block[1]]);
    let color1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let palette = color_palette(color0, color1, four_color);

    let mut pixels = [[0u8; 4]; 16];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = palette[((indices >> (2 * i)) & 0b11) as usize];
    }
    pixels
}

fn decode_bc1_block(block: &[u8]) -> [[u8; 4]; 16] {
    decode_color_block(block, false)
}

fn decode_bc2_block(block: &[u8]) -> [[u8; 4]; 16] {
    let alpha_bits = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    let mut pixels = decode_color_block(&block[8..16], true);
    for (i, pixel) in pixels.iter_mut().enumerate() {
        pixel[3] = ((alpha_bits >> (4 * i)) & 0xF) as u8 * 17;
    }
    pixels
}

fn write_block(out: &mut [u8], width: u32, height: u32, x0: u32, y0: u32, pixels: &[[u8; 4]; 16]) {
    for (i, rgba) in pixels.iter().enumerate() {
        let px = x0 + (i as u32 % 4);
        let py = y0 + (i as u32 / 4);
        if px < width && py < height {
            let idx = (py as usize * width as usize + px as usize) * 4;
            out[idx..idx + 4].copy_from_slice(rgba);
        }
    }
}

/// Gather a 4x4 block, repeating edge pixels past the surface border.
fn read_block(rgba: &[u8], width: u32, height: u32, x0: u32, y0: u32) -> [[u8; 4]; 16] {
    let mut pixels = [[0u8; 4]; 16];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        let px = (x0 + i as u32 % 4).min(width - 1);
        let py = (y0 + i as u32 / 4).min(height - 1);
        let idx = (py as usize * width as usize + px as usize) * 4;
        pixel.copy_from_slice(&rgba[idx..idx + 4]);
    }
    pixels
}

fn distance(a: [u8; 4], b: [u8; 4]) -> u32 {
    (0..3)
        .map(|c| {
            let d = i32::from(a[c]) - i32::from(b[c]);
            (d * d) as u32
        })
        .sum()
}

fn bounding_endpoints(pixels: &[[u8; 4]]) -> (u16, u16) {
    let mut min = [255u8; 3];
    let mut max = [0u8; 3];
    for pixel in pixels {
        for c in 0..3 {
            min[c] = min[c].min(pixel[c]);
            max[c] = max[c].max(pixel[c]);
        }
    }
    (rgb888_to_rgb565(max), rgb888_to_rgb565(min))
}

fn pack_color_block(color0: u16, color1: u16, indices: u32) -> [u8; 8] {
    let mut block = [0u8; 8];
    block[0..2].copy_from_slice(&color0.to_le_bytes());
    block[2..4].copy_from_slice(&color1.to_le_bytes());
    block[4..8].copy_from_slice(&indices.to_le_bytes());
    block
}

fn nearest_indices(pixels: &[[u8; 4]; 16], palette: &[[u8; 4]], skip_transparent: bool) -> u32 {
    let mut indices = 0u32;
    for (i, pixel) in pixels.iter().enumerate() {
        let index = if skip_transparent && pixel[3] < 128 {
            3
        } else {
            palette
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| distance(*pixel, **entry))
                .map_or(0, |(j, _)| j as u32)
        };
        indices |= index << (2 * i);
    }
    indices
}

fn encode_bc1_block(pixels: &[[u8; 4]; 16]) -> [u8; 8] {
    let has_transparency = pixels.iter().any(|p| p[3] < 128);
    let opaque: Vec<[u8; 4]> = pixels.iter().copied().filter(|p| p[3] >= 128).collect();

    if opaque.is_empty() {
        // fully transparent block: 3-color mode, every index points at slot 3
        return pack_color_block(0, 0, u32::MAX);
    }

    let (mut color0, mut color1) = bounding_endpoints(&opaque);

    if has_transparency {
        // 3-color mode requires color0 <= color1
        if color0 > color1 {
            std::mem::swap(&mut color0, &mut color1);
        }
        let palette = color_palette(color0, color1, false);
        let indices = nearest_indices(pixels, &palette[..3], true);
        pack_color_block(color0, color1, indices)
    } else {
        if color0 < color1 {
            std::mem::swap(&mut color0, &mut color1);
        }
        if color0 == color1 {
            return pack_color_block(color0, color1, 0);
        }
        let palette = color_palette(color0, color1, true);
        let indices = nearest_indices(pixels, &palette, false);
        pack_color_block(color0, color1, indices)
    }
}

fn encode_bc2_block(pixels: &[[u8; 4]; 16]) -> [u8; 16] {
    let mut alpha_bits = 0u64;
    for (i, pixel) in pixels.iter().enumerate() {
        alpha_bits |= u64::from(pixel[3] >> 4) << (4 * i);
    }

    let (mut color0, mut color1) = bounding_endpoints(pixels);
    if color0 < color1 {
        std::mem::swap(&mut color0, &mut color1);
    }
    let palette = color_palette(color0, color1, true);
    let indices = nearest_indices(pixels, &palette, false);

    let mut block = [0u8; 16];
    block[0..8].copy_from_slice(&alpha_bits.to_le_bytes());
    block[8..16].copy_from_slice(&pack_color_block(color0, color1, indices));
    block
}

//! Channel-order conversions and row flips.

use crate::{Error, Result};

/// Byte order of a 4-byte color pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Red, green, blue, alpha.
    Rgba,
    /// Blue, green, red, alpha (D3D `A8R8G8B8` in memory).
    Bgra,
}

/// Swap channels 0 and 2 of every pixel in place (RGBA <-> BGRA).
///
/// Only the first `width * height` pixels are touched.
pub fn channel_swap(buffer: &mut [u8], width: u32, height: u32) {
    let pixels = width as usize * height as usize;
    for pixel in buffer.chunks_exact_mut(4).take(pixels) {
        pixel.swap(0, 2);
    }
}

/// Expand 2-byte (U, V) pixels to 4-byte color pixels.
///
/// The two orders are separate fixed mappings:
/// - `Rgba`: `[U, V, 0xFF, 0xFF]`
/// - `Bgra`: `[0xFF, V, U, 0xFF]`
pub fn dual_channel_to_color(data: &[u8], order: ChannelOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for uv in data.chunks_exact(2) {
        let (u, v) = (uv[0], uv[1]);
        match order {
            ChannelOrder::Rgba => out.extend_from_slice(&[u, v, 0xFF, 0xFF]),
            ChannelOrder::Bgra => out.extend_from_slice(&[0xFF, v, u, 0xFF]),
        }
    }
    out
}

/// Collapse 4-byte color pixels back to (U, V) pairs.
///
/// U is read from the red channel and V from green, wherever the order
/// places them.
pub fn color_to_dual_channel(data: &[u8], order: ChannelOrder) -> Vec<u8> {
    let red = match order {
        ChannelOrder::Rgba => 0,
        ChannelOrder::Bgra => 2,
    };
    let mut out = Vec::with_capacity(data.len() / 2);
    for pixel in data.chunks_exact(4) {
        out.push(pixel[red]);
        out.push(pixel[1]);
    }
    out
}

/// Reverse the row order of a 4-byte per pixel surface.
pub fn flip_vertical_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    flip_rows(data, width as usize * 4, height as usize)
}

/// Reverse the row order of a 1-byte per pixel surface.
pub fn flip_vertical_luminance(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    flip_rows(data, width as usize, height as usize)
}

fn flip_rows(data: &[u8], row_bytes: usize, rows: usize) -> Result<Vec<u8>> {
    let expected = row_bytes * rows;
    if data.len() < expected {
        return Err(Error::BufferTooSmall {
            expected,
            actual: data.len(),
        });
    }
    if row_bytes == 0 {
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(expected);
    for row in data[..expected].chunks_exact(row_bytes).rev() {
        out.extend_from_slice(row);
    }
    Ok(out)
}

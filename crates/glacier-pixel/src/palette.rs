//! Exact-match palette quantization.
//!
//! Indexed TEX entries carry a per-pixel byte index and an inline table of
//! 4-byte colors. The quantizer never approximates: every source color must
//! land in the palette unchanged.

use std::collections::{HashMap, HashSet};

use crate::{Error, Result};

/// A 4-byte color in whatever channel order the surrounding buffer uses.
pub type Color = [u8; 4];

/// Palettes are padded to at least this many entries.
pub const MIN_PALETTE_LEN: usize = 16;

/// Byte indices address at most this many entries.
pub const MAX_PALETTE_LEN: usize = 256;

/// Color used to pad short palettes (opaque white).
const PAD_COLOR: Color = [0xFF; 4];

/// An ordered color table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Create a palette from colors.
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    /// Build a palette from packed 4-byte entries. Trailing partial entries
    /// are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let colors = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Self { colors }
    }

    /// Pack the palette into 4-byte entries.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the palette has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get the entries.
    #[inline]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Index of the first entry equal to `color`.
    pub fn position(&self, color: Color) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }
}

/// Build an indexed surface and palette from a 4-byte per pixel buffer.
///
/// Distinct colors are collected in first-occurrence order, stably sorted
/// by alpha (byte 3) ascending and padded with opaque white up to
/// [`MIN_PALETTE_LEN`]. Each pixel maps to the first equal palette entry.
///
/// More than [`MAX_PALETTE_LEN`] distinct colors cannot be represented and
/// fails with [`Error::TooManyColors`].
pub fn quantize(buffer: &[u8]) -> Result<(Vec<u8>, Palette)> {
    let mut seen = HashSet::new();
    let mut colors: Vec<Color> = Vec::new();

    for pixel in buffer.chunks_exact(4) {
        let color = [pixel[0], pixel[1], pixel[2], pixel[3]];
        if seen.insert(color) {
            colors.push(color);
        }
    }

    if colors.len() > MAX_PALETTE_LEN {
        return Err(Error::TooManyColors(colors.len()));
    }

    colors.sort_by_key(|c| c[3]);
    if colors.len() < MIN_PALETTE_LEN {
        colors.resize(MIN_PALETTE_LEN, PAD_COLOR);
    }

    let palette = Palette::new(colors);
    let indices = map_to_palette(buffer, &palette)?;
    Ok((indices, palette))
}

/// Map every pixel of a 4-byte per pixel buffer to the first equal entry of
/// a fixed palette.
pub fn map_to_palette(buffer: &[u8], palette: &Palette) -> Result<Vec<u8>> {
    let lookup = index_lookup(palette);
    buffer
        .chunks_exact(4)
        .enumerate()
        .map(|(pixel, c)| {
            let color = [c[0], c[1], c[2], c[3]];
            lookup
                .get(&color)
                .copied()
                .ok_or(Error::ColorNotInPalette { pixel, color })
        })
        .collect()
}

/// Like [`map_to_palette`], but pixels with no equal entry take index 0.
///
/// Returns the indices and how many pixels fell back.
pub fn map_to_palette_lossy(buffer: &[u8], palette: &Palette) -> (Vec<u8>, usize) {
    let lookup = index_lookup(palette);
    let mut misses = 0;
    let indices = buffer
        .chunks_exact(4)
        .map(|c| {
            lookup.get(&[c[0], c[1], c[2], c[3]]).copied().unwrap_or_else(|| {
                misses += 1;
                0
            })
        })
        .collect();
    (indices, misses)
}

fn index_lookup(palette: &Palette) -> HashMap<Color, u8> {
    let mut lookup = HashMap::with_capacity(palette.len());
    for (i, &color) in palette.colors().iter().enumerate().take(MAX_PALETTE_LEN) {
        lookup.entry(color).or_insert(i as u8);
    }
    lookup
}

/// Expand palette indices into a 4-byte per pixel buffer.
pub fn expand(indices: &[u8], palette: &Palette) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(indices.len() * 4);
    for &index in indices {
        let color = palette
            .colors()
            .get(usize::from(index))
            .ok_or(Error::IndexOutOfRange {
                index,
                palette_len: palette.len(),
            })?;
        out.extend_from_slice(color);
    }
    Ok(out)
}

/// The fixed 256-level grayscale palette used for single-channel surfaces.
pub fn grayscale_palette() -> Palette {
    Palette::new((0..=255u8).map(|l| [l, l, l, 0xFF]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_quantize_orders_by_alpha() {
        let buffer = [
            10, 10, 10, 200, //
            20, 20, 20, 50, //
            10, 10, 10, 200, //
            30, 30, 30, 50, //
        ];
        let (indices, palette) = quantize(&buffer).unwrap();

        assert_eq!(palette.len(), MIN_PALETTE_LEN);
        assert_eq!(palette.colors()[0], [20, 20, 20, 50]);
        assert_eq!(palette.colors()[1], [30, 30, 30, 50]);
        assert_eq!(palette.colors()[2], [10, 10, 10, 200]);
        assert!(palette.colors()[3..].iter().all(|&c| c == PAD_COLOR));
        assert_eq!(indices, [2, 0, 2, 1]);
    }

    #[test]
    fn test_quantize_white_maps_to_first_entry() {
        let buffer = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
        let (indices, palette) = quantize(&buffer).unwrap();
        assert_eq!(palette.colors()[0], [0, 0, 0, 0]);
        assert_eq!(indices, [1, 0]);
    }

    #[test]
    fn test_quantize_rejects_too_many_colors() {
        let buffer: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i & 0xFF) as u8, (i >> 8) as u8, 0, 0xFF])
            .collect();
        assert!(matches!(quantize(&buffer), Err(Error::TooManyColors(300))));
    }

    #[test]
    fn test_quantize_exactly_256_colors() {
        let buffer: Vec<u8> = (0..=255u8).flat_map(|i| [i, 0, 0, 0xFF]).collect();
        let (indices, palette) = quantize(&buffer).unwrap();
        assert_eq!(palette.len(), 256);
        assert_eq!(expand(&indices, &palette).unwrap(), buffer);
    }

    #[test]
    fn test_expand_index_out_of_range() {
        let palette = Palette::new(vec![[0; 4]; 16]);
        assert!(matches!(
            expand(&[0, 16], &palette),
            Err(Error::IndexOutOfRange {
                index: 16,
                palette_len: 16
            })
        ));
    }

    #[test]
    fn test_palette_bytes_roundtrip() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let palette = Palette::from_bytes(&bytes);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.to_bytes(), bytes);
    }

    #[test]
    fn test_map_to_grayscale() {
        let palette = grayscale_palette();
        let buffer = [7, 7, 7, 0xFF, 200, 200, 200, 0xFF];
        assert_eq!(map_to_palette(&buffer, &palette).unwrap(), [7, 200]);

        let colored = [1, 2, 3, 0xFF];
        assert!(matches!(
            map_to_palette(&colored, &palette),
            Err(Error::ColorNotInPalette { pixel: 0, .. })
        ));
    }

    #[test]
    fn test_lossy_mapping_falls_back_to_zero() {
        let palette = grayscale_palette();
        let buffer = [1, 2, 3, 0xFF, 9, 9, 9, 0xFF, 40, 40, 40, 0x80];
        assert_eq!(map_to_palette_lossy(&buffer, &palette), (vec![0, 9, 0], 2));
    }

    proptest! {
        #[test]
        fn quantize_then_expand_is_identity(
            colors in prop::collection::vec(any::<[u8; 4]>(), 1..64),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 1..256),
        ) {
            let buffer: Vec<u8> = picks
                .iter()
                .flat_map(|i| colors[i.index(colors.len())])
                .collect();

            let (indices, palette) = quantize(&buffer).unwrap();
            prop_assert!(palette.len() >= MIN_PALETTE_LEN);
            prop_assert_eq!(indices.len(), picks.len());
            prop_assert_eq!(expand(&indices, &palette).unwrap(), buffer);
        }
    }
}

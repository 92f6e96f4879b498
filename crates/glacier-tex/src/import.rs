//! Replacing an entry's payload from DDS or raster files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glacier_pixel::channel::color_to_dual_channel;
use glacier_pixel::palette::{grayscale_palette, map_to_palette, map_to_palette_lossy};
use glacier_pixel::{
    channel_swap, encode_block_compressed, level_dimensions, mip_chain_sizes, mip_count_for,
    quantize, ChannelOrder, PixelFormat,
};
use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::entry::{TextureEntry, TextureFormat};
use crate::export::dds_variant;
use crate::raster::{read_rgba, resize_chain, FileTarget};
use crate::Result;

/// New dimensions and payload for an entry.
struct Replacement {
    width: u32,
    height: u32,
    levels: Vec<Vec<u8>>,
    palette: Option<Vec<u8>>,
}

/// Build the entry that results from importing `path` into `entry`.
///
/// The source entry is never touched; on failure nothing has changed.
pub fn import(entry: &TextureEntry, path: &Path) -> Result<TextureEntry> {
    let format = entry.format()?;
    let target = FileTarget::from_path(path)?;

    let replacement = if target.is_dds() {
        from_dds(format, path)?
    } else {
        from_raster(format, path)?
    };

    let mut updated = entry.clone();
    updated.replace_levels(
        replacement.width,
        replacement.height,
        replacement.levels,
        replacement.palette,
    )?;

    debug!(
        index = entry.index,
        ?format,
        width = updated.width,
        height = updated.height,
        levels = updated.mip_count,
        file_size = updated.file_size,
        "imported"
    );
    Ok(updated)
}

fn from_dds(format: TextureFormat, path: &Path) -> Result<Replacement> {
    let mut reader = BufReader::new(File::open(path)?);
    let surface = glacier_dds::decode_and_validate(&mut reader, dds_variant(format))?;
    let (width, height) = (surface.width, surface.height);
    let mut levels = surface.levels;
    let mut palette = None;

    match format {
        TextureFormat::Dxt1 | TextureFormat::Dxt3 | TextureFormat::I8 => {}
        TextureFormat::Rgba => {
            for (level, data) in levels.iter_mut().enumerate() {
                let (w, h) = level_dimensions(width, height, level);
                channel_swap(data, w, h);
            }
        }
        TextureFormat::Paln => {
            let (indexed, table) = indexed_chain(&levels)?;
            levels = indexed;
            palette = Some(table);
        }
        TextureFormat::U8V8 => {
            levels = levels
                .iter()
                .map(|data| color_to_dual_channel(data, ChannelOrder::Bgra))
                .collect();
        }
    }

    Ok(Replacement {
        width,
        height,
        levels,
        palette,
    })
}

fn from_raster(format: TextureFormat, path: &Path) -> Result<Replacement> {
    let image = read_rgba(path)?;
    let (width, height) = image.dimensions();
    let count = mip_count_for(width, height);
    let mut palette = None;

    let levels = match format {
        TextureFormat::Dxt1 | TextureFormat::Dxt3 => {
            let pixel_format = format.pixel_format();
            let mut encoded = Vec::new();
            for (level, img) in resize_chain(&image, count, FilterType::Triangle)
                .iter()
                .enumerate()
            {
                let (w, h) = level_dimensions(width, height, level);
                encoded.extend(encode_block_compressed(pixel_format, img.as_raw(), w, h)?);
            }
            split_chain(&encoded, pixel_format, width, height, count)?
        }
        TextureFormat::Rgba => resize_chain(&image, count, FilterType::Triangle)
            .into_iter()
            .map(|img| img.into_raw())
            .collect(),
        TextureFormat::Paln => {
            let bgra: Vec<Vec<u8>> = resize_chain(&image, count, FilterType::Nearest)
                .into_iter()
                .map(|img| {
                    let (w, h) = img.dimensions();
                    let mut raw = img.into_raw();
                    channel_swap(&mut raw, w, h);
                    raw
                })
                .collect();
            let (indexed, table) = indexed_chain(&bgra)?;
            palette = Some(table);
            indexed
        }
        TextureFormat::I8 => {
            let gray = grayscale_palette();
            let mut levels = Vec::with_capacity(count);
            for (level, img) in resize_chain(&image, count, FilterType::Nearest)
                .iter()
                .enumerate()
            {
                let (indices, misses) = map_to_palette_lossy(img.as_raw(), &gray);
                if misses > 0 {
                    warn!(level, pixels = misses, "non-gray pixels imported as 0");
                }
                levels.push(indices);
            }
            levels
        }
        TextureFormat::U8V8 => resize_chain(&image, count, FilterType::Triangle)
            .iter()
            .map(|img| color_to_dual_channel(img.as_raw(), ChannelOrder::Rgba))
            .collect(),
    };

    Ok(Replacement {
        width,
        height,
        levels,
        palette,
    })
}

/// Quantize level 0 and index every level against the resulting palette.
fn indexed_chain(levels: &[Vec<u8>]) -> Result<(Vec<Vec<u8>>, Vec<u8>)> {
    let Some((first, rest)) = levels.split_first() else {
        return Ok((Vec::new(), Vec::new()));
    };

    let (indices, palette) = quantize(first)?;
    let mut indexed = Vec::with_capacity(levels.len());
    indexed.push(indices);
    for level in rest {
        indexed.push(map_to_palette(level, &palette)?);
    }
    Ok((indexed, palette.to_bytes()))
}

/// Split concatenated block data by the archive's clamped chain sizes.
fn split_chain(
    encoded: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    count: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut levels = Vec::with_capacity(count);
    let mut pos = 0;
    for size in mip_chain_sizes(format, width, height, count)? {
        let level = encoded
            .get(pos..pos + size)
            .ok_or(glacier_pixel::Error::BufferTooSmall {
                expected: pos + size,
                actual: encoded.len(),
            })?;
        levels.push(level.to_vec());
        pos += size;
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::record;
    use crate::Error;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn entry(tag: &[u8; 4], palette: Option<&[u8]>) -> TextureEntry {
        let bytes = record(tag, 3, 4, 4, b"tex", &[vec![0; 64]], palette);
        TextureEntry::read(&bytes, 0).unwrap()
    }

    fn checker(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        })
    }

    #[test]
    fn test_dxt_raster_import_uses_clamped_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        checker(16).save(&path).unwrap();

        let updated = import(&entry(b"DXT1", None), &path).unwrap();
        assert_eq!((updated.width, updated.height), (16, 16));
        assert_eq!(updated.mip_count, 4);
        assert_eq!(updated.level_sizes, [128, 32, 8, 8]);
        assert_eq!(updated.file_size, updated.computed_file_size());
        assert!(updated.level_offsets.is_empty());
    }

    #[test]
    fn test_paln_raster_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        checker(8).save(&path).unwrap();

        let palette = vec![0u8; 64];
        let updated = import(&entry(b"PALN", Some(&palette)), &path).unwrap();
        let table = updated.palette().unwrap();
        assert_eq!(table.len(), 16);
        // stored B G R A, sorted by alpha
        assert_eq!(table.colors()[0], [255, 0, 0, 128]);
        assert_eq!(table.colors()[1], [0, 0, 255, 255]);
        assert_eq!(updated.data[0][..2], [1, 0]);
        assert_eq!(updated.mip_count, 3);
    }

    #[test]
    fn test_i8_raster_import_zeroes_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        checker(4).save(&path).unwrap();

        let updated = import(&entry(b"I8  ", None), &path).unwrap();
        assert_eq!(updated.mip_count, 3);
        assert!(updated.data.iter().flatten().all(|&i| i == 0));
    }

    #[test]
    fn test_i8_raster_import_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        GrayImage::from_fn(4, 2, |x, _| Luma([x as u8 * 10])).save(&path).unwrap();

        let updated = import(&entry(b"I8  ", None), &path).unwrap();
        assert_eq!((updated.width, updated.height), (4, 2));
        assert_eq!(updated.data[0], [0, 10, 20, 30, 0, 10, 20, 30]);
    }

    #[test]
    fn test_rgba_dds_import_swaps_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.dds");
        let surface = glacier_dds::DdsSurface {
            width: 1,
            height: 1,
            levels: vec![vec![3, 2, 1, 4]],
        };
        let mut file = File::create(&path).unwrap();
        glacier_dds::encode(&mut file, &surface, glacier_dds::DdsVariant::A8R8G8B8).unwrap();
        drop(file);

        let updated = import(&entry(b"RGBA", None), &path).unwrap();
        assert_eq!(updated.data, [vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_u8v8_dds_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.dds");
        let surface = glacier_dds::DdsSurface {
            width: 1,
            height: 1,
            levels: vec![vec![0xFF, 0x20, 0x10, 0xFF]],
        };
        let mut file = File::create(&path).unwrap();
        glacier_dds::encode(&mut file, &surface, glacier_dds::DdsVariant::A8R8G8B8).unwrap();
        drop(file);

        let updated = import(&entry(b"U8V8", None), &path).unwrap();
        assert_eq!(updated.data, [vec![0x10, 0x20]]);
    }

    #[test]
    fn test_split_chain_short_input() {
        assert!(split_chain(&[0; 8], PixelFormat::Dxt1, 8, 8, 2).is_err());
        let levels = split_chain(&[0; 40], PixelFormat::Dxt1, 8, 8, 2).unwrap();
        assert_eq!(levels.iter().map(Vec::len).collect::<Vec<_>>(), [32, 8]);
    }
}

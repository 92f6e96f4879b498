//! File targets and generic raster I/O.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageFormat, RgbaImage};
use tracing::debug;

use crate::{tga, Error, Result};

/// File type selected by a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTarget {
    Dds,
    Tga,
    Bmp,
    Png,
    Jpeg,
}

impl FileTarget {
    /// Pick the target for a path, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "dds" => Ok(Self::Dds),
            "tga" => Ok(Self::Tga),
            "bmp" => Ok(Self::Bmp),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(Error::UnsupportedExtension(ext)),
        }
    }

    /// Check if this is the DDS target.
    #[inline]
    pub fn is_dds(self) -> bool {
        self == Self::Dds
    }
}

/// Decoded pixels handed to a raster writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pixels {
    /// 4 bytes per pixel, RGBA.
    Rgba(Vec<u8>),
    /// 1 byte per pixel.
    Gray(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
}

/// Write a raster to `path` in a non-DDS target format.
pub(crate) fn write_raster(path: &Path, target: FileTarget, raster: &Raster) -> Result<()> {
    let (bytes, color, channels) = match &raster.pixels {
        Pixels::Rgba(rgba) => (rgba.as_slice(), ExtendedColorType::Rgba8, 4),
        Pixels::Gray(gray) => (gray.as_slice(), ExtendedColorType::L8, 1),
    };

    let expected = (raster.width as usize)
        .saturating_mul(raster.height as usize)
        .saturating_mul(channels);
    if bytes.len() != expected {
        return Err(glacier_pixel::Error::BufferTooSmall {
            expected,
            actual: bytes.len(),
        }
        .into());
    }

    match target {
        FileTarget::Tga => {
            let mut writer = BufWriter::new(File::create(path)?);
            tga::write(&mut writer, raster)?;
            writer.flush()?;
        }
        FileTarget::Png | FileTarget::Bmp => {
            let format = if target == FileTarget::Png {
                ImageFormat::Png
            } else {
                ImageFormat::Bmp
            };
            image::save_buffer_with_format(path, bytes, raster.width, raster.height, color, format)?;
        }
        FileTarget::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, 100);
            match &raster.pixels {
                Pixels::Rgba(rgba) => {
                    let rgb: Vec<u8> = rgba
                        .chunks_exact(4)
                        .flat_map(|p| [p[0], p[1], p[2]])
                        .collect();
                    encoder.encode(&rgb, raster.width, raster.height, ExtendedColorType::Rgb8)?;
                }
                Pixels::Gray(gray) => {
                    encoder.encode(gray, raster.width, raster.height, ExtendedColorType::L8)?;
                }
            }
            writer.flush()?;
        }
        FileTarget::Dds => return Err(Error::UnsupportedExtension("dds".to_string())),
    }

    debug!(
        path = %path.display(),
        ?target,
        width = raster.width,
        height = raster.height,
        "wrote raster"
    );
    Ok(())
}

/// Decode a raster file into RGBA.
pub(crate) fn read_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Downscaled copies of `image`, one per mip level, each resized from the
/// full-resolution source.
pub(crate) fn resize_chain(image: &RgbaImage, count: usize, filter: FilterType) -> Vec<RgbaImage> {
    let (width, height) = image.dimensions();
    (0..count)
        .map(|level| {
            let (w, h) = glacier_pixel::level_dimensions(width, height, level);
            if level == 0 {
                image.clone()
            } else {
                imageops::resize(image, w, h, filter)
            }
        })
        .collect()
}

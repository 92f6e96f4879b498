//! Exporting entries to DDS and raster files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glacier_dds::{DdsSurface, DdsVariant};
use glacier_pixel::{
    channel_swap, decode_block_compressed, dual_channel_to_color, expand, level0_size, ChannelOrder,
};
use tracing::{debug, trace};

use crate::entry::{TextureEntry, TextureFormat};
use crate::raster::{write_raster, FileTarget, Pixels, Raster};
use crate::{Error, Result};

/// DDS layout an entry format is exchanged as.
pub fn dds_variant(format: TextureFormat) -> DdsVariant {
    match format {
        TextureFormat::Dxt1 => DdsVariant::Dxt1,
        TextureFormat::Dxt3 => DdsVariant::Dxt3,
        TextureFormat::I8 => DdsVariant::L8,
        TextureFormat::Rgba | TextureFormat::Paln | TextureFormat::U8V8 => DdsVariant::A8R8G8B8,
    }
}

/// Export the full-resolution level; the target format follows the extension.
pub fn export(entry: &TextureEntry, path: &Path) -> Result<()> {
    export_level(entry, 0, path)
}

/// Export a single mip level.
pub fn export_level(entry: &TextureEntry, level: usize, path: &Path) -> Result<()> {
    let target = FileTarget::from_path(path)?;
    let format = entry.format()?;
    let (width, height) = entry.level_dimensions(level);

    if target.is_dds() {
        let surface = DdsSurface {
            width,
            height,
            levels: vec![dds_level(entry, format, level)?],
        };
        write_dds(path, &surface, dds_variant(format))?;
    } else {
        write_raster(path, target, &level_raster(entry, format, level)?)?;
    }

    debug!(index = entry.index, level, path = %path.display(), "exported level");
    Ok(())
}

/// Export every mip level into one DDS file.
pub fn export_dds_chain(entry: &TextureEntry, path: &Path) -> Result<()> {
    let target = FileTarget::from_path(path)?;
    if !target.is_dds() {
        return Err(Error::UnsupportedExtension(format!("{target:?}").to_ascii_lowercase()));
    }

    let format = entry.format()?;
    let levels = (0..entry.data.len())
        .map(|level| dds_level(entry, format, level))
        .collect::<Result<Vec<_>>>()?;

    let surface = DdsSurface {
        width: u32::from(entry.width),
        height: u32::from(entry.height),
        levels,
    };
    write_dds(path, &surface, dds_variant(format))?;

    debug!(
        index = entry.index,
        levels = surface.levels.len(),
        path = %path.display(),
        "exported DDS chain"
    );
    Ok(())
}

/// Export every mip level to its own file, named by [`level_export_paths`].
pub fn export_all_levels(entry: &TextureEntry, path: &Path) -> Result<Vec<PathBuf>> {
    let paths = level_export_paths(path, entry);
    for (level, level_path) in paths.iter().enumerate() {
        export_level(entry, level, level_path)?;
    }
    Ok(paths)
}

/// Per-level file names derived from `path`: `<stem>_<w>x<h>.<ext>`.
pub fn level_export_paths(path: &Path, entry: &TextureEntry) -> Vec<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    (0..entry.data.len())
        .map(|level| {
            let (w, h) = entry.level_dimensions(level);
            path.with_file_name(format!("{stem}_{w}x{h}.{ext}"))
        })
        .collect()
}

fn write_dds(path: &Path, surface: &DdsSurface, variant: DdsVariant) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    glacier_dds::encode(&mut writer, surface, variant)?;
    writer.flush()?;
    Ok(())
}

/// A level's payload in the byte order its DDS variant expects.
fn dds_level(entry: &TextureEntry, format: TextureFormat, level: usize) -> Result<Vec<u8>> {
    let data = entry.level(level)?;
    let (width, height) = entry.level_dimensions(level);

    Ok(match format {
        TextureFormat::Dxt1 | TextureFormat::Dxt3 | TextureFormat::I8 => data.to_vec(),
        TextureFormat::Rgba => {
            let mut bgra = data.to_vec();
            channel_swap(&mut bgra, width, height);
            bgra
        }
        TextureFormat::Paln => expand(data, &entry.palette()?)?,
        TextureFormat::U8V8 => dual_channel_to_color(data, ChannelOrder::Bgra),
    })
}

/// A level decoded for a raster writer.
fn level_raster(entry: &TextureEntry, format: TextureFormat, level: usize) -> Result<Raster> {
    let data = entry.level(level)?;
    let (width, height) = entry.level_dimensions(level);
    let pixel_format = format.pixel_format();
    let texels = fit_level(data, level0_size(pixel_format, width, height)?, level);

    let pixels = match format {
        TextureFormat::Dxt1 | TextureFormat::Dxt3 => {
            Pixels::Rgba(decode_block_compressed(pixel_format, &texels, width, height)?)
        }
        TextureFormat::Rgba => Pixels::Rgba(texels),
        TextureFormat::Paln => {
            let mut rgba = expand(&texels, &entry.palette()?)?;
            channel_swap(&mut rgba, width, height);
            Pixels::Rgba(rgba)
        }
        TextureFormat::I8 => Pixels::Gray(texels),
        TextureFormat::U8V8 => Pixels::Rgba(dual_channel_to_color(&texels, ChannelOrder::Rgba)),
    };

    Ok(Raster {
        width,
        height,
        pixels,
    })
}

/// Stored level bytes sized to what its dimensions cover.
///
/// The archive chain quarters each level, so non-square and clamped levels
/// can hold fewer bytes than their dimensions cover. Missing texels are
/// zero; extra bytes are dropped.
fn fit_level(data: &[u8], needed: usize, level: usize) -> Vec<u8> {
    let mut bytes = data.to_vec();
    if bytes.len() != needed {
        trace!(level, have = bytes.len(), needed, "resizing level to its dimensions");
        bytes.resize(needed, 0);
    }
    bytes
}

//! Uncompressed TGA writer.
//!
//! Writes type 2 (32-bit BGRA) or type 3 (8-bit grayscale) images with the
//! default bottom-left origin, so rows are stored last to first.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use glacier_pixel::channel::{flip_vertical_luminance, flip_vertical_rgba};
use glacier_pixel::channel_swap;

use crate::raster::{Pixels, Raster};
use crate::{Error, Result};

const TRUE_COLOR: u8 = 2;
const GRAYSCALE: u8 = 3;

/// Write a raster as an uncompressed TGA.
pub(crate) fn write<W: Write>(writer: &mut W, raster: &Raster) -> Result<()> {
    let (Ok(width), Ok(height)) = (u16::try_from(raster.width), u16::try_from(raster.height)) else {
        return Err(Error::DimensionsTooLarge {
            width: raster.width,
            height: raster.height,
            limit: "TGA",
        });
    };

    let (image_type, depth, descriptor, body) = match &raster.pixels {
        Pixels::Rgba(rgba) => {
            let mut body = flip_vertical_rgba(rgba, raster.width, raster.height)?;
            channel_swap(&mut body, raster.width, raster.height);
            // low nibble: 8 alpha bits
            (TRUE_COLOR, 32, 8, body)
        }
        Pixels::Gray(gray) => {
            let body = flip_vertical_luminance(gray, raster.width, raster.height)?;
            (GRAYSCALE, 8, 0, body)
        }
    };

    writer.write_u8(0)?; // id length
    writer.write_u8(0)?; // no color map
    writer.write_u8(image_type)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u8(0)?;
    writer.write_u16::<LittleEndian>(0)?; // x origin
    writer.write_u16::<LittleEndian>(0)?; // y origin
    writer.write_u16::<LittleEndian>(width)?;
    writer.write_u16::<LittleEndian>(height)?;
    writer.write_u8(depth)?;
    writer.write_u8(descriptor)?;
    writer.write_all(&body)?;
    Ok(())
}

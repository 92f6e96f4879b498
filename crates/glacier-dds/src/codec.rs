//! DDS reading, validation and writing.

use std::io::{Read, Write};

use glacier_common::{BinaryReader, IntoBytes};
use glacier_pixel::mip_chain_sizes;
use tracing::{debug, trace};

use crate::error::{Error, Result, ValidationError};
use crate::header::{flags, pixel_flags, DdsHeader, DdsPixelFormat, DdsVariant};
use crate::DDS_MAGIC;

/// Most mip levels a file may declare; a 32-bit dimension halves to one
/// pixel in at most 32 steps.
pub const MAX_LEVELS: u32 = 32;

/// A surface and its mip chain, largest level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsSurface {
    pub width: u32,
    pub height: u32,
    pub levels: Vec<Vec<u8>>,
}

impl DdsSurface {
    /// Number of mip levels.
    pub fn mip_count(&self) -> usize {
        self.levels.len()
    }
}

/// Read the magic and header, checking only that this is a DDS file.
pub fn read_header(reader: &mut BinaryReader<'_>) -> Result<DdsHeader> {
    let magic = reader.read_array::<4>()?;
    if &magic != DDS_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let header: DdsHeader = reader.read_struct()?;
    let size = header.size;
    if size != DdsHeader::SIZE {
        return Err(Error::InvalidHeaderSize(size));
    }

    Ok(header)
}

/// Check a header against the layout an import expects.
pub fn validate_header(
    header: &DdsHeader,
    variant: DdsVariant,
) -> std::result::Result<(), ValidationError> {
    let header_flags = header.flags;
    let required = variant.required_flags();
    if header_flags & required != required {
        return Err(ValidationError::HeaderFlags {
            required,
            actual: header_flags,
        });
    }

    let mip_count = header.mipmap_count;
    if mip_count > 1 && header_flags & flags::MIPMAPCOUNT == 0 {
        return Err(ValidationError::MissingMipmapCountFlag(mip_count));
    }

    let pf = header.pixel_format;
    let pf_size = pf.size;
    if pf_size != DdsPixelFormat::SIZE {
        return Err(ValidationError::PixelFormatSize(pf_size));
    }

    let expected = variant.pixel_format_block();
    let (pf_flags, expected_flags) = (pf.flags, expected.flags);
    match variant.four_cc() {
        Some(four_cc) => {
            if pf_flags != pixel_flags::FOURCC {
                return Err(ValidationError::PixelFormatFlags {
                    expected: expected_flags,
                    actual: pf_flags,
                });
            }
            let actual = pf.four_cc;
            if actual != four_cc {
                return Err(ValidationError::FourCC {
                    expected: four_cc,
                    actual,
                });
            }
        }
        None => {
            if pf_flags & expected_flags != expected_flags {
                return Err(ValidationError::PixelFormatFlags {
                    expected: expected_flags,
                    actual: pf_flags,
                });
            }
            let (bits, expected_bits) = (pf.rgb_bit_count, expected.rgb_bit_count);
            if bits != expected_bits {
                return Err(ValidationError::BitCount {
                    expected: expected_bits,
                    actual: bits,
                });
            }
            if pf.masks() != expected.masks() {
                return Err(ValidationError::ChannelMasks {
                    expected: expected.masks(),
                    actual: pf.masks(),
                });
            }
        }
    }

    let caps = header.caps;
    let expected_caps = DdsVariant::expected_caps(header.level_count());
    if caps != expected_caps {
        return Err(ValidationError::Caps {
            expected: expected_caps,
            actual: caps,
        });
    }

    Ok(())
}

/// Read a DDS file, reject it unless it matches `variant` exactly, and split
/// its payload into levels.
///
/// Level sizes follow the TEX chain rule for the variant's pixel format.
/// Bytes past the last level are ignored.
pub fn decode_and_validate<R: Read>(reader: &mut R, variant: DdsVariant) -> Result<DdsSurface> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut reader = BinaryReader::new(&data);
    let header = read_header(&mut reader)?;
    validate_header(&header, variant).map_err(|source| Error::Validation { variant, source })?;

    let declared = header.mipmap_count;
    if declared > MAX_LEVELS {
        return Err(Error::TooManyLevels(declared));
    }

    let (width, height) = (header.width, header.height);
    let sizes = mip_chain_sizes(variant.pixel_format(), width, height, header.level_count())?;
    debug!(?variant, width, height, levels = sizes.len(), "DDS header accepted");

    let mut levels = Vec::with_capacity(sizes.len());
    for (level, &needed) in sizes.iter().enumerate() {
        let available = reader.remaining();
        if available < needed {
            return Err(Error::TruncatedPayload {
                level,
                needed,
                available,
            });
        }
        levels.push(reader.read_bytes(needed)?.to_vec());
    }

    if !reader.is_empty() {
        trace!(trailing = reader.remaining(), "ignoring bytes after last level");
    }

    Ok(DdsSurface {
        width,
        height,
        levels,
    })
}

/// Write a surface as a DDS file of the given layout.
///
/// Levels are written back to back with no padding.
pub fn encode<W: Write>(writer: &mut W, surface: &DdsSurface, variant: DdsVariant) -> Result<()> {
    let first = surface.levels.first().ok_or(Error::EmptySurface)?;
    let mip_count = surface.levels.len();

    let mut header_flags = variant.required_flags();
    if mip_count > 1 {
        header_flags |= flags::MIPMAPCOUNT;
    }

    let pitch_or_linear_size = if variant.uses_pitch() {
        surface.width as usize * 4
    } else {
        first.len()
    };

    let header = DdsHeader {
        size: DdsHeader::SIZE,
        flags: header_flags,
        height: surface.height,
        width: surface.width,
        pitch_or_linear_size: to_u32(pitch_or_linear_size)?,
        depth: 0,
        mipmap_count: to_u32(mip_count)?,
        reserved1: [0; 11],
        pixel_format: variant.pixel_format_block(),
        caps: DdsVariant::expected_caps(mip_count),
        caps2: 0,
        caps3: 0,
        caps4: 0,
        reserved2: 0,
    };

    writer.write_all(DDS_MAGIC)?;
    writer.write_all(header.as_bytes())?;
    for level in &surface.levels {
        writer.write_all(level)?;
    }

    Ok(())
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::DimensionOverflow(value))
}

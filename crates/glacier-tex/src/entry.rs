//! Texture entries and their on-disk record.

use std::fmt;

use glacier_common::text::{decode_latin1, encode_latin1, reverse_tag};
use glacier_common::BinaryReader;
use glacier_pixel::{level_dimensions, Palette, PixelFormat};
use serde::Serialize;
use tracing::trace;

use crate::{Error, Result};

/// Bytes of fixed fields that follow the size word of a record.
const FIXED_FIELDS_SIZE: usize = 32;

/// A four-character type tag, already un-reversed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(pub [u8; 4]);

impl TypeTag {
    pub const DXT1: Self = Self(*b"DXT1");
    pub const DXT3: Self = Self(*b"DXT3");
    pub const RGBA: Self = Self(*b"RGBA");
    pub const PALN: Self = Self(*b"PALN");
    pub const I8: Self = Self(*b"I8  ");
    pub const U8V8: Self = Self(*b"U8V8");

    /// Decode a tag as stored in the archive (byte-reversed).
    pub fn from_stored(raw: [u8; 4]) -> Self {
        Self(reverse_tag(raw))
    }

    /// Tag text, Latin-1 decoded.
    pub fn as_string(&self) -> String {
        decode_latin1(&self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.as_string())
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({:?})", self.as_string())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

/// Pixel layouts a TEX entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// DXT1 blocks.
    Dxt1,
    /// DXT3 blocks.
    Dxt3,
    /// 4 bytes per pixel, RGBA.
    Rgba,
    /// 1 byte palette index per pixel plus an inline palette.
    Paln,
    /// 1 byte luminance per pixel.
    I8,
    /// 2 bytes per pixel, two independent channels.
    U8V8,
}

impl TextureFormat {
    /// Resolve a primary type tag.
    pub fn from_tag(tag: TypeTag) -> Result<Self> {
        match tag {
            TypeTag::DXT1 => Ok(Self::Dxt1),
            TypeTag::DXT3 => Ok(Self::Dxt3),
            TypeTag::RGBA => Ok(Self::Rgba),
            TypeTag::PALN => Ok(Self::Paln),
            TypeTag::I8 => Ok(Self::I8),
            TypeTag::U8V8 => Ok(Self::U8V8),
            other => Err(Error::UnknownFormat(other)),
        }
    }

    /// The tag written for this format.
    pub const fn tag(self) -> TypeTag {
        match self {
            Self::Dxt1 => TypeTag::DXT1,
            Self::Dxt3 => TypeTag::DXT3,
            Self::Rgba => TypeTag::RGBA,
            Self::Paln => TypeTag::PALN,
            Self::I8 => TypeTag::I8,
            Self::U8V8 => TypeTag::U8V8,
        }
    }

    /// Payload encoding of each mip level.
    pub const fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Dxt1 => PixelFormat::Dxt1,
            Self::Dxt3 => PixelFormat::Dxt3,
            Self::Rgba => PixelFormat::Rgba8,
            Self::Paln => PixelFormat::Indexed8,
            Self::I8 => PixelFormat::Luminance8,
            Self::U8V8 => PixelFormat::Uv88,
        }
    }
}

/// One texture record of a TEX archive.
///
/// `data`, `level_sizes` and `mip_count` always describe the same number of
/// levels. `level_offsets` locates each payload in the archive the entry was
/// parsed from; it is empty once an import has replaced the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    /// Record offset in the source archive.
    pub offset: u32,
    /// Declared record size.
    pub file_size: u32,
    /// Primary type tag.
    pub type1: TypeTag,
    /// Secondary type tag.
    pub type2: TypeTag,
    /// Logical slot id.
    pub index: u32,
    pub width: u16,
    pub height: u16,
    pub mip_count: u32,
    /// Opaque fields, kept verbatim.
    pub unknown: [u32; 3],
    /// File name with quotes and backslashes stripped.
    pub file_name: String,
    pub level_sizes: Vec<u32>,
    pub level_offsets: Vec<u32>,
    /// Mip payloads, largest first.
    pub data: Vec<Vec<u8>>,
    /// Inline palette bytes (4 per color, B G R A), indexed entries only.
    pub palette: Option<Vec<u8>>,
    /// Back-references from the second offset table.
    pub indices: Option<Vec<i32>>,
}

impl TextureEntry {
    /// Decode the record at `offset`.
    ///
    /// Record layout: size, two reversed tags, index, height, width, mip
    /// count, three opaque words, NUL-terminated name, then `mip_count`
    /// length-prefixed payloads and, for `PALN` entries, a counted palette.
    pub fn read(buffer: &[u8], offset: u32) -> Result<Self> {
        let mut reader = BinaryReader::new(buffer);
        reader.seek(offset as usize)?;

        let file_size = reader.read_u32()?;
        let type1 = TypeTag::from_stored(reader.read_array()?);
        let type2 = TypeTag::from_stored(reader.read_array()?);
        let index = reader.read_u32()?;
        let height = reader.read_u16()?;
        let width = reader.read_u16()?;
        let mip_count = reader.read_u32()?;
        let unknown = [reader.read_u32()?, reader.read_u32()?, reader.read_u32()?];

        let file_name = decode_latin1(reader.read_cstring_bytes()?)
            .chars()
            .filter(|&c| c != '\'' && c != '\\')
            .collect();

        // A bogus count fails on the first overrun instead of preallocating.
        let capacity = (mip_count as usize).min(16);
        let mut level_sizes = Vec::with_capacity(capacity);
        let mut level_offsets = Vec::with_capacity(capacity);
        let mut data = Vec::with_capacity(capacity);

        for level in 0..mip_count as usize {
            let size = reader.read_i32()?;
            let available = reader.remaining();
            if size < 0 || size as usize > available {
                return Err(Error::LevelOverrun {
                    entry_offset: offset,
                    level,
                    size: i64::from(size),
                    available,
                });
            }
            level_offsets.push(reader.position() as u32);
            level_sizes.push(size as u32);
            data.push(reader.read_bytes(size as usize)?.to_vec());
        }

        let palette = if type1 == TypeTag::PALN {
            let count_offset = reader.position();
            let count = reader.read_i32()?;
            if count < 0 {
                return Err(Error::NegativeCount {
                    what: "palette",
                    count,
                    offset: count_offset,
                });
            }
            Some(reader.read_bytes(count as usize * 4)?.to_vec())
        } else {
            None
        };

        trace!(offset, index, %type1, width, height, mip_count, "decoded entry");

        Ok(Self {
            offset,
            file_size,
            type1,
            type2,
            index,
            width,
            height,
            mip_count,
            unknown,
            file_name,
            level_sizes,
            level_offsets,
            data,
            palette,
            indices: None,
        })
    }

    /// Pixel layout of this entry.
    pub fn format(&self) -> Result<TextureFormat> {
        TextureFormat::from_tag(self.type1)
    }

    /// Number of palette colors.
    pub fn palette_size(&self) -> u32 {
        self.palette.as_ref().map_or(0, |p| (p.len() / 4) as u32)
    }

    /// The inline palette, for indexed entries.
    pub fn palette(&self) -> Result<Palette> {
        self.palette
            .as_deref()
            .map(Palette::from_bytes)
            .ok_or(Error::MissingPalette(self.index))
    }

    /// Payload of one mip level.
    pub fn level(&self, level: usize) -> Result<&[u8]> {
        self.data
            .get(level)
            .map(Vec::as_slice)
            .ok_or(Error::LevelOutOfRange {
                index: self.index,
                level,
                mip_count: self.data.len(),
            })
    }

    /// Pixel dimensions of one mip level.
    pub fn level_dimensions(&self, level: usize) -> (u32, u32) {
        level_dimensions(u32::from(self.width), u32::from(self.height), level)
    }

    /// Record size implied by the current contents.
    pub fn computed_file_size(&self) -> u32 {
        let name = encode_latin1(&self.file_name).len() + 1;
        let levels: usize = self.data.iter().map(|level| 4 + level.len()).sum();
        let palette = self.palette.as_ref().map_or(0, |p| 4 + p.len());
        let indices = self.indices.as_ref().map_or(0, |i| 4 + 4 * i.len());
        let total = FIXED_FIELDS_SIZE + name + levels + palette + indices;
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    /// Replace the dimensions and mip chain, keeping the bookkeeping fields
    /// consistent with the new payload.
    pub(crate) fn replace_levels(
        &mut self,
        width: u32,
        height: u32,
        levels: Vec<Vec<u8>>,
        palette: Option<Vec<u8>>,
    ) -> Result<()> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(Error::DimensionsTooLarge {
                width,
                height,
                limit: "16-bit record",
            });
        };
        self.width = w;
        self.height = h;
        self.mip_count = levels.len() as u32;
        self.level_sizes = levels.iter().map(|l| l.len() as u32).collect();
        self.level_offsets.clear();
        self.data = levels;
        self.palette = palette;
        self.file_size = self.computed_file_size();
        Ok(())
    }
}

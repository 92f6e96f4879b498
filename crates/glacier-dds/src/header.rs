//! DDS header structures.

use std::fmt;

use glacier_pixel::PixelFormat;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Surface description flags (`DDSD_*`).
pub mod flags {
    pub const CAPS: u32 = 0x1;
    pub const HEIGHT: u32 = 0x2;
    pub const WIDTH: u32 = 0x4;
    pub const PITCH: u32 = 0x8;
    pub const PIXELFORMAT: u32 = 0x1000;
    pub const MIPMAPCOUNT: u32 = 0x20000;
    pub const LINEARSIZE: u32 = 0x80000;
}

/// Pixel format flags (`DDPF_*`).
pub mod pixel_flags {
    pub const ALPHAPIXELS: u32 = 0x1;
    pub const FOURCC: u32 = 0x4;
    pub const RGB: u32 = 0x40;
    pub const LUMINANCE: u32 = 0x20000;
}

/// Surface capability flags (`DDSCAPS_*`).
pub mod caps {
    pub const COMPLEX: u32 = 0x8;
    pub const TEXTURE: u32 = 0x1000;
    pub const MIPMAP: u32 = 0x400000;
}

/// DDS file header (everything after the magic).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: u32,
    /// Header flags.
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Number of levels the payload holds; a zero count means one level.
    pub fn level_count(&self) -> usize {
        let count = self.mipmap_count;
        count.max(1) as usize
    }
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    /// Pixel format flags.
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// Expected structure size.
    pub const SIZE: u32 = 32;

    /// Channel masks in R, G, B, A order.
    pub fn masks(&self) -> [u32; 4] {
        [self.r_bit_mask, self.g_bit_mask, self.b_bit_mask, self.a_bit_mask]
    }
}

/// Four-character code for compression type.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT3 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// No four-cc (uncompressed layouts).
    pub const NONE: Self = Self([0; 4]);
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", char::from(b))?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// The DDS layouts TEX payloads are exchanged as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DdsVariant {
    /// DXT1 block compression.
    Dxt1,
    /// DXT3 block compression.
    Dxt3,
    /// Uncompressed 32-bit color with alpha, BGRA in memory.
    A8R8G8B8,
    /// 8-bit luminance.
    L8,
}

impl DdsVariant {
    /// Payload encoding of this layout.
    pub const fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Dxt1 => PixelFormat::Dxt1,
            Self::Dxt3 => PixelFormat::Dxt3,
            Self::A8R8G8B8 => PixelFormat::Rgba8,
            Self::L8 => PixelFormat::Luminance8,
        }
    }

    /// Compression tag, for block-compressed layouts.
    pub const fn four_cc(self) -> Option<FourCC> {
        match self {
            Self::Dxt1 => Some(FourCC::DXT1),
            Self::Dxt3 => Some(FourCC::DXT3),
            Self::A8R8G8B8 | Self::L8 => None,
        }
    }

    /// Whether the header describes a row pitch rather than a linear size.
    pub const fn uses_pitch(self) -> bool {
        matches!(self, Self::A8R8G8B8 | Self::L8)
    }

    /// Header flags every file of this layout must carry.
    pub const fn required_flags(self) -> u32 {
        let base = flags::CAPS | flags::HEIGHT | flags::WIDTH | flags::PIXELFORMAT;
        if self.uses_pitch() {
            base | flags::PITCH
        } else {
            base | flags::LINEARSIZE
        }
    }

    /// Pixel format block written for this layout.
    pub const fn pixel_format_block(self) -> DdsPixelFormat {
        let (flags, four_cc, bits, masks) = match self {
            Self::Dxt1 => (pixel_flags::FOURCC, FourCC::DXT1, 0, [0, 0, 0, 0]),
            Self::Dxt3 => (pixel_flags::FOURCC, FourCC::DXT3, 0, [0, 0, 0, 0]),
            Self::A8R8G8B8 => (
                pixel_flags::RGB | pixel_flags::ALPHAPIXELS,
                FourCC::NONE,
                32,
                [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000],
            ),
            Self::L8 => (pixel_flags::LUMINANCE, FourCC::NONE, 8, [0xFF, 0, 0, 0]),
        };

        DdsPixelFormat {
            size: DdsPixelFormat::SIZE,
            flags,
            four_cc,
            rgb_bit_count: bits,
            r_bit_mask: masks[0],
            g_bit_mask: masks[1],
            b_bit_mask: masks[2],
            a_bit_mask: masks[3],
        }
    }

    /// Capability flags for a surface with `mip_count` levels.
    pub const fn expected_caps(mip_count: usize) -> u32 {
        if mip_count > 1 {
            caps::TEXTURE | caps::COMPLEX | caps::MIPMAP
        } else {
            caps::TEXTURE
        }
    }
}

//! Glacier - TEX texture archive toolkit for Glacier engine games.
//!
//! # Crates
//!
//! - [`glacier_common`] - Bounds-checked binary reading, Latin-1 text
//! - [`glacier_pixel`] - DXT block codecs, channel conversions, palettes
//! - [`glacier_dds`] - DDS header writing and per-layout validation
//! - [`glacier_tex`] - TEX archive parsing, import/export, undo
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use glacier::prelude::*;
//!
//! let session = Session::open("scene.tex", ArchiveLayout::Desktop)?;
//! for (tag, count) in session.format_counts() {
//!     println!("{tag}: {count}");
//! }
//!
//! let entry = session.entry(4)?;
//! if entry.format()? == TextureFormat::Dxt1 {
//!     session.export_dds_chain(4, Path::new("entry4.dds"))?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use glacier_common as common;
pub use glacier_dds as dds;
pub use glacier_pixel as pixel;
pub use glacier_tex as tex;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use glacier_common::BinaryReader;
    pub use glacier_dds::{decode_and_validate, DdsSurface, DdsVariant};
    pub use glacier_pixel::{Palette, PixelFormat};
    pub use glacier_tex::{
        ArchiveLayout, Error, ErrorKind, FileTarget, Session, TexArchive, TextureEntry,
        TextureFormat, TypeTag,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

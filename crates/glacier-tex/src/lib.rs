//! Glacier engine TEX texture archives.
//!
//! A TEX archive stores every texture of a scene as a record with a mip
//! chain in one of six pixel layouts. This crate parses archives into
//! [`TextureEntry`] values and drives the import and export paths that move
//! texture data between entries and DDS, TGA, BMP, PNG or JPEG files.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use glacier_tex::{ArchiveLayout, Session};
//!
//! let mut session = Session::open("scene.tex", ArchiveLayout::Desktop)?;
//! for entry in session.entries() {
//!     println!("{:>5} {} {}x{} {}", entry.index, entry.type1, entry.width, entry.height, entry.file_name);
//! }
//!
//! session.export(12, Path::new("wall.tga"))?;
//! session.import(12, Path::new("wall_edited.png"))?;
//! session.undo(12)?;
//! # Ok::<(), glacier_tex::Error>(())
//! ```

mod backup;
mod error;
mod raster;
mod tga;

pub mod archive;
pub mod entry;
pub mod export;
pub mod import;
pub mod session;

pub use archive::{parse, ArchiveLayout, ContainerHeader, TexArchive};
pub use backup::BackupStore;
pub use entry::{TextureEntry, TextureFormat, TypeTag};
pub use error::{Error, ErrorKind, Result};
pub use raster::FileTarget;
pub use session::Session;

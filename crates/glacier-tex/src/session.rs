//! An open archive with its undo history.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::{self, ArchiveLayout, ContainerHeader, TexArchive};
use crate::backup::BackupStore;
use crate::entry::{TextureEntry, TypeTag};
use crate::{export, import, Error, Result};

/// The entries of one loaded archive plus per-entry backups.
///
/// Entries are addressed by their logical `index` field, not by position.
/// Every mutating operation either fully succeeds or leaves the session
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct Session {
    layout: ArchiveLayout,
    header: Option<ContainerHeader>,
    entries: Vec<TextureEntry>,
    empty_offset_prefix_count: u32,
    backups: BackupStore,
}

impl Session {
    /// Parse an archive held in memory.
    pub fn load(buffer: &[u8], layout: ArchiveLayout) -> Result<Self> {
        Ok(Self::from_archive(archive::parse(buffer, layout)?, layout))
    }

    /// Open an archive file.
    pub fn open<P: AsRef<Path>>(path: P, layout: ArchiveLayout) -> Result<Self> {
        let path = path.as_ref();
        let session = Self::from_archive(TexArchive::open(path, layout)?, layout);
        info!(path = %path.display(), entries = session.entries.len(), "opened archive");
        Ok(session)
    }

    fn from_archive(archive: TexArchive, layout: ArchiveLayout) -> Self {
        let (header, entries, empty_offset_prefix_count) = archive.into_parts();
        Self {
            layout,
            header,
            entries,
            empty_offset_prefix_count,
            backups: BackupStore::new(),
        }
    }

    /// Layout the archive was parsed with.
    #[inline]
    pub fn layout(&self) -> ArchiveLayout {
        self.layout
    }

    /// Desktop header, if any.
    #[inline]
    pub fn header(&self) -> Option<&ContainerHeader> {
        self.header.as_ref()
    }

    /// Empty table slots before the first record.
    #[inline]
    pub fn empty_offset_prefix_count(&self) -> u32 {
        self.empty_offset_prefix_count
    }

    /// All entries in table order.
    #[inline]
    pub fn entries(&self) -> &[TextureEntry] {
        &self.entries
    }

    /// Look up an entry by logical index.
    pub fn entry(&self, index: u32) -> Result<&TextureEntry> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .ok_or(Error::EntryNotFound(index))
    }

    fn position(&self, index: u32) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.index == index)
            .ok_or(Error::EntryNotFound(index))
    }

    /// Export level 0 of an entry.
    pub fn export(&self, index: u32, path: &Path) -> Result<()> {
        export::export(self.entry(index)?, path)
    }

    /// Export one mip level of an entry.
    pub fn export_level(&self, index: u32, level: usize, path: &Path) -> Result<()> {
        export::export_level(self.entry(index)?, level, path)
    }

    /// Export every mip level to its own file.
    pub fn export_all_levels(&self, index: u32, path: &Path) -> Result<Vec<PathBuf>> {
        export::export_all_levels(self.entry(index)?, path)
    }

    /// Export the full mip chain as one DDS file.
    pub fn export_dds_chain(&self, index: u32, path: &Path) -> Result<()> {
        export::export_dds_chain(self.entry(index)?, path)
    }

    /// Replace an entry's payload from a DDS or raster file.
    ///
    /// The previous entry is kept as a backup only if the import succeeds.
    pub fn import(&mut self, index: u32, path: &Path) -> Result<()> {
        let pos = self.position(index)?;
        let updated = import::import(&self.entries[pos], path)?;
        let previous = std::mem::replace(&mut self.entries[pos], updated);
        self.backups.push(previous);
        debug!(index, depth = self.backups.depth(index), "backup recorded");
        Ok(())
    }

    /// Restore the most recent backup of an entry. Returns `false` when
    /// there is nothing to undo.
    pub fn undo(&mut self, index: u32) -> Result<bool> {
        let pos = self.position(index)?;
        match self.backups.pop(index) {
            Some(previous) => {
                self.entries[pos] = previous;
                debug!(index, depth = self.backups.depth(index), "restored backup");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of backups held for an entry.
    pub fn backup_depth(&self, index: u32) -> usize {
        self.backups.depth(index)
    }

    /// Entry count per primary type tag.
    pub fn format_counts(&self) -> BTreeMap<TypeTag, usize> {
        archive::format_counts(&self.entries)
    }

    /// JSON object mapping each logical index to its file name.
    pub fn manifest_json(&self) -> Result<String> {
        let manifest: BTreeMap<u32, &str> = self
            .entries
            .iter()
            .map(|e| (e.index, e.file_name.as_str()))
            .collect();
        Ok(serde_json::to_string_pretty(&manifest)?)
    }
}

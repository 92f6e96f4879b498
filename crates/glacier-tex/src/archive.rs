//! TEX archive parsing.
//!
//! A TEX archive is a flat buffer of texture records located through offset
//! tables. Desktop archives start with a 16-byte header pointing at two
//! 2048-slot tables: the first locates records, the second locates small
//! arrays of cross-reference indices. Console archives have no header; their
//! single table sits at a fixed byte range.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use glacier_common::BinaryReader;
use memmap2::Mmap;
use tracing::{debug, warn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::entry::{TextureEntry, TypeTag};
use crate::{Error, Result};

/// Slots in every offset table.
pub const TABLE_SLOTS: usize = 2048;

/// Byte range of the console offset table.
pub const CONSOLE_TABLE_RANGE: Range<usize> = 0x210..0x2010;

/// How the offset tables are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ArchiveLayout {
    /// Header with two table offsets.
    #[default]
    Desktop,
    /// Fixed-range table, no header, no cross-reference table.
    Console,
}

impl fmt::Display for ArchiveLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => f.write_str("desktop"),
            Self::Console => f.write_str("console"),
        }
    }
}

impl FromStr for ArchiveLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" | "pc" => Ok(Self::Desktop),
            "console" | "ps4" => Ok(Self::Console),
            other => Err(format!("unknown archive layout '{other}' (expected desktop or console)")),
        }
    }
}

/// Desktop archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ContainerHeader {
    pub table1_offset: u32,
    pub table2_offset: u32,
    pub unknown1: u32,
    pub unknown2: u32,
}

/// A parsed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexArchive {
    header: Option<ContainerHeader>,
    entries: Vec<TextureEntry>,
    empty_offset_prefix_count: u32,
}

impl TexArchive {
    /// Memory-map and parse an archive file.
    pub fn open<P: AsRef<Path>>(path: P, layout: ArchiveLayout) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        parse(&mmap, layout)
    }

    /// Desktop header, if the layout has one.
    #[inline]
    pub fn header(&self) -> Option<&ContainerHeader> {
        self.header.as_ref()
    }

    /// Entries in table order.
    #[inline]
    pub fn entries(&self) -> &[TextureEntry] {
        &self.entries
    }

    /// Empty table slots before the first record.
    #[inline]
    pub fn empty_offset_prefix_count(&self) -> u32 {
        self.empty_offset_prefix_count
    }

    /// Entry count per primary type tag.
    pub fn format_counts(&self) -> BTreeMap<TypeTag, usize> {
        format_counts(&self.entries)
    }

    pub(crate) fn into_parts(self) -> (Option<ContainerHeader>, Vec<TextureEntry>, u32) {
        (self.header, self.entries, self.empty_offset_prefix_count)
    }
}

/// Count entries per primary type tag.
pub fn format_counts(entries: &[TextureEntry]) -> BTreeMap<TypeTag, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.type1).or_insert(0) += 1;
    }
    counts
}

/// Parse an archive buffer.
pub fn parse(buffer: &[u8], layout: ArchiveLayout) -> Result<TexArchive> {
    let mut reader = BinaryReader::new(buffer);

    let (header, table1) = match layout {
        ArchiveLayout::Desktop => {
            let header: ContainerHeader = reader.read_struct()?;
            seek_to(&mut reader, header.table1_offset)?;
            (Some(header), reader.read_u32_table(TABLE_SLOTS)?)
        }
        ArchiveLayout::Console => {
            seek_to(&mut reader, CONSOLE_TABLE_RANGE.start as u32)?;
            let slots = CONSOLE_TABLE_RANGE.len() / 4;
            (None, reader.read_u32_table(slots)?)
        }
    };

    let mut entries = Vec::new();
    let mut empty_offset_prefix_count = 0u32;

    for &offset in &table1 {
        if offset == 0 {
            if entries.is_empty() {
                empty_offset_prefix_count += 1;
            }
            continue;
        }
        check_offset(buffer, offset)?;
        entries.push(TextureEntry::read(buffer, offset)?);
    }

    debug!(
        %layout,
        entries = entries.len(),
        empty_offset_prefix_count,
        "parsed offset table"
    );

    if let Some(header) = &header {
        if header.table2_offset != 0 {
            seek_to(&mut reader, header.table2_offset)?;
            let table2 = reader.read_u32_table(TABLE_SLOTS)?;
            attach_indices(buffer, &table2, empty_offset_prefix_count, &mut entries)?;
        }
    }

    Ok(TexArchive {
        header,
        entries,
        empty_offset_prefix_count,
    })
}

fn check_offset(buffer: &[u8], offset: u32) -> Result<()> {
    if offset as usize >= buffer.len() {
        return Err(Error::OffsetOutOfBounds {
            offset,
            len: buffer.len(),
        });
    }
    Ok(())
}

fn seek_to(reader: &mut BinaryReader<'_>, offset: u32) -> Result<()> {
    reader.seek(offset as usize).map_err(|_| Error::OffsetOutOfBounds {
        offset,
        len: reader.len(),
    })
}

/// Resolve each cross-reference record and attach it to its entry.
fn attach_indices(
    buffer: &[u8],
    table2: &[u32],
    empty_offset_prefix_count: u32,
    entries: &mut [TextureEntry],
) -> Result<()> {
    for (slot, &offset) in table2.iter().enumerate() {
        if offset == 0 {
            continue;
        }
        check_offset(buffer, offset)?;

        let indices = read_index_record(buffer, offset)?;
        let Some(canonical) = canonical_index(&indices, empty_offset_prefix_count) else {
            warn!(slot, offset, ?indices, "index record has no usable value, skipping");
            continue;
        };

        match entries.iter_mut().find(|e| i64::from(e.index) == canonical) {
            Some(entry) => entry.indices = Some(indices),
            None => warn!(slot, offset, canonical, "index record matches no entry, skipping"),
        }
    }
    Ok(())
}

fn read_index_record(buffer: &[u8], offset: u32) -> Result<Vec<i32>> {
    let mut reader = BinaryReader::new(buffer);
    reader.seek(offset as usize)?;
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::NegativeCount {
            what: "index",
            count,
            offset: offset as usize,
        });
    }
    let raw = reader.read_bytes(count as usize * 4)?;
    Ok(raw
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// The entry index a cross-reference record belongs to: its last value if
/// nonzero, otherwise the last positive value, corrected by the number of
/// empty slots that preceded the first record.
pub fn canonical_index(indices: &[i32], empty_offset_prefix_count: u32) -> Option<i64> {
    let last = *indices.last()?;
    let value = if last != 0 {
        last
    } else {
        *indices.iter().rev().find(|&&v| v > 0)?
    };
    Some(i64::from(value) - i64::from(empty_offset_prefix_count))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entry::tests::record;

    /// Builds desktop archives: header, table 1, table 2, then records and
    /// index arrays in insertion order.
    pub(crate) struct ArchiveBuilder {
        slots: Vec<Option<Vec<u8>>>,
        index_records: Vec<(usize, Vec<i32>)>,
    }

    impl ArchiveBuilder {
        pub(crate) fn new() -> Self {
            Self {
                slots: vec![None; TABLE_SLOTS],
                index_records: Vec::new(),
            }
        }

        pub(crate) fn record(mut self, slot: usize, bytes: Vec<u8>) -> Self {
            self.slots[slot] = Some(bytes);
            self
        }

        pub(crate) fn index_record(mut self, slot: usize, indices: Vec<i32>) -> Self {
            self.index_records.push((slot, indices));
            self
        }

        pub(crate) fn build(self) -> Vec<u8> {
            let table1_offset = 16usize;
            let table2_offset = table1_offset + TABLE_SLOTS * 4;
            let mut body_offset = table2_offset + TABLE_SLOTS * 4;

            let mut table1 = vec![0u32; TABLE_SLOTS];
            let mut table2 = vec![0u32; TABLE_SLOTS];
            let mut body = Vec::new();

            for (slot, bytes) in self.slots.iter().enumerate() {
                if let Some(bytes) = bytes {
                    table1[slot] = body_offset as u32;
                    body_offset += bytes.len();
                    body.extend_from_slice(bytes);
                }
            }
            for (slot, indices) in &self.index_records {
                table2[*slot] = body_offset as u32;
                let mut bytes = (indices.len() as i32).to_le_bytes().to_vec();
                for v in indices {
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
                body_offset += bytes.len();
                body.extend(bytes);
            }

            let header = ContainerHeader {
                table1_offset: table1_offset as u32,
                table2_offset: table2_offset as u32,
                unknown1: 0,
                unknown2: 0,
            };
            let mut out = header.as_bytes().to_vec();
            out.extend(table1.iter().flat_map(|o| o.to_le_bytes()));
            out.extend(table2.iter().flat_map(|o| o.to_le_bytes()));
            out.extend(body);
            out
        }
    }

    fn dxt1(index: u32, name: &[u8]) -> Vec<u8> {
        record(b"DXT1", index, 4, 4, name, &[vec![index as u8; 8]], None)
    }

    #[test]
    fn test_entry_count_matches_nonzero_slots() {
        let buffer = ArchiveBuilder::new()
            .record(2, dxt1(2, b"a"))
            .record(3, dxt1(3, b"b"))
            .record(7, dxt1(7, b"c"))
            .build();

        let archive = parse(&buffer, ArchiveLayout::Desktop).unwrap();
        assert_eq!(archive.entries().len(), 3);
        assert_eq!(archive.empty_offset_prefix_count(), 2);
        let names: Vec<_> = archive.entries().iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(archive.header().unwrap().table1_offset, 16);
    }

    #[test]
    fn test_indices_resolve_through_prefix_correction() {
        let buffer = ArchiveBuilder::new()
            .record(2, dxt1(0, b"first"))
            .record(3, dxt1(1, b"second"))
            .index_record(0, vec![5, 3])
            .index_record(1, vec![2, 0])
            .index_record(2, vec![0, 0])
            .build();

        let archive = parse(&buffer, ArchiveLayout::Desktop).unwrap();
        let entries = archive.entries();
        // 3 - 2 = 1
        assert_eq!(entries[1].indices.as_deref(), Some(&[5, 3][..]));
        // trailing zero, last positive is 2; 2 - 2 = 0
        assert_eq!(entries[0].indices.as_deref(), Some(&[2, 0][..]));
    }

    #[test]
    fn test_canonical_index() {
        assert_eq!(canonical_index(&[4, 9], 2), Some(7));
        assert_eq!(canonical_index(&[4, 0, 0], 1), Some(3));
        assert_eq!(canonical_index(&[-1, 0], 0), None);
        assert_eq!(canonical_index(&[], 0), None);
    }

    #[test]
    fn test_offset_outside_buffer() {
        let mut buffer = ArchiveBuilder::new().record(0, dxt1(0, b"x")).build();
        let bogus = (buffer.len() as u32 + 100).to_le_bytes();
        buffer[16 + 4..16 + 8].copy_from_slice(&bogus);

        let err = parse(&buffer, ArchiveLayout::Desktop).unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfBounds { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }

    #[test]
    fn test_table_offset_outside_buffer() {
        let mut buffer = ArchiveBuilder::new().build();
        buffer[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            parse(&buffer, ArchiveLayout::Desktop),
            Err(Error::OffsetOutOfBounds { offset: u32::MAX, .. })
        ));
    }

    #[test]
    fn test_console_layout() {
        let rec = dxt1(9, b"console");
        let mut buffer = vec![0u8; CONSOLE_TABLE_RANGE.end];
        let offset = buffer.len() as u32;
        // slot 1; slot 0 stays empty
        let slot = CONSOLE_TABLE_RANGE.start + 4;
        buffer[slot..slot + 4].copy_from_slice(&offset.to_le_bytes());
        buffer.extend(rec);

        let archive = parse(&buffer, ArchiveLayout::Console).unwrap();
        assert!(archive.header().is_none());
        assert_eq!(archive.empty_offset_prefix_count(), 1);
        assert_eq!(archive.entries()[0].index, 9);
        assert_eq!(archive.entries()[0].file_name, "console");
    }

    #[test]
    fn test_format_counts() {
        let buffer = ArchiveBuilder::new()
            .record(0, dxt1(0, b"a"))
            .record(1, dxt1(1, b"b"))
            .record(2, record(b"I8  ", 2, 1, 1, b"c", &[vec![7]], None))
            .build();
        let counts = parse(&buffer, ArchiveLayout::Desktop).unwrap().format_counts();
        assert_eq!(counts[&TypeTag::DXT1], 2);
        assert_eq!(counts[&TypeTag::I8], 1);
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Console".parse::<ArchiveLayout>().unwrap(), ArchiveLayout::Console);
        assert_eq!("desktop".parse::<ArchiveLayout>().unwrap(), ArchiveLayout::Desktop);
        assert!("xbox".parse::<ArchiveLayout>().is_err());
    }
}

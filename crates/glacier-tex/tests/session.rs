//! End-to-end: synthetic archive through load, export, import and undo.

use std::fs;
use std::path::Path;

use glacier_dds::DdsVariant;
use glacier_tex::{ArchiveLayout, ErrorKind, Session, TexArchive, TypeTag};

const SLOTS: usize = 2048;

fn record(
    tag: &[u8; 4],
    index: u32,
    width: u16,
    height: u16,
    name: &str,
    levels: &[Vec<u8>],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes());
    let mut stored = *tag;
    stored.reverse();
    out.extend_from_slice(&stored);
    out.extend_from_slice(&stored);
    out.extend_from_slice(&index.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&(levels.len() as u32).to_le_bytes());
    out.extend_from_slice(&[0xAB; 12]);
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    for level in levels {
        out.extend_from_slice(&(level.len() as u32).to_le_bytes());
        out.extend_from_slice(level);
    }
    out
}

/// Desktop archive with `records` in consecutive slots starting at `first_slot`
/// and one cross-reference record per entry.
fn archive(first_slot: usize, records: &[Vec<u8>], references: &[Vec<i32>]) -> Vec<u8> {
    let table1 = 16;
    let table2 = table1 + SLOTS * 4;
    let mut body_offset = table2 + SLOTS * 4;

    let mut out = Vec::new();
    out.extend_from_slice(&(table1 as u32).to_le_bytes());
    out.extend_from_slice(&(table2 as u32).to_le_bytes());
    out.extend_from_slice(&[0; 8]);

    let mut offsets1 = vec![0u32; SLOTS];
    let mut offsets2 = vec![0u32; SLOTS];
    let mut body = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        offsets1[first_slot + i] = body_offset as u32;
        body_offset += rec.len();
        body.extend_from_slice(rec);
    }
    for (i, refs) in references.iter().enumerate() {
        offsets2[i] = body_offset as u32;
        body.extend_from_slice(&(refs.len() as i32).to_le_bytes());
        for r in refs {
            body.extend_from_slice(&r.to_le_bytes());
        }
        body_offset += 4 + refs.len() * 4;
    }

    out.extend(offsets1.iter().flat_map(|o| o.to_le_bytes()));
    out.extend(offsets2.iter().flat_map(|o| o.to_le_bytes()));
    out.extend(body);
    out
}

fn dxt1_chain() -> Vec<Vec<u8>> {
    // 16x16: 4x4 blocks, then 2x2, then clamped
    vec![
        (0..128).map(|b| b as u8).collect(),
        (0..32).map(|b| (b * 3) as u8).collect(),
        vec![0x55; 8],
        vec![0xAA; 8],
    ]
}

fn sky_pixels() -> Vec<u8> {
    (0..16u8).map(|b| if b % 4 == 3 { 0xFF } else { b * 10 }).collect()
}

fn sample_archive() -> Vec<u8> {
    archive(
        3,
        &[
            record(b"DXT1", 0, 16, 16, "rock", &dxt1_chain()),
            record(b"RGBA", 1, 2, 2, "sky", &[sky_pixels(), vec![1, 2, 3, 4]]),
        ],
        &[vec![7, 3], vec![4, 0]],
    )
}

#[test]
fn parse_attaches_references() {
    let buffer = sample_archive();
    let archive = glacier_tex::parse(&buffer, ArchiveLayout::Desktop).unwrap();

    assert_eq!(archive.entries().len(), 2);
    assert_eq!(archive.empty_offset_prefix_count(), 3);
    // 3 - 3 = 0, 4 - 3 = 1
    assert_eq!(archive.entries()[0].indices.as_deref(), Some(&[7, 3][..]));
    assert_eq!(archive.entries()[1].indices.as_deref(), Some(&[4, 0][..]));
    assert_eq!(archive.format_counts()[&TypeTag::RGBA], 1);
    assert_eq!(archive.entries()[0].unknown, [0xABAB_ABAB; 3]);
}

#[test]
fn open_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.tex");
    fs::write(&path, sample_archive()).unwrap();

    let archive = TexArchive::open(&path, ArchiveLayout::Desktop).unwrap();
    assert_eq!(archive.entries()[1].file_name, "sky");

    let missing = Session::open(dir.path().join("nope.tex"), ArchiveLayout::Desktop).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Io);
}

#[test]
fn dds_chain_roundtrip_then_undo() {
    let dir = tempfile::tempdir().unwrap();
    let dds = dir.path().join("rock.dds");

    let mut session = Session::load(&sample_archive(), ArchiveLayout::Desktop).unwrap();
    let original = session.entry(0).unwrap().clone();

    session.export_dds_chain(0, &dds).unwrap();
    session.import(0, &dds).unwrap();

    let reimported = session.entry(0).unwrap();
    assert_eq!(reimported.data, original.data);
    assert_eq!(reimported.level_sizes, original.level_sizes);
    assert_eq!(reimported.indices, original.indices);
    assert_eq!(reimported.file_size, reimported.computed_file_size());
    assert_eq!(session.backup_depth(0), 1);

    assert!(session.undo(0).unwrap());
    assert_eq!(session.entry(0).unwrap(), &original);
}

#[test]
fn rejected_dds_leaves_entry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(&sample_archive(), ArchiveLayout::Desktop).unwrap();
    let before = session.entry(1).unwrap().clone();

    // valid DXT1 file offered to an RGBA entry
    let dxt = dir.path().join("wrong.dds");
    session.export_dds_chain(0, &dxt).unwrap();
    let err = session.import(1, &dxt).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // A8R8G8B8 file with a broken red mask
    let masked = dir.path().join("masked.dds");
    session.export(1, &masked).unwrap();
    let mut bytes = fs::read(&masked).unwrap();
    bytes[92..96].copy_from_slice(&0xFFu32.to_le_bytes());
    fs::write(&masked, &bytes).unwrap();
    let err = session.import(1, &masked).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(session.entry(1).unwrap(), &before);
    assert_eq!(session.backup_depth(1), 0);
}

#[test]
fn raster_exports_decode() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(&sample_archive(), ArchiveLayout::Desktop).unwrap();

    for ext in ["tga", "png", "bmp"] {
        let path = dir.path().join(format!("sky.{ext}"));
        session.export(1, &path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.into_raw(), sky_pixels(), "{ext}");
    }

    let jpeg = dir.path().join("rock.jpg");
    session.export(0, &jpeg).unwrap();
    assert_eq!(image::open(&jpeg).unwrap().to_rgb8().dimensions(), (16, 16));

    let levels = session.export_all_levels(0, &dir.path().join("rock.png")).unwrap();
    let names: Vec<_> = levels
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["rock_16x16.png", "rock_8x8.png", "rock_4x4.png", "rock_2x2.png"]);
    assert!(levels.iter().all(|p| p.exists()));
}

#[test]
fn single_level_dds_export_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(&sample_archive(), ArchiveLayout::Desktop).unwrap();
    let path = dir.path().join("rock_level1.dds");
    session.export_level(0, 1, &path).unwrap();

    let surface =
        glacier_dds::decode_and_validate(&mut fs::File::open(&path).unwrap(), DdsVariant::Dxt1)
            .unwrap();
    assert_eq!((surface.width, surface.height), (8, 8));
    assert_eq!(surface.levels, [dxt1_chain()[1].clone()]);

    let err = session.export_level(0, 9, Path::new("x.dds")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn console_archive_opens_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene_ps4.tex");

    // headerless: offset table at 0x210..0x2010, slot 0 empty
    let mut buffer = vec![0u8; 0x2010];
    let offset = buffer.len() as u32;
    buffer[0x214..0x218].copy_from_slice(&offset.to_le_bytes());
    buffer.extend(record(b"RGBA", 6, 2, 2, "sky", &[sky_pixels(), vec![1, 2, 3, 4]]));
    fs::write(&path, buffer).unwrap();

    let session = Session::open(&path, ArchiveLayout::Console).unwrap();
    assert_eq!(session.layout(), ArchiveLayout::Console);
    assert!(session.header().is_none());
    assert_eq!(session.empty_offset_prefix_count(), 1);
    assert_eq!(session.entries().len(), 1);

    let entry = session.entry(6).unwrap();
    assert_eq!(entry.file_name, "sky");
    assert_eq!(entry.indices, None);
    assert_eq!(entry.data[0], sky_pixels());
}

#[test]
fn non_square_levels_export_to_raster() {
    let dir = tempfile::tempdir().unwrap();
    // 8x2 RGBA stores 64, 16, 4 bytes; levels are 8x2, 4x1, 2x1
    let wide = (0..64u8).collect::<Vec<_>>();
    let buffer = archive(
        0,
        &[record(b"RGBA", 2, 8, 2, "strip", &[wide.clone(), vec![7; 16], vec![9; 4]])],
        &[],
    );
    let session = Session::load(&buffer, ArchiveLayout::Desktop).unwrap();

    let level2 = dir.path().join("strip_level2.png");
    session.export_level(2, 2, &level2).unwrap();
    let decoded = image::open(&level2).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.into_raw(), [9, 9, 9, 9, 0, 0, 0, 0]);

    let levels = session.export_all_levels(2, &dir.path().join("strip.tga")).unwrap();
    let dims: Vec<_> = levels
        .iter()
        .map(|p| image::open(p).unwrap().to_rgba8().dimensions())
        .collect();
    assert_eq!(dims, [(8, 2), (4, 1), (2, 1)]);
    assert_eq!(image::open(&levels[0]).unwrap().to_rgba8().into_raw(), wide);
}

#[test]
fn hostile_dds_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(&sample_archive(), ArchiveLayout::Desktop).unwrap();
    let before = session.entry(1).unwrap().clone();

    let good = dir.path().join("sky.dds");
    session.export_dds_chain(1, &good).unwrap();
    let bytes = fs::read(&good).unwrap();

    // mipmap_count
    let mut levels = bytes.clone();
    levels[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
    let path = dir.path().join("levels.dds");
    fs::write(&path, &levels).unwrap();
    assert_eq!(session.import(1, &path).unwrap_err().kind(), ErrorKind::Format);

    // height and width
    let mut huge = bytes;
    huge[12..20].copy_from_slice(&[0xFF; 8]);
    let path = dir.path().join("huge.dds");
    fs::write(&path, &huge).unwrap();
    assert_eq!(session.import(1, &path).unwrap_err().kind(), ErrorKind::Format);

    assert_eq!(session.entry(1).unwrap(), &before);
    assert_eq!(session.backup_depth(1), 0);
}

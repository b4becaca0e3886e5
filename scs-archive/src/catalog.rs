//! Catalog parsing for both container layouts.
//!
//! The legacy layout stores a fixed-stride array of typed records at a
//! fixed offset. The hashed-catalog layout stores two zlib-compressed
//! tables: fixed 16-byte catalog records, and variable metadata records
//! joined to them by index. Either way the result is a flat list of
//! [`FileEntry`] values keyed by path hash, names still unassigned.

use std::io::Read;

use tracing::debug;

use crate::file::FileEntry;
use crate::header::{HashedHeader, LEGACY_CATALOG_OFFSET, LEGACY_COUNT_OFFSET};
use crate::ioutils::ReadInt;
use crate::meta::{self, FLAG_COMPRESSED_DIR};
use crate::source::{ReadAt, SectionReader};
use crate::{Error, Result};

/// Stride of a legacy catalog record.
const LEGACY_ENTRY_SIZE: u64 = 32;

/// Legacy kind tags span `0..=7`: bit 1 marks a directory listing, bit 0 a
/// compressed payload. Tags 4..=7 are copies, treated as their low two
/// bits' counterparts.
const LEGACY_KIND_MAX: i32 = 7;
const LEGACY_KIND_COMPRESSED: i32 = 0b01;
const LEGACY_KIND_DIRECTORY: i32 = 0b10;

/// Parse the legacy fixed-stride catalog.
pub(crate) fn parse_legacy_catalog<R: ReadAt + ?Sized>(source: &R) -> Result<Vec<FileEntry>> {
    let mut count_buf = [0u8; 4];
    source.read_exact_at(&mut count_buf, LEGACY_COUNT_OFFSET)?;
    let entry_count = i32::from_le_bytes(count_buf).max(0) as u64;
    debug!(entries = entry_count, "parsing legacy catalog");

    let mut f = SectionReader::new(
        source,
        LEGACY_CATALOG_OFFSET,
        entry_count * LEGACY_ENTRY_SIZE,
    );

    let mut files = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let hash = f.read_u64le()?;
        let offset = f.read_i32le()?;
        let _reserved = f.read_u32le()?;
        let kind = f.read_i32le()?;
        let _crc = f.read_u32le()?;
        let size = f.read_i32le()?;
        let zsize = f.read_i32le()?;

        if !(0..=LEGACY_KIND_MAX).contains(&kind) {
            return Err(Error::UnknownEntryKind(kind));
        }

        files.push(FileEntry {
            name: None,
            hash,
            size: size as u32,
            compressed_size: zsize as u32,
            is_compressed: kind & LEGACY_KIND_COMPRESSED != 0,
            is_directory: kind & LEGACY_KIND_DIRECTORY != 0,
            offset: offset as u32 as u64,
        });
    }

    Ok(files)
}

/// One record of the hashed-catalog entry table.
struct CatalogRecord {
    hash: u64,
    metadata_index: u32,
    metadata_count: u16,
    #[allow(dead_code, reason = "part of the on-disk record, meaning unknown")]
    flags: u16,
}

/// Parse the hashed-catalog tables and join them into the file list.
pub(crate) fn parse_hashed_catalog<R: ReadAt + ?Sized>(
    source: &R,
    header: &HashedHeader,
) -> Result<Vec<FileEntry>> {
    let entry_table = inflate_table(
        source,
        header.entry_table_start,
        u64::from(header.entry_table_len),
    )?;
    let meta_table = inflate_table(
        source,
        header.meta_table_start,
        u64::from(header.meta_table_len),
    )?;
    let metadata = meta::parse_meta_table(&meta_table)?;

    let mut records = Vec::with_capacity(header.entry_count as usize);
    let mut f = entry_table.as_slice();
    for _ in 0..header.entry_count {
        records.push(CatalogRecord {
            hash: f.read_u64le()?,
            metadata_index: f.read_u32le()?,
            metadata_count: f.read_u16le()?,
            flags: f.read_u16le()?,
        });
    }

    // Metadata records are emitted in a different order than catalog
    // records; the file list follows metadata order.
    records.sort_by_key(|r| r.metadata_index);

    let mut files = Vec::with_capacity(records.len());
    for record in records {
        // A record's metadata lives at the key one run past its index.
        let key = record.metadata_index.wrapping_add(u32::from(record.metadata_count));
        let meta = metadata.get(&key).ok_or(Error::MissingMetadata {
            hash: record.hash,
            key,
        })?;

        files.push(FileEntry {
            name: None,
            hash: record.hash,
            size: meta.size,
            compressed_size: meta.compressed_size,
            is_compressed: meta.is_compressed || (meta.flags & FLAG_COMPRESSED_DIR) != 0,
            is_directory: meta.is_directory,
            offset: meta.offset,
        });
    }

    debug!(files = files.len(), "parsed hashed catalog");
    Ok(files)
}

/// Inflate a zlib-compressed catalog table into memory.
fn inflate_table<R: ReadAt + ?Sized>(source: &R, start: u64, len: u64) -> Result<Vec<u8>> {
    let section = SectionReader::new(source, start, len);
    let mut table = Vec::new();
    flate2::read::ZlibDecoder::new(section)
        .read_to_end(&mut table)
        .map_err(|e| Error::Decompression(format!("inflating catalog table: {e}")))?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn legacy_entry(hash: u64, offset: i32, kind: i32, size: i32, zsize: i32) -> Vec<u8> {
        let mut r = Vec::new();
        r.extend_from_slice(&hash.to_le_bytes());
        r.extend_from_slice(&offset.to_le_bytes());
        r.extend_from_slice(&[0u8; 4]); // reserved
        r.extend_from_slice(&kind.to_le_bytes());
        r.extend_from_slice(&0xDEADBEEFu32.to_le_bytes()); // crc
        r.extend_from_slice(&size.to_le_bytes());
        r.extend_from_slice(&zsize.to_le_bytes());
        r
    }

    fn legacy_archive(entries: &[Vec<u8>]) -> Vec<u8> {
        let mut a = Vec::new();
        a.extend_from_slice(b"SCS#");
        a.resize(0x0C, 0);
        a.extend_from_slice(&(entries.len() as i32).to_le_bytes());
        a.resize(0x1000, 0);
        for e in entries {
            a.extend_from_slice(e);
        }
        a
    }

    #[test]
    fn legacy_kind_bits_decode() {
        let archive = legacy_archive(&[
            legacy_entry(1, 0x40, 0, 10, 10),
            legacy_entry(2, 0x80, 1, 20, 15),
            legacy_entry(3, 0xC0, 2, 30, 30),
            legacy_entry(4, 0x100, 3, 40, 25),
        ]);
        let files = parse_legacy_catalog(&archive).unwrap();
        assert_eq!(files.len(), 4);
        assert!(!files[0].is_compressed && !files[0].is_directory);
        assert!(files[1].is_compressed && !files[1].is_directory);
        assert!(!files[2].is_compressed && files[2].is_directory);
        assert!(files[3].is_compressed && files[3].is_directory);
    }

    #[test]
    fn legacy_copy_kinds_match_their_base_kinds() {
        let archive = legacy_archive(&[
            legacy_entry(1, 0x40, 5, 10, 8),
            legacy_entry(2, 0x80, 6, 20, 20),
        ]);
        let files = parse_legacy_catalog(&archive).unwrap();
        assert!(files[0].is_compressed && !files[0].is_directory);
        assert!(!files[1].is_compressed && files[1].is_directory);
    }

    #[test]
    fn legacy_out_of_range_kind_is_fatal() {
        let archive = legacy_archive(&[legacy_entry(1, 0x40, 8, 0, 0)]);
        match parse_legacy_catalog(&archive) {
            Err(Error::UnknownEntryKind(8)) => {}
            other => panic!("expected UnknownEntryKind, got {other:?}"),
        }
    }

    fn catalog_record(hash: u64, metadata_index: u32, metadata_count: u16) -> Vec<u8> {
        let mut r = Vec::new();
        r.extend_from_slice(&hash.to_le_bytes());
        r.extend_from_slice(&metadata_index.to_le_bytes());
        r.extend_from_slice(&metadata_count.to_le_bytes());
        r.extend_from_slice(&0u16.to_le_bytes());
        r
    }

    fn meta_record(index: u32, kind: u8, offset_block: u32, size: u32) -> Vec<u8> {
        let mut r = Vec::new();
        r.extend_from_slice(&index.to_le_bytes()[..3]);
        r.push(kind);
        r.extend_from_slice(&size.to_le_bytes()[..3]); // compressed size
        r.push(0); // flags
        r.extend_from_slice(&size.to_le_bytes());
        r.extend_from_slice(&0u32.to_le_bytes()); // unknown
        r.extend_from_slice(&offset_block.to_le_bytes());
        r
    }

    fn hashed_header(entry_count: u32, entry_table: &[u8], meta_table: &[u8]) -> HashedHeader {
        HashedHeader {
            version: 2,
            salt: 0,
            hash_method: *b"CITY",
            entry_count,
            entry_table_len: entry_table.len() as u32,
            meta_entry_count: 0,
            meta_table_len: meta_table.len() as u32,
            entry_table_start: 0x100,
            meta_table_start: 0x100 + entry_table.len() as u64,
            security_desc_offset: 0,
            platform: 0,
        }
    }

    fn hashed_archive(entry_table: &[u8], meta_table: &[u8]) -> Vec<u8> {
        let mut a = vec![0u8; 0x100];
        a.extend_from_slice(entry_table);
        a.extend_from_slice(meta_table);
        a
    }

    #[test]
    fn join_offsets_by_metadata_count() {
        // Catalog record with a nonzero run length must resolve to the
        // record at index + count, not at its own index.
        let entry_table = deflate(&catalog_record(0xAB, 1, 2));
        let mut metas = meta_record(1, 0x80, 1, 11);
        metas.extend_from_slice(&meta_record(3, 0x80, 2, 22));
        let meta_table = deflate(&metas);

        let header = hashed_header(1, &entry_table, &meta_table);
        let archive = hashed_archive(&entry_table, &meta_table);
        let files = parse_hashed_catalog(&archive, &header).unwrap();

        assert_eq!(files[0].size, 22);
        assert_eq!(files[0].offset, 32);
    }

    #[test]
    fn files_follow_metadata_order() {
        let mut recs = catalog_record(0xB, 1, 0);
        recs.extend_from_slice(&catalog_record(0xA, 0, 0));
        let entry_table = deflate(&recs);
        let mut metas = meta_record(0, 0x80, 1, 1);
        metas.extend_from_slice(&meta_record(1, 0x80, 2, 2));
        let meta_table = deflate(&metas);

        let header = hashed_header(2, &entry_table, &meta_table);
        let archive = hashed_archive(&entry_table, &meta_table);
        let files = parse_hashed_catalog(&archive, &header).unwrap();

        assert_eq!(files[0].hash, 0xA);
        assert_eq!(files[1].hash, 0xB);
    }

    #[test]
    fn dangling_metadata_reference_is_fatal() {
        let entry_table = deflate(&catalog_record(0xCD, 9, 0));
        let meta_table = deflate(&meta_record(0, 0x80, 1, 1));

        let header = hashed_header(1, &entry_table, &meta_table);
        let archive = hashed_archive(&entry_table, &meta_table);
        match parse_hashed_catalog(&archive, &header) {
            Err(Error::MissingMetadata { hash: 0xCD, key: 9 }) => {}
            other => panic!("expected MissingMetadata, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_table_reports_decompression() {
        let entry_table = vec![0xFF; 16]; // not a zlib stream
        let meta_table = deflate(&[]);
        let header = hashed_header(0, &entry_table, &meta_table);
        let archive = hashed_archive(&entry_table, &meta_table);
        match parse_hashed_catalog(&archive, &header) {
            Err(Error::Decompression(_)) => {}
            other => panic!("expected Decompression, got {other:?}"),
        }
    }
}

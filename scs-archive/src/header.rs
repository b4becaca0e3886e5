//! Archive header validation and layout detection.

use std::io::Read;

use tracing::debug;

use crate::ioutils::ReadInt;
use crate::source::{ReadAt, SectionReader};
use crate::{Error, Result};

/// Archive magic, shared by both layouts.
pub(crate) const MAGIC: [u8; 4] = *b"SCS#";

/// Hash method tag required by the hashed-catalog layout.
pub(crate) const HASH_METHOD_CITY: [u8; 4] = *b"CITY";

/// Version value that selects the hashed-catalog layout.
pub(crate) const HASHED_CATALOG_VERSION: u16 = 2;

/// Offset of the entry count in the legacy layout.
pub(crate) const LEGACY_COUNT_OFFSET: u64 = 0x0C;

/// Offset of the first catalog record in the legacy layout.
pub(crate) const LEGACY_CATALOG_OFFSET: u64 = 0x1000;

/// The two container layouts found in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Fixed-stride catalog of typed entries at a fixed offset.
    V1,
    /// Compressed entry and metadata tables indexed by path hash.
    V2,
}

/// Header of the hashed-catalog layout, 49 packed bytes.
#[derive(Debug)]
pub(crate) struct HashedHeader {
    pub version: u16,
    #[allow(dead_code)]
    pub salt: u16,
    pub hash_method: [u8; 4],
    pub entry_count: u32,
    pub entry_table_len: u32,
    #[allow(dead_code)]
    pub meta_entry_count: u32,
    pub meta_table_len: u32,
    pub entry_table_start: u64,
    pub meta_table_start: u64,
    #[allow(dead_code)]
    pub security_desc_offset: u32,
    #[allow(dead_code)]
    pub platform: u8,
}

/// Validate the magic and probe the version field to pick a layout.
pub(crate) fn detect_dialect<R: ReadAt + ?Sized>(source: &R) -> Result<Dialect> {
    let mut probe = [0u8; 6];
    source.read_exact_at(&mut probe, 0)?;

    let magic: [u8; 4] = probe[..4].try_into().unwrap();
    if magic != MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let version = u16::from_le_bytes([probe[4], probe[5]]);
    let dialect = if version == HASHED_CATALOG_VERSION {
        Dialect::V2
    } else {
        Dialect::V1
    };
    debug!(version, ?dialect, "detected archive layout");
    Ok(dialect)
}

impl HashedHeader {
    pub(crate) const SIZE: u64 = 49;

    /// Parse and validate the hashed-catalog header.
    pub(crate) fn parse<R: ReadAt + ?Sized>(source: &R) -> Result<Self> {
        let mut f = SectionReader::new(source, 0, Self::SIZE);

        let mut magic = [0u8; 4];
        f.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let version = f.read_u16le()?;
        let salt = f.read_u16le()?;
        let mut hash_method = [0u8; 4];
        f.read_exact(&mut hash_method)?;

        let header = Self {
            version,
            salt,
            hash_method,
            entry_count: f.read_u32le()?,
            entry_table_len: f.read_u32le()?,
            meta_entry_count: f.read_u32le()?,
            meta_table_len: f.read_u32le()?,
            entry_table_start: f.read_u64le()?,
            meta_table_start: f.read_u64le()?,
            security_desc_offset: f.read_u32le()?,
            platform: f.read_u8()?,
        };

        if header.hash_method != HASH_METHOD_CITY {
            return Err(Error::UnsupportedHashMethod(header.hash_method));
        }
        if header.version != HASHED_CATALOG_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }

        debug!(
            entries = header.entry_count,
            meta_entries = header.meta_entry_count,
            "parsed hashed-catalog header"
        );
        Ok(header)
    }
}

//! Metadata records of the hashed-catalog layout.
//!
//! The metadata table is a concatenation of variable-length records with
//! no record count; it is read until the stream runs out. Each record is a
//! 4-byte header (3-byte index, 1-byte type) followed by a type-dependent
//! body. Only the types the archives actually use for payload location are
//! understood; the format defines further texture-mip and sample types,
//! and any of those is rejected with the offending tag.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use tracing::trace;

use crate::ioutils::ReadInt;
use crate::{Error, Result};

const META_TYPE_IMAGE: u8 = 0x01;
const META_TYPE_PLAIN: u8 = 0x80;
const META_TYPE_DIRECTORY: u8 = 0x81;

/// Payload offsets are stored in 16-byte blocks.
const OFFSET_BLOCK_SIZE: u64 = 16;

/// Bit in [`MetaRecord::flags`] marking a compressed directory listing.
pub(crate) const FLAG_COMPRESSED_DIR: u8 = 0x10;

/// One metadata record, reduced to what locating the payload needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetaRecord {
    pub offset: u64,
    pub compressed_size: u32,
    pub size: u32,
    pub flags: u8,
    pub is_directory: bool,
    pub is_compressed: bool,
}

/// Parse the inflated metadata table, keyed by each record's own index.
pub(crate) fn parse_meta_table(bytes: &[u8]) -> Result<HashMap<u32, MetaRecord>> {
    let mut table = HashMap::new();
    let mut f = Cursor::new(bytes);

    while (f.position() as usize) < bytes.len() {
        let index = f.read_u24le()?;
        let kind = f.read_u8()?;

        let record = match kind {
            META_TYPE_DIRECTORY => parse_plain_body(&mut f, true)?,
            META_TYPE_PLAIN => parse_plain_body(&mut f, false)?,
            META_TYPE_IMAGE => parse_image_body(&mut f)?,
            other => return Err(Error::UnknownMetaEntryType(other)),
        };

        trace!(index, kind, offset = record.offset, "metadata record");
        table.insert(index, record);
    }

    Ok(table)
}

/// Body shared by the `Directory` and `Plain` record types.
fn parse_plain_body(f: &mut impl Read, is_directory: bool) -> Result<MetaRecord> {
    let compressed_size = f.read_u24le()?;
    let flags = f.read_u8()?;
    let size = f.read_u32le()?;
    let _unknown = f.read_u32le()?;
    let offset_block = f.read_u32le()?;

    Ok(MetaRecord {
        offset: u64::from(offset_block) * OFFSET_BLOCK_SIZE,
        compressed_size,
        size,
        flags,
        is_directory,
        is_compressed: false,
    })
}

/// Body of the `Image` record type. The texture dimensions and sampling
/// flags are skipped; only the payload location matters here. The size
/// field doubles as the compression flag: a set high nibble in its fourth
/// byte means the payload is compressed. No uncompressed size is stored,
/// so `size` mirrors `compressed_size`.
fn parse_image_body(f: &mut impl Read) -> Result<MetaRecord> {
    let _unknown1 = f.read_u64le()?;
    let _tex_width = f.read_u16le()?;
    let _tex_height = f.read_u16le()?;
    let _img_flags = f.read_u32le()?;
    let _sample_flags = f.read_u32le()?;
    let mut size_raw = [0u8; 4];
    f.read_exact(&mut size_raw)?;
    let mut _unknown3 = [0u8; 8];
    f.read_exact(&mut _unknown3)?;
    let offset_block = f.read_u32le()?;

    let compressed_size = u32::from_le_bytes(size_raw);
    Ok(MetaRecord {
        offset: u64::from(offset_block) * OFFSET_BLOCK_SIZE,
        compressed_size,
        size: compressed_size,
        flags: 0,
        is_directory: false,
        is_compressed: (size_raw[3] & 0xF0) != 0,
    })
}

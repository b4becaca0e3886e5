//! Error types for archive parsing and name resolution.

use thiserror::Error;

/// Errors raised while opening an archive or resolving its file tree.
///
/// All of these are fatal to the operation that raised them; none are
/// retriable. A failed [`crate::Reader::new`] never yields a partial
/// reader.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying positioned read failed, or a fixed record ended early.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The first four bytes are not `SCS#`.
    #[error("invalid archive magic: {}", hex::encode(.0))]
    BadMagic([u8; 4]),

    /// The header declares a version this reader does not understand.
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u16),

    /// The hashed-catalog header names a hash method other than `CITY`.
    #[error("unsupported hash method: {}", hex::encode(.0))]
    UnsupportedHashMethod([u8; 4]),

    /// A legacy catalog entry carries a kind tag outside `0..=7`.
    #[error("unknown catalog entry kind: {0}")]
    UnknownEntryKind(i32),

    /// A metadata record carries an unrecognized type byte.
    #[error("unknown metadata entry type: {0:#04x}")]
    UnknownMetaEntryType(u8),

    /// A catalog record points at a metadata key that does not exist.
    #[error("entry {hash:#018x} references missing metadata record {key}")]
    MissingMetadata { hash: u64, key: u32 },

    /// A catalog table failed to inflate.
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Neither the empty path nor `locale` hashes to a catalog entry.
    #[error("no root entry found")]
    NoRootEntry,

    /// A directory listing names a child whose hash is not in the catalog.
    #[error("reference to void: {0}")]
    ReferenceToVoid(String),

    /// A directory listing contains no entries.
    #[error("no entries in directory listing: {0:?}")]
    EmptyDirectory(String),

    /// A directory listing contains a zero-length name.
    #[error("empty name in directory listing: {0:?}")]
    EmptyName(String),

    /// A directory listing contains a name that is not valid UTF-8.
    #[error("malformed name in directory listing: {0:?}")]
    MalformedName(String),
}

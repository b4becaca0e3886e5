//! The archive reader: header, catalog, and name resolution in one pass.

use tracing::debug;

use crate::catalog;
use crate::file::{FileEntry, PayloadReader};
use crate::header::{self, Dialect, HashedHeader};
use crate::resolver;
use crate::source::ReadAt;
use crate::Result;

/// An opened SCS# archive.
///
/// Construction parses the catalog and reconstructs every reachable file
/// name; it either yields a fully populated reader or an error, never a
/// partial result. Afterwards the reader is immutable and can be shared:
/// [`Reader::open`] takes `&self`, so payload streams over distinct
/// entries may coexist as long as the source supports concurrent
/// positioned reads.
pub struct Reader<R> {
    source: R,
    dialect: Dialect,
    files: Vec<FileEntry>,
}

impl<R: ReadAt> Reader<R> {
    /// Open an archive over the given source.
    pub fn new(source: R) -> Result<Self> {
        let dialect = header::detect_dialect(&source)?;

        let mut files = match dialect {
            Dialect::V1 => catalog::parse_legacy_catalog(&source)?,
            Dialect::V2 => {
                let header = HashedHeader::parse(&source)?;
                catalog::parse_hashed_catalog(&source, &header)?
            }
        };

        resolver::resolve_names(&source, dialect, &mut files)?;
        debug!(files = files.len(), ?dialect, "opened archive");

        Ok(Self {
            source,
            dialect,
            files,
        })
    }

    /// The layout this archive uses.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Every catalog entry, in catalog order. Entries the resolver never
    /// reached are present with no name.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Look up an entry by its reconstructed path.
    pub fn find(&self, name: &str) -> Option<&FileEntry> {
        let hash = b0rkhash::city_hash_64(name.as_bytes());
        self.files.iter().find(|f| f.hash == hash)
    }

    /// Open a streaming reader over an entry's payload.
    pub fn open(&self, entry: &FileEntry) -> Result<PayloadReader<'_, R>> {
        Ok(PayloadReader::open(&self.source, entry))
    }
}

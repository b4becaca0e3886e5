//! File entries and payload streaming.

use std::io::{self, Read};

use flate2::read::DeflateDecoder;

use crate::source::{ReadAt, SectionReader};

/// Compressed payloads are zlib streams; the 2-byte stream header is
/// skipped and the remainder decoded as raw DEFLATE.
const ZLIB_HEADER_SIZE: u64 = 2;

/// One entry of the archive catalog.
///
/// Entries are identified on disk solely by the 64-bit hash of their
/// root-relative path. `name` is reconstructed from the archive's
/// directory listings while the reader is built and stays `None` for
/// entries no listing reaches.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Reconstructed path, relative to the archive root. `None` for
    /// orphaned entries.
    pub name: Option<String>,

    /// Hash of the root-relative path.
    pub hash: u64,

    /// Uncompressed payload size in bytes.
    pub size: u32,

    /// Stored payload size in bytes.
    pub compressed_size: u32,

    /// Whether the payload is a zlib stream.
    pub is_compressed: bool,

    /// Whether the payload is a directory listing.
    pub is_directory: bool,

    pub(crate) offset: u64,
}

impl FileEntry {
    /// The reconstructed path, if the entry was reachable from the root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A streaming reader over one entry's payload.
///
/// Independent of any other open payload; dropping it releases the
/// decoder. Obtained from [`crate::Reader::open`].
pub struct PayloadReader<'a, R: ReadAt + ?Sized> {
    inner: Inner<'a, R>,
}

enum Inner<'a, R: ReadAt + ?Sized> {
    Raw(SectionReader<'a, R>),
    Deflate(DeflateDecoder<SectionReader<'a, R>>),
}

impl<'a, R: ReadAt + ?Sized> PayloadReader<'a, R> {
    pub(crate) fn open(source: &'a R, entry: &FileEntry) -> Self {
        let inner = if entry.is_compressed {
            let section = SectionReader::new(
                source,
                entry.offset + ZLIB_HEADER_SIZE,
                u64::from(entry.compressed_size),
            );
            Inner::Deflate(DeflateDecoder::new(section))
        } else {
            Inner::Raw(SectionReader::new(source, entry.offset, u64::from(entry.size)))
        };
        Self { inner }
    }
}

impl<R: ReadAt + ?Sized> Read for PayloadReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Raw(section) => section.read(buf),
            Inner::Deflate(decoder) => decoder.read(buf),
        }
    }
}

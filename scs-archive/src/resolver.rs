//! Path reconstruction from the archive's directory listings.
//!
//! The catalog identifies entries only by path hash. Starting from the
//! root entry (hash of the empty path, falling back to `locale`), every
//! directory payload is parsed for child names, each child's full path is
//! re-hashed, and the name is attached to the catalog entry that hash
//! points at. Entries no listing reaches keep no name but stay listed.

use std::collections::HashMap;
use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace};

use crate::file::{FileEntry, PayloadReader};
use crate::header::Dialect;
use crate::source::ReadAt;
use crate::{Error, Result};

/// A child named by a directory listing.
#[derive(Debug)]
struct ChildRef {
    name: String,
    is_directory: bool,
}

/// Assign names to every entry reachable from the root.
pub(crate) fn resolve_names<R: ReadAt + ?Sized>(
    source: &R,
    dialect: Dialect,
    files: &mut [FileEntry],
) -> Result<()> {
    let root_hash = b0rkhash::city_hash_64(b"");
    let locale_hash = b0rkhash::city_hash_64(b"locale");

    // First record wins; duplicate hashes stay unnamed like orphans.
    let mut by_hash: HashMap<u64, usize> = HashMap::with_capacity(files.len());
    for (i, f) in files.iter().enumerate() {
        by_hash.entry(f.hash).or_insert(i);
    }

    let root = if let Some(&i) = by_hash.get(&root_hash) {
        files[i].name = Some(String::new());
        i
    } else if let Some(&i) = by_hash.get(&locale_hash) {
        files[i].name = Some("locale".to_owned());
        i
    } else {
        return Err(Error::NoRootEntry);
    };

    let mut pending = vec![root];
    while let Some(dir) = pending.pop() {
        let parent = files[dir].name.clone().unwrap_or_default();
        let listing = read_listing(source, &files[dir], &parent)?;
        let children = match dialect {
            Dialect::V1 => parse_text_listing(&listing, &parent)?,
            Dialect::V2 => parse_binary_listing(&listing, &parent)?,
        };
        trace!(%parent, children = children.len(), "walked directory listing");

        for child in children {
            let path = if parent.is_empty() {
                child.name
            } else {
                format!("{parent}/{}", child.name)
            };
            let hash = b0rkhash::city_hash_64(path.as_bytes());

            let &i = by_hash
                .get(&hash)
                .ok_or_else(|| Error::ReferenceToVoid(path.clone()))?;

            // A name is assigned at most once; an entry named through
            // another listing is not walked again.
            if files[i].name.is_some() {
                continue;
            }
            files[i].name = Some(path);
            if child.is_directory {
                pending.push(i);
            }
        }
    }

    let orphans = files.iter().filter(|f| f.name.is_none()).count();
    debug!(named = files.len() - orphans, orphans, "resolved file names");
    Ok(())
}

/// Read a directory payload in full.
fn read_listing<R: ReadAt + ?Sized>(
    source: &R,
    entry: &FileEntry,
    parent: &str,
) -> Result<Vec<u8>> {
    let mut listing = Vec::new();
    PayloadReader::open(source, entry)
        .read_to_end(&mut listing)
        .map_err(|e| {
            if entry.is_compressed && e.kind() == io::ErrorKind::InvalidData {
                Error::Decompression(format!("inflating listing of {parent:?}: {e}"))
            } else {
                Error::Io(e)
            }
        })?;
    Ok(listing)
}

/// Listing format of the hashed-catalog layout: an entry count, one length
/// byte per entry, then the names back to back. A leading `/` marks a
/// subdirectory.
fn parse_binary_listing(listing: &[u8], parent: &str) -> Result<Vec<ChildRef>> {
    let mut f = listing;
    let entry_count = f.read_u32::<LittleEndian>()? as usize;
    if entry_count == 0 {
        return Err(Error::EmptyDirectory(parent.to_owned()));
    }

    let mut lengths = vec![0u8; entry_count];
    f.read_exact(&mut lengths)?;

    let mut children = Vec::with_capacity(entry_count);
    for &len in &lengths {
        if len == 0 {
            return Err(Error::EmptyName(parent.to_owned()));
        }
        let mut name = vec![0u8; usize::from(len)];
        f.read_exact(&mut name)?;

        let is_directory = name[0] == b'/';
        if is_directory {
            name.remove(0);
            if name.is_empty() {
                return Err(Error::EmptyName(parent.to_owned()));
            }
        }
        children.push(ChildRef {
            name: String::from_utf8(name).map_err(|_| Error::MalformedName(parent.to_owned()))?,
            is_directory,
        });
    }

    Ok(children)
}

/// Listing format of the legacy layout: one name per line, a leading `*`
/// marking a subdirectory.
fn parse_text_listing(listing: &[u8], parent: &str) -> Result<Vec<ChildRef>> {
    let text = std::str::from_utf8(listing).map_err(|_| Error::MalformedName(parent.to_owned()))?;

    let mut children = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix('*') {
            Some(name) if name.is_empty() => return Err(Error::EmptyName(parent.to_owned())),
            Some(name) => children.push(ChildRef {
                name: name.to_owned(),
                is_directory: true,
            }),
            None => children.push(ChildRef {
                name: line.to_owned(),
                is_directory: false,
            }),
        }
    }

    if children.is_empty() {
        return Err(Error::EmptyDirectory(parent.to_owned()));
    }
    Ok(children)
}

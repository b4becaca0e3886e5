//! Reader for SCS# game-data archives.
//!
//! Two container layouts exist in the wild and both are supported: the
//! legacy layout with a fixed-stride catalog of typed entries at a known
//! offset, and the newer layout whose zlib-compressed entry and metadata
//! tables are indexed by the 64-bit hash of each file's path. Entries
//! carry no names on disk; [`Reader::new`] reconstructs them by walking
//! the archive's own directory listings and re-hashing every child path
//! with [`b0rkhash`].
//!
//! ```no_run
//! use scs_archive::Reader;
//!
//! let file = std::fs::File::open("base.scs")?;
//! let reader = Reader::new(file)?;
//! for entry in reader.files() {
//!     if let Some(name) = entry.name() {
//!         println!("{name}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod catalog;
mod error;
mod file;
mod header;
mod ioutils;
mod meta;
mod reader;
mod resolver;
mod source;

pub use error::Error;
pub use file::{FileEntry, PayloadReader};
pub use header::Dialect;
pub use reader::Reader;
pub use source::{ReadAt, SectionReader};

pub type Result<T> = std::result::Result<T, Error>;

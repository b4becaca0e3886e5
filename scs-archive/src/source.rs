//! Positioned access to the archive bytes.
//!
//! Archives are never required to fit in memory; every catalog parse and
//! payload read goes through [`ReadAt`]. Reads take `&self`, so multiple
//! payload streams over one source can coexist.

use std::fs::File;
use std::io::{self, Read};

/// A source of bytes readable at arbitrary offsets.
pub trait ReadAt {
    /// Read into `buf` starting at `offset`, returning how many bytes
    /// were read. A short read is not an error; zero means end of source.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Read exactly `buf.len()` bytes at `offset`.
    fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(buf, offset) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ReadAt for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let Ok(offset) = usize::try_from(offset) else {
            return Ok(0);
        };
        if offset >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - offset);
        buf[..n].copy_from_slice(&self[offset..offset + n]);
        Ok(n)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

/// An [`io::Read`] window over `[offset, offset + len)` of a [`ReadAt`]
/// source. Never reads past its end.
pub struct SectionReader<'a, R: ReadAt + ?Sized> {
    source: &'a R,
    pos: u64,
    end: u64,
}

impl<'a, R: ReadAt + ?Sized> SectionReader<'a, R> {
    /// Create a section over `len` bytes starting at `offset`.
    pub fn new(source: &'a R, offset: u64, len: u64) -> Self {
        Self {
            source,
            pos: offset,
            end: offset.saturating_add(len),
        }
    }

    /// Bytes left in the section.
    pub fn remaining(&self) -> u64 {
        self.end - self.pos
    }
}

impl<R: ReadAt + ?Sized> Read for SectionReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.source.read_at(&mut buf[..want], self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

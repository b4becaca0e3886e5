//! Internal utility functions

use std::io::{Error, Read};

/// Generic trait for reading the integer widths the archive format uses.
///
/// Everything on disk is little-endian. The 3-byte width is the format's
/// "broken octal" encoding for metadata record indices and sizes.
pub trait ReadInt {
    /// Error type which can be returned on read failures.
    type Error;

    /// Read a `u8` from the buffer.
    fn read_u8(&mut self) -> Result<u8, Self::Error>;

    /// Read a little-endian `u16` from the buffer.
    fn read_u16le(&mut self) -> Result<u16, Self::Error>;

    /// Read a little-endian 3-byte unsigned integer from the buffer.
    fn read_u24le(&mut self) -> Result<u32, Self::Error>;

    /// Read a little-endian `i32` from the buffer.
    fn read_i32le(&mut self) -> Result<i32, Self::Error>;

    /// Read a little-endian `u32` from the buffer.
    fn read_u32le(&mut self) -> Result<u32, Self::Error>;

    /// Read a little-endian `u64` from the buffer.
    fn read_u64le(&mut self) -> Result<u64, Self::Error>;
}

impl<T: Read> ReadInt for T {
    type Error = Error;

    fn read_u8(&mut self) -> Result<u8, Self::Error> {
        let mut b = [0; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_u16le(&mut self) -> Result<u16, Self::Error> {
        let mut b = [0; size_of::<u16>()];
        self.read_exact(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    fn read_u24le(&mut self) -> Result<u32, Self::Error> {
        let mut b = [0; size_of::<u32>()];
        self.read_exact(&mut b[..3])?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_i32le(&mut self) -> Result<i32, Self::Error> {
        let mut b = [0; size_of::<i32>()];
        self.read_exact(&mut b)?;
        Ok(i32::from_le_bytes(b))
    }

    fn read_u32le(&mut self) -> Result<u32, Self::Error> {
        let mut b = [0; size_of::<u32>()];
        self.read_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_u64le(&mut self) -> Result<u64, Self::Error> {
        let mut b = [0; size_of::<u64>()];
        self.read_exact(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u24_is_three_bytes_little_endian() {
        let mut c = Cursor::new([0x01, 0x02, 0x03, 0xFF]);
        assert_eq!(c.read_u24le().unwrap(), 0x030201);
        assert_eq!(c.read_u8().unwrap(), 0xFF);
    }
}

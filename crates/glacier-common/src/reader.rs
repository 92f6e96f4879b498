//! Offset-addressed reading over an archive buffer.
//!
//! TEX archives and DDS files are read by jumping to absolute offsets taken
//! from tables and then consuming fixed little-endian fields. [`BinaryReader`]
//! does both against a borrowed slice; every failure carries the byte offset
//! it happened at.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Cursor over a borrowed byte slice.
///
/// # Example
///
/// ```
/// use glacier_common::BinaryReader;
///
/// // offset table with two slots, then a record
/// let data = [8, 0, 0, 0, 0, 0, 0, 0, 0x2A, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// let table = reader.read_u32_table(2).unwrap();
/// reader.seek(table[0] as usize).unwrap();
/// assert_eq!(reader.read_u16().unwrap(), 42);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Start reading at offset 0.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current absolute offset.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Length of the whole buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Bytes left after the current offset.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True once the cursor sits at or past the end.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Jump to an absolute offset.
    ///
    /// The end of the buffer itself is a valid target; the next read there
    /// reports the truncation.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: position,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// The next `count` bytes, leaving the cursor in place.
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        self.position
            .checked_add(count)
            .and_then(|end| self.data.get(self.position..end))
            .ok_or(Error::UnexpectedEof {
                offset: self.position,
                needed: count,
                available: self.remaining(),
            })
    }

    /// The next `count` bytes; the cursor moves past them.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let slice = self.peek_bytes(count)?;
        self.position += count;
        Ok(slice)
    }

    /// Copy out a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// An offset table of `count` little-endian slots.
    pub fn read_u32_table(&mut self, count: usize) -> Result<Vec<u32>> {
        let raw = self.read_bytes(count.saturating_mul(4))?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Bytes up to the next NUL. The NUL is consumed but not returned.
    pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let tail = self.data.get(start..).unwrap_or_default();
        let len = memchr::memchr(0, tail).ok_or(Error::MissingNullTerminator(start))?;
        self.position = start + len + 1;
        Ok(&tail[..len])
    }

    /// Decode a plain-old-data header in place.
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let offset = self.position;
        let size = std::mem::size_of::<T>();
        let raw = self.read_bytes(size)?;
        T::read_from_bytes(raw).map_err(|_| Error::UnexpectedEof {
            offset,
            needed: size,
            available: raw.len(),
        })
    }
}

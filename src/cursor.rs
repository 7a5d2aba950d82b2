//! Bounds-checked little-endian reader over an in-memory byte slice.
//!
//! Every read checks the remaining length first and fails with
//! [`OutOfBounds`] instead of reading past the end of the buffer, so a
//! truncated resource file surfaces as a clean error.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
pub struct OutOfBounds {
    pub offset:    usize,
    pub needed:    usize,
    pub available: usize,
}

#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor to an absolute offset.  Seeking to exactly the end of
    /// the buffer is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<(), OutOfBounds> {
        if offset > self.data.len() {
            return Err(OutOfBounds {
                offset:    self.pos,
                needed:    offset - self.pos,
                available: self.remaining(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], OutOfBounds> {
        if len > self.remaining() {
            return Err(OutOfBounds {
                offset:    self.pos,
                needed:    len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, OutOfBounds> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, OutOfBounds> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }
}

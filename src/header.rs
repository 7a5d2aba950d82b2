//! Resource header and text-section header.
//!
//! # Layout
//! ```text
//! offset 0   ResourceHeader     64 B  (24 B defined, 40 B reserved)
//!              u64 id
//!              u32 resource_minor_version
//!              u64 rom_crc
//!              u32 rom_enum
//!              [u8; 40] reserved
//! offset 64  TextSectionHeader   4 B
//!              i32 msg_count      (0 < msg_count <= 0xFFFF)
//! offset 68  message records
//! ```
//! All fields are little-endian and packed; there is no alignment padding.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::cursor::{OutOfBounds, SliceCursor};

/// Total size of the resource header region.
pub const RESOURCE_HEADER_SIZE:     usize = 64;
/// Bytes of the header region that carry named fields.
pub const RESOURCE_HEADER_DEFINED:  usize = 24;
/// Reserved tail of the header region.
pub const RESOURCE_HEADER_RESERVED: usize = RESOURCE_HEADER_SIZE - RESOURCE_HEADER_DEFINED;
pub const TEXT_SECTION_HEADER_SIZE: usize = 4;
/// Offset of the first message record.
pub const MESSAGES_OFFSET:          usize = RESOURCE_HEADER_SIZE + TEXT_SECTION_HEADER_SIZE;
pub const MAX_MESSAGE_COUNT:        usize = 0xFFFF;
/// Resource id written into freshly created files.
pub const DEFAULT_RESOURCE_ID:      u64   = 5716290944840499200;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("Invalid message count {0} (expected 1..=65535)")]
    InvalidMessageCount(i64),
    #[error("Truncated header: {0}")]
    Truncated(#[from] OutOfBounds),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Check a message count against the range the format accepts.
pub fn validate_message_count(count: i64) -> Result<usize, HeaderError> {
    if count <= 0 || count > MAX_MESSAGE_COUNT as i64 {
        return Err(HeaderError::InvalidMessageCount(count));
    }
    Ok(count as usize)
}

// ── ResourceHeader ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHeader {
    pub id:                     u64,
    pub resource_minor_version: u32,
    pub rom_crc:                u64,
    pub rom_enum:               u32,
    pub reserved:               [u8; RESOURCE_HEADER_RESERVED],
}

impl Default for ResourceHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHeader {
    /// A fresh header: everything zero except `id`.
    pub fn new() -> Self {
        Self {
            id:                     DEFAULT_RESOURCE_ID,
            resource_minor_version: 0,
            rom_crc:                0,
            rom_enum:               0,
            reserved:               [0u8; RESOURCE_HEADER_RESERVED],
        }
    }

    /// Writes the full 64-byte region, reserved bytes included.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(self.id)?;
        writer.write_u32::<LittleEndian>(self.resource_minor_version)?;
        writer.write_u64::<LittleEndian>(self.rom_crc)?;
        writer.write_u32::<LittleEndian>(self.rom_enum)?;
        writer.write_all(&self.reserved)?;
        Ok(())
    }

    /// Read the header region from the start of a stream (used when
    /// re-encoding over an existing file).
    pub fn read<R: Read>(mut reader: R) -> Result<Self, HeaderError> {
        let mut buf = [0u8; RESOURCE_HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        Self::parse(&mut SliceCursor::new(&buf))
    }

    pub fn parse(cursor: &mut SliceCursor<'_>) -> Result<Self, HeaderError> {
        let id                     = cursor.read_u64()?;
        let resource_minor_version = cursor.read_u32()?;
        let rom_crc                = cursor.read_u64()?;
        let rom_enum               = cursor.read_u32()?;
        let mut reserved = [0u8; RESOURCE_HEADER_RESERVED];
        reserved.copy_from_slice(cursor.take(RESOURCE_HEADER_RESERVED)?);
        Ok(Self { id, resource_minor_version, rom_crc, rom_enum, reserved })
    }
}

// ── TextSectionHeader ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSectionHeader {
    pub msg_count: i32,
}

impl TextSectionHeader {
    pub fn new(count: usize) -> Result<Self, HeaderError> {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        validate_message_count(count)?;
        Ok(Self { msg_count: count as i32 })
    }

    pub fn count(&self) -> usize {
        self.msg_count.max(0) as usize
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.msg_count)
    }

    pub fn parse(cursor: &mut SliceCursor<'_>) -> Result<Self, HeaderError> {
        let msg_count = cursor.read_i32()?;
        validate_message_count(msg_count as i64)?;
        Ok(Self { msg_count })
    }
}

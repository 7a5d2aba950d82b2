use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use thiserror::Error;

use crate::cursor::{OutOfBounds, SliceCursor};

/// u16 id + u8 textbox_type + u8 textbox_y_pos + i32 num_chars
pub const RECORD_PREFIX_SIZE: usize = 8;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Truncated record: {0}")]
    Truncated(#[from] OutOfBounds),
    #[error("Negative text length: {0}")]
    NegativeLength(i32),
    #[error("Text of {0} bytes does not fit in a record")]
    TextTooLong(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Fixed 8-byte prefix preceding every text payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRecordHeader {
    pub id:            u16,
    pub textbox_type:  u8,
    pub textbox_y_pos: u8,
    pub num_chars:     i32,
}

impl MessageRecordHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.id)?;
        writer.write_u8(self.textbox_type)?;
        writer.write_u8(self.textbox_y_pos)?;
        writer.write_i32::<LittleEndian>(self.num_chars)?;
        Ok(())
    }

    pub fn parse(cursor: &mut SliceCursor<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            id:            cursor.read_u16()?,
            textbox_type:  cursor.read_u8()?,
            textbox_y_pos: cursor.read_u8()?,
            num_chars:     cursor.read_i32()?,
        })
    }
}

/// A record with its text payload attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id:            u16,
    pub textbox_type:  u8,
    pub textbox_y_pos: u8,
    pub text:          String,
}

/// Write the prefix followed by the raw UTF-8 text (no terminator).
pub fn encode_record<W: Write>(record: &MessageRecord, mut writer: W) -> Result<(), RecordError> {
    let bytes = record.text.as_bytes();
    let num_chars = i32::try_from(bytes.len())
        .map_err(|_| RecordError::TextTooLong(bytes.len()))?;
    let header = MessageRecordHeader {
        id:            record.id,
        textbox_type:  record.textbox_type,
        textbox_y_pos: record.textbox_y_pos,
        num_chars,
    };
    header.write(&mut writer)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Read one record and leave the cursor at the start of the next.
///
/// Text that is not valid UTF-8 is decoded lossily with a warning.
pub fn decode_record(cursor: &mut SliceCursor<'_>) -> Result<MessageRecord, RecordError> {
    let offset = cursor.position();
    let header = MessageRecordHeader::parse(cursor)?;
    if header.num_chars < 0 {
        return Err(RecordError::NegativeLength(header.num_chars));
    }
    let bytes = cursor.take(header.num_chars as usize)?;
    let text = match std::str::from_utf8(bytes) {
        Ok(s)  => s.to_owned(),
        Err(e) => {
            tracing::warn!(
                "Record {:#x} at offset {} has invalid UTF-8 ({}); replacing bad bytes",
                header.id, offset, e
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    };
    Ok(MessageRecord {
        id:            header.id,
        textbox_type:  header.textbox_type,
        textbox_y_pos: header.textbox_y_pos,
        text,
    })
}

//! Whole-file decoder and streaming encoder.
//!
//! # Reader
//! [`TextResReader`] borrows the complete file as a byte slice, validates the
//! resource header and the message count up front, then yields one
//! [`MessageRecord`] per call.  Every read is bounds-checked; a truncated
//! file fails with an error instead of reading past the buffer.
//!
//! # Writer
//! [`TextResWriter`] writes the headers on construction and then one record
//! per [`TextResWriter::write_message`] call, strictly in call order.  There
//! is no buffering of the whole file and no rollback: a failed write leaves
//! whatever was already written in the sink.  Use
//! [`crate::convert::ConvertOptions::atomic`] for temp-file-then-rename.

use std::io::{self, Write};
use thiserror::Error;

use crate::cursor::SliceCursor;
use crate::header::{HeaderError, ResourceHeader, TextSectionHeader, RESOURCE_HEADER_SIZE};
use crate::message::Message;
use crate::msgid::{pack, IdError, IdResolver, PackedId};
use crate::record::{decode_record, encode_record, MessageRecord, RecordError};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),
    #[error("Record {index}: {source}")]
    Record { index: usize, source: RecordError },
    #[error("Message {index}: {source}")]
    Id { index: usize, source: IdError },
    #[error("Declared {declared} messages but {written} were written")]
    CountMismatch { declared: usize, written: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct TextResReader<'a> {
    cursor:        SliceCursor<'a>,
    pub header:    ResourceHeader,
    pub msg_count: usize,
    next_index:    usize,
}

impl<'a> TextResReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, StreamError> {
        let mut cursor = SliceCursor::new(data);
        let header = ResourceHeader::parse(&mut cursor)?;
        cursor.seek(RESOURCE_HEADER_SIZE).map_err(HeaderError::from)?;
        let section = TextSectionHeader::parse(&mut cursor)?;
        Ok(Self {
            cursor,
            header,
            msg_count:  section.count(),
            next_index: 0,
        })
    }

    /// Read the next record, or `None` once `msg_count` records were read.
    pub fn next_record(&mut self) -> Result<Option<MessageRecord>, StreamError> {
        if self.next_index >= self.msg_count {
            return Ok(None);
        }
        let index = self.next_index;
        let record = decode_record(&mut self.cursor)
            .map_err(|source| StreamError::Record { index, source })?;
        tracing::debug!(
            "record {}: id={:#x} type={} ypos={} len={}",
            index, record.id, record.textbox_type, record.textbox_y_pos, record.text.len()
        );
        self.next_index += 1;
        if self.next_index == self.msg_count && self.cursor.remaining() > 0 {
            tracing::debug!("{} trailing bytes after last record", self.cursor.remaining());
        }
        Ok(Some(record))
    }
}

impl Iterator for TextResReader<'_> {
    type Item = Result<MessageRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// A decoded file: its header plus the messages in file order.
#[derive(Debug, Clone)]
pub struct TextResource {
    pub header:   ResourceHeader,
    pub messages: Vec<Message>,
}

pub fn decode_resource(data: &[u8]) -> Result<TextResource, StreamError> {
    let mut reader = TextResReader::new(data)?;
    let mut messages = Vec::with_capacity(reader.msg_count);
    while let Some(record) = reader.next_record()? {
        messages.push(Message::from(record));
    }
    Ok(TextResource { header: reader.header, messages })
}

pub fn decode_messages(data: &[u8]) -> Result<Vec<Message>, StreamError> {
    Ok(decode_resource(data)?.messages)
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Options for [`encode_messages`].
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Header to write.  `None` writes a fresh [`ResourceHeader::new`].
    pub base_header: Option<ResourceHeader>,
}

/// What an encode produced, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub written:    usize,
    /// On-disk ids that appeared more than once, in the order they repeated.
    pub duplicates: Vec<u16>,
}

pub struct TextResWriter<W: Write> {
    writer:   W,
    declared: usize,
    ids:      IdResolver,
    summary:  EncodeSummary,
}

impl<W: Write> TextResWriter<W> {
    /// Write both headers.  `msg_count` must match the number of
    /// `write_message` calls that follow.
    pub fn new(mut writer: W, header: &ResourceHeader, msg_count: usize) -> Result<Self, StreamError> {
        let section = TextSectionHeader::new(msg_count)?;
        header.write(&mut writer)?;
        section.write(&mut writer)?;
        Ok(Self {
            writer,
            declared: msg_count,
            ids:      IdResolver::new(),
            summary:  EncodeSummary::default(),
        })
    }

    /// Resolve, pack and write one message.  Returns the on-disk fields.
    pub fn write_message(&mut self, message: &Message) -> Result<PackedId, StreamError> {
        let index = self.summary.written;
        if index >= self.declared {
            return Err(StreamError::CountMismatch { declared: self.declared, written: index + 1 });
        }

        let logical = self.ids
            .resolve(message.id.as_ref())
            .map_err(|source| StreamError::Id { index, source })?;
        let packed = pack(
            logical,
            message.textbox_type.unwrap_or(0),
            message.textbox_y_pos.unwrap_or(0),
        );

        if !self.ids.claim(packed.id) {
            tracing::warn!(
                "Duplicate message id {:#x} (message {}, logical id {:#x})",
                packed.id, index, logical
            );
            self.summary.duplicates.push(packed.id);
        }

        let record = MessageRecord {
            id:            packed.id,
            textbox_type:  packed.textbox_type,
            textbox_y_pos: packed.textbox_y_pos,
            text:          message.text.clone(),
        };
        encode_record(&record, &mut self.writer)
            .map_err(|source| StreamError::Record { index, source })?;
        tracing::debug!("wrote message {} as id={:#x}", index, packed.id);

        self.summary.written += 1;
        Ok(packed)
    }

    /// Check the record count and flush.  Must be called once.
    pub fn finish(mut self) -> Result<EncodeSummary, StreamError> {
        if self.summary.written != self.declared {
            return Err(StreamError::CountMismatch {
                declared: self.declared,
                written:  self.summary.written,
            });
        }
        self.writer.flush()?;
        Ok(self.summary)
    }
}

/// Encode `messages` in order into `writer`.
pub fn encode_messages<W: Write>(
    writer:   W,
    messages: &[Message],
    opts:     &EncodeOptions,
) -> Result<EncodeSummary, StreamError> {
    let header = opts.base_header.clone().unwrap_or_default();
    let mut w = TextResWriter::new(writer, &header, messages.len())?;
    for message in messages {
        w.write_message(message)?;
    }
    w.finish()
}

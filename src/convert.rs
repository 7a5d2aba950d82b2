//! File-level conversion: direction sniffing, reading, writing.
//!
//! ```no_run
//! use textres::convert::{convert_file, ConvertOptions};
//!
//! convert_file("msg.bin", "msg.json", &ConvertOptions::default())?;
//! convert_file("msg.json", "msg.bin", &ConvertOptions { atomic: true, ..Default::default() })?;
//! # Ok::<(), textres::convert::ConvertError>(())
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::{FormatError, TextFormat};
use crate::header::{HeaderError, ResourceHeader};
use crate::io_stream::{decode_messages, encode_messages, EncodeOptions, StreamError};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("Cannot reuse header of {}: {source}", path.display())]
    PreservedHeader { path: PathBuf, source: HeaderError },
    #[error("Cannot move temp file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Direction ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    BinaryToText(TextFormat),
    TextToBinary(TextFormat),
}

impl Direction {
    /// Exactly one side must carry a text-format extension.
    pub fn infer(input: &Path, output: &Path) -> Result<Self, ConvertError> {
        match (TextFormat::from_path(input), TextFormat::from_path(output)) {
            (None, Some(fmt)) => Ok(Direction::BinaryToText(fmt)),
            (Some(fmt), None) => Ok(Direction::TextToBinary(fmt)),
            (Some(_), Some(_)) => Err(ConvertError::Usage(
                "both input and output are text files; one side must be binary".into(),
            )),
            (None, None) => Err(ConvertError::Usage(
                "neither input nor output has a .json/.yaml/.yml extension".into(),
            )),
        }
    }
}

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Write to a temp file next to the output and rename it into place.
    pub atomic:          bool,
    /// When encoding over an existing binary file, reuse its 64-byte header.
    pub preserve_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub direction:  Direction,
    pub messages:   usize,
    pub duplicates: Vec<u16>,
}

// ── Entry points ─────────────────────────────────────────────────────────────

pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input:  P,
    output: Q,
    opts:   &ConvertOptions,
) -> Result<ConvertReport, ConvertError> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let direction = Direction::infer(input, output)?;
    if !input.exists() {
        return Err(ConvertError::InputNotFound(input.to_owned()));
    }

    tracing::info!("Converting {:?} → {:?} ({:?})", input, output, direction);
    let report = match direction {
        Direction::BinaryToText(fmt) => binary_to_text(input, output, fmt, opts)?,
        Direction::TextToBinary(fmt) => text_to_binary(input, output, fmt, opts)?,
    };
    tracing::info!("Conversion complete: {} messages", report.messages);
    Ok(report)
}

/// Decode fully in memory before touching `output`, so a malformed input
/// never leaves a partial text file behind.
pub fn binary_to_text(
    input:  &Path,
    output: &Path,
    format: TextFormat,
    opts:   &ConvertOptions,
) -> Result<ConvertReport, ConvertError> {
    let data = fs::read(input)?;
    let messages = decode_messages(&data)?;
    let rendered = format.render(&messages)?;
    write_output(output, opts.atomic, |w| Ok(w.write_all(rendered.as_bytes())?))?;
    Ok(ConvertReport {
        direction:  Direction::BinaryToText(format),
        messages:   messages.len(),
        duplicates: Vec::new(),
    })
}

pub fn text_to_binary(
    input:  &Path,
    output: &Path,
    format: TextFormat,
    opts:   &ConvertOptions,
) -> Result<ConvertReport, ConvertError> {
    let source = fs::read_to_string(input)?;
    let messages = format.parse(&source)?;

    let base_header = if opts.preserve_header && output.exists() {
        let header = File::open(output)
            .map_err(HeaderError::from)
            .and_then(ResourceHeader::read)
            .map_err(|source| ConvertError::PreservedHeader {
                path: output.to_owned(),
                source,
            })?;
        tracing::debug!("Reusing header of {:?} (id {:#x})", output, header.id);
        Some(header)
    } else {
        None
    };

    let encode_opts = EncodeOptions { base_header };
    let summary = write_output(output, opts.atomic, |w| {
        Ok(encode_messages(w, &messages, &encode_opts)?)
    })?;
    if !summary.duplicates.is_empty() {
        tracing::warn!("{} duplicate message id(s) written", summary.duplicates.len());
    }
    Ok(ConvertReport {
        direction:  Direction::TextToBinary(format),
        messages:   summary.written,
        duplicates: summary.duplicates,
    })
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Run `body` against a buffered writer for `path`.  Without `atomic` the
/// file is written in place and a failure leaves it truncated.
fn write_output<T, F>(path: &Path, atomic: bool, body: F) -> Result<T, ConvertError>
where
    F: FnOnce(&mut dyn Write) -> Result<T, ConvertError>,
{
    if !atomic {
        let mut w = BufWriter::new(File::create(path)?);
        let out = body(&mut w)?;
        w.flush()?;
        return Ok(out);
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let out = {
        let mut w = BufWriter::new(tmp.as_file_mut());
        let out = body(&mut w)?;
        w.flush()?;
        out
    };
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(out)
}

//! Message id resolution and packing.
//!
//! # Logical vs. on-disk ids
//! The text format carries a *logical* id of arbitrary width.  On disk each
//! record only has a 16-bit `id` plus two 8-bit textbox fields, so logical
//! ids above `0xFFFF` are packed across all three:
//!
//! ```text
//! logical  = 0x HHHH TT YY
//! on-disk  id = HHHH   (or the low 16 bits when HHHH == 0xFFFF)
//!          textbox_type  = TT
//!          textbox_y_pos = YY
//! ```
//!
//! Ids up to `0xFFFF` are written as-is and the textbox fields come from the
//! message itself.  Only bits 0..32 of a logical id take part in packing.
//!
//! Decoding never reverses the packing: a decoded message reports the raw
//! 16-bit id and its textbox fields separately.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Largest logical id stored without packing.
pub const MAX_PLAIN_ID: u64 = 0xFFFF;
/// High-half value that makes the packer keep the low 16 bits instead.
pub const SENTINEL_HIGH: u64 = 0xFFFF;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Negative message id: {0}")]
    Negative(i64),
    #[error("Unparseable message id: {0:?}")]
    Unparseable(String),
}

// ── MessageId ────────────────────────────────────────────────────────────────

/// An id as written in the text format: a number, or a string holding
/// either `0x`-prefixed hex or decimal digits.  Any other value (`true`, an
/// object, ...) is kept as [`MessageId::Other`] and gets the default id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    #[serde(skip_serializing)]
    Other(IgnoredAny),
}

impl MessageId {
    /// The `0x`-prefixed lowercase hex form used for decoded messages.
    pub fn hex(id: u16) -> Self {
        MessageId::Text(format!("{id:#x}"))
    }

    /// The logical id this value names, or `None` when it carries no usable
    /// id and the caller should fall back to the default.
    pub fn resolve(&self) -> Result<Option<u64>, IdError> {
        match self {
            MessageId::Number(n)   => u64::try_from(*n).map(Some).map_err(|_| IdError::Negative(*n)),
            MessageId::Unsigned(n) => Ok(Some(*n)),
            MessageId::Float(f)    => resolve_float(*f).map(Some),
            MessageId::Text(s)     => parse_id_str(s).map(Some),
            MessageId::Other(_)    => Ok(None),
        }
    }
}

/// Whole, non-negative floats (`5.0`) are ids; fractions are not.
fn resolve_float(f: f64) -> Result<u64, IdError> {
    if f.is_finite() && f < 0.0 && f.fract() == 0.0 {
        return Err(IdError::Negative(f as i64));
    }
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        return Ok(f as u64);
    }
    Err(IdError::Unparseable(f.to_string()))
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        match i64::try_from(id) {
            Ok(n)  => MessageId::Number(n),
            Err(_) => MessageId::Unsigned(id),
        }
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        MessageId::Text(id.to_owned())
    }
}

/// Parse a string id: hex when prefixed with `0x`/`0X`, decimal otherwise.
pub fn parse_id_str(s: &str) -> Result<u64, IdError> {
    let trimmed = s.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));
    if let Some(digits) = hex {
        return u64::from_str_radix(digits, 16)
            .map_err(|_| IdError::Unparseable(s.to_owned()));
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return u64::try_from(n).map_err(|_| IdError::Negative(n));
    }
    trimmed.parse::<u64>().map_err(|_| IdError::Unparseable(s.to_owned()))
}

// ── Packing ──────────────────────────────────────────────────────────────────

/// The three on-disk fields a logical id maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedId {
    pub id:            u16,
    pub textbox_type:  u8,
    pub textbox_y_pos: u8,
}

/// Map a resolved logical id onto record fields.
///
/// `textbox_type` / `textbox_y_pos` are only used for plain ids; packed ids
/// overwrite them.
pub fn pack(logical: u64, textbox_type: u8, textbox_y_pos: u8) -> PackedId {
    if logical <= MAX_PLAIN_ID {
        return PackedId { id: logical as u16, textbox_type, textbox_y_pos };
    }
    let high = (logical >> 16) & 0xFFFF;
    let id = if high == SENTINEL_HIGH { logical & 0xFFFF } else { high };
    PackedId {
        id:            id as u16,
        textbox_type:  ((logical >> 8) & 0xFF) as u8,
        textbox_y_pos: (logical & 0xFF) as u8,
    }
}

// ── IdResolver ───────────────────────────────────────────────────────────────

/// Per-encode accumulator: the previous resolved logical id (for
/// defaulting) and the set of on-disk ids written so far.
#[derive(Debug, Default)]
pub struct IdResolver {
    previous: Option<u64>,
    seen:     HashSet<u16>,
}

impl IdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an optional explicit id, defaulting to previous + 1 (0 for the
    /// first message) when it is absent or not an id at all.
    pub fn resolve(&mut self, explicit: Option<&MessageId>) -> Result<u64, IdError> {
        let explicit = match explicit {
            Some(id) => id.resolve()?,
            None     => None,
        };
        let id = explicit.unwrap_or_else(|| self.previous.map_or(0, |p| p.saturating_add(1)));
        self.previous = Some(id);
        Ok(id)
    }

    /// Note an on-disk id.  Returns `false` if it was already taken.
    pub fn claim(&mut self, on_disk: u16) -> bool {
        self.seen.insert(on_disk)
    }
}

//! JSON / YAML front end: the document is an ordered array of [`Message`]s.

use std::path::Path;
use thiserror::Error;

use crate::message::Message;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Json,
    Yaml,
}

impl TextFormat {
    /// Sniff the format from a file extension (`.json`, `.yaml`, `.yml`,
    /// case-insensitive).  Anything else is treated as binary.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json"         => Some(TextFormat::Json),
            "yaml" | "yml" => Some(TextFormat::Yaml),
            _              => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextFormat::Json => "json",
            TextFormat::Yaml => "yaml",
        }
    }

    pub fn parse(self, input: &str) -> Result<Vec<Message>, FormatError> {
        Ok(match self {
            TextFormat::Json => serde_json::from_str(input)?,
            TextFormat::Yaml => serde_yaml::from_str(input)?,
        })
    }

    pub fn render(self, messages: &[Message]) -> Result<String, FormatError> {
        let mut out = match self {
            TextFormat::Json => serde_json::to_string_pretty(messages)?,
            TextFormat::Yaml => serde_yaml::to_string(messages)?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

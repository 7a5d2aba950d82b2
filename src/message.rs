use serde::{Deserialize, Serialize};

use crate::msgid::MessageId;
use crate::record::MessageRecord;

/// One entry of the text-format document.
///
/// Every field but `text` is optional on input.  Decoded messages always
/// carry all four, with `id` as a `0x`-prefixed hex string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id:            Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textbox_type:  Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textbox_y_pos: Option<u8>,
    #[serde(default)]
    pub text:          String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_textbox(mut self, textbox_type: u8, textbox_y_pos: u8) -> Self {
        self.textbox_type  = Some(textbox_type);
        self.textbox_y_pos = Some(textbox_y_pos);
        self
    }
}

impl From<MessageRecord> for Message {
    fn from(r: MessageRecord) -> Self {
        Message {
            id:            Some(MessageId::hex(r.id)),
            textbox_type:  Some(r.textbox_type),
            textbox_y_pos: Some(r.textbox_y_pos),
            text:          r.text,
        }
    }
}

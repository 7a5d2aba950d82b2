pub mod cursor;
pub mod header;
pub mod msgid;
pub mod record;
pub mod message;
pub mod io_stream;
pub mod format;
pub mod convert;

pub use header::{ResourceHeader, TextSectionHeader};
pub use msgid::{MessageId, PackedId, pack};
pub use record::{MessageRecord, encode_record, decode_record};
pub use message::Message;
pub use io_stream::{TextResReader, TextResWriter, decode_messages, decode_resource, encode_messages};
pub use format::TextFormat;
pub use convert::{convert_file, ConvertOptions, Direction};

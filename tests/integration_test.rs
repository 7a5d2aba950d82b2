use textres::convert::{convert_file, ConvertError, ConvertOptions, Direction};
use textres::header::{ResourceHeader, DEFAULT_RESOURCE_ID, MESSAGES_OFFSET};
use textres::io_stream::{decode_resource, encode_messages, EncodeOptions, StreamError};
use textres::header::HeaderError;
use textres::{decode_messages, Message, MessageId, TextFormat};
use std::fs;
use tempfile::tempdir;

/// Build a resource file by hand: header, count, then (id, type, ypos, text).
fn build_binary(header_id: u64, count: i32, records: &[(u16, u8, u8, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&header_id.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.resize(64, 0);
    out.extend_from_slice(&count.to_le_bytes());
    for (id, ty, ypos, text) in records {
        out.extend_from_slice(&id.to_le_bytes());
        out.push(*ty);
        out.push(*ypos);
        out.extend_from_slice(&(text.len() as i32).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
    }
    out
}

fn encode(messages: &[Message]) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_messages(&mut buf, messages, &EncodeOptions::default()).unwrap();
    buf
}

/// (id, textbox_type, textbox_y_pos) of every record in an encoded file.
fn record_fields(data: &[u8]) -> Vec<(u16, u8, u8)> {
    textres::TextResReader::new(data)
        .unwrap()
        .map(|r| r.unwrap())
        .map(|r| (r.id, r.textbox_type, r.textbox_y_pos))
        .collect()
}

#[test]
fn test_decode_single_message() {
    let data = build_binary(1, 1, &[(5, 0, 0, "hello")]);
    let msgs = decode_messages(&data).unwrap();
    assert_eq!(msgs, vec![Message {
        id:            Some(MessageId::Text("0x5".into())),
        textbox_type:  Some(0),
        textbox_y_pos: Some(0),
        text:          "hello".into(),
    }]);
}

#[test]
fn test_reencode_reproduces_record_region() {
    let original = build_binary(1, 3, &[
        (5, 0, 0, "hello"),
        (0x2a, 3, 9, "ünïcödé ✓"),
        (0xFFFF, 255, 1, ""),
    ]);
    let resource = decode_resource(&original).unwrap();
    assert_eq!(resource.header.id, 1);

    let reencoded = encode(&resource.messages);
    assert_eq!(reencoded.len(), original.len());
    assert_eq!(&reencoded[MESSAGES_OFFSET - 4..], &original[MESSAGES_OFFSET - 4..]);
    // The header id is always the fixed constant on a fresh encode.
    assert_eq!(&reencoded[..8], &DEFAULT_RESOURCE_ID.to_le_bytes());
    assert!(reencoded[8..64].iter().all(|&b| b == 0));
}

#[test]
fn test_hex_id_rendering() {
    let data = build_binary(0, 1, &[(0x2A, 0, 0, "x")]);
    let msgs = decode_messages(&data).unwrap();
    assert_eq!(msgs[0].id, Some(MessageId::Text("0x2a".into())));
}

#[test]
fn test_message_count_bounds() {
    for bad in [0, -1, 0x10000, i32::MAX] {
        let data = build_binary(0, bad, &[]);
        match decode_messages(&data) {
            Err(StreamError::Header(HeaderError::InvalidMessageCount(n))) => assert_eq!(n, bad as i64),
            other => panic!("count {bad}: expected InvalidMessageCount, got {other:?}"),
        }
    }

    let records: Vec<(u16, u8, u8, &str)> = (0..300u16).map(|i| (i, 0, 0, "m")).collect();
    let data = build_binary(0, 300, &records);
    assert_eq!(decode_messages(&data).unwrap().len(), 300);
}

#[test]
fn test_message_count_upper_bound() {
    let messages = vec![Message::new(""); 0xFFFF];
    let data = encode(&messages);
    assert_eq!(data.len(), MESSAGES_OFFSET + 0xFFFF * 8);
    assert_eq!(&data[64..68], &0xFFFFi32.to_le_bytes());
    assert_eq!(decode_messages(&data).unwrap().len(), 65535);

    let too_many = vec![Message::new(""); 0x10000];
    let mut buf = Vec::new();
    let err = encode_messages(&mut buf, &too_many, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, StreamError::Header(HeaderError::InvalidMessageCount(0x10000))));
    assert!(buf.is_empty());
}

#[test]
fn test_truncated_file_fails_cleanly() {
    let data = build_binary(0, 2, &[(1, 0, 0, "first"), (2, 0, 0, "second")]);
    for cut in [10, 66, MESSAGES_OFFSET + 3, data.len() - 1] {
        assert!(decode_messages(&data[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn test_default_ids_increment() {
    let data = encode(&[Message::new("a"), Message::new("b"), Message::new("c")]);
    assert_eq!(record_fields(&data), vec![(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
}

#[test]
fn test_default_id_follows_explicit() {
    let data = encode(&[
        Message::new("a").with_id("0x10"),
        Message::new("b"),
        Message::new("c").with_id("100"),
        Message::new("d"),
    ]);
    let ids: Vec<u16> = record_fields(&data).into_iter().map(|f| f.0).collect();
    assert_eq!(ids, vec![0x10, 0x11, 100, 101]);
}

#[test]
fn test_loose_id_shapes_in_json() {
    let doc = r#"[
        {"id": 7.0, "text": "a"},
        {"id": true, "text": "b"},
        {"id": [1, 2], "text": "c"},
        {"id": 18446744073709551615, "text": "d"}
    ]"#;
    let msgs = TextFormat::Json.parse(doc).unwrap();
    let data = encode(&msgs);
    // u64::MAX packs to high half 0xFFFF, so the low 16 bits are kept.
    assert_eq!(record_fields(&data), vec![
        (7, 0, 0), (8, 0, 0), (9, 0, 0), (0xFFFF, 0xFF, 0xFF),
    ]);
}

#[test]
fn test_wide_ids_are_packed_on_disk() {
    let data = encode(&[
        Message::new("a").with_id(0x12345u64).with_textbox(7, 7),
        Message::new("b").with_id("0xFFFF1234"),
        Message::new("c").with_id(9u64).with_textbox(4, 2),
    ]);
    assert_eq!(record_fields(&data), vec![
        (0x0001, 0x23, 0x45),
        (0x1234, 0x12, 0x34),
        (9, 4, 2),
    ]);
}

#[test]
fn test_duplicate_ids_are_written() {
    let mut buf = Vec::new();
    let msgs = [
        Message::new("a").with_id(1u64),
        Message::new("b").with_id("0x1"),
        Message::new("c").with_id(0x10001u64),
    ];
    let summary = encode_messages(&mut buf, &msgs, &EncodeOptions::default()).unwrap();
    assert_eq!(summary.written, 3);
    assert_eq!(summary.duplicates, vec![1, 1]);
    assert_eq!(decode_messages(&buf).unwrap().len(), 3);
}

#[test]
fn test_encode_rejects_bad_ids_and_counts() {
    let mut buf = Vec::new();
    let err = encode_messages(&mut buf, &[], &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, StreamError::Header(HeaderError::InvalidMessageCount(0))));

    let mut buf = Vec::new();
    let msgs = [Message::new("a"), Message::new("b").with_id("nope")];
    let err = encode_messages(&mut buf, &msgs, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, StreamError::Id { index: 1, .. }));
}

#[test]
fn test_encode_with_base_header() {
    let mut header = ResourceHeader::new();
    header.id = 42;
    header.rom_crc = 0xDEAD_BEEF;
    header.reserved[0] = 0xAB;

    let mut buf = Vec::new();
    let opts = EncodeOptions { base_header: Some(header.clone()) };
    encode_messages(&mut buf, &[Message::new("x")], &opts).unwrap();
    assert_eq!(decode_resource(&buf).unwrap().header, header);
}

// ── File-level conversion ────────────────────────────────────────────────────

#[test]
fn test_json_file_roundtrip() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("msg.bin");
    let json = dir.path().join("msg.json");
    let back = dir.path().join("back.bin");
    let original = build_binary(7, 2, &[(5, 0, 0, "hello"), (6, 1, 2, "world")]);
    fs::write(&bin, &original).unwrap();

    let report = convert_file(&bin, &json, &ConvertOptions::default()).unwrap();
    assert_eq!(report.direction, Direction::BinaryToText(TextFormat::Json));
    assert_eq!(report.messages, 2);

    let text = fs::read_to_string(&json).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc, serde_json::json!([
        {"id": "0x5", "textboxType": 0, "textboxYPos": 0, "text": "hello"},
        {"id": "0x6", "textboxType": 1, "textboxYPos": 2, "text": "world"},
    ]));

    convert_file(&json, &back, &ConvertOptions::default()).unwrap();
    let rebuilt = fs::read(&back).unwrap();
    assert_eq!(&rebuilt[64..], &original[64..]);
}

#[test]
fn test_yaml_input_with_mixed_ids() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("msg.yml");
    let bin = dir.path().join("msg.dat");
    fs::write(&yaml, "- text: zero\n- id: 10\n  text: ten\n- id: '0x20'\n  textboxType: 3\n  textboxYPos: 4\n  text: hex\n- text: next\n").unwrap();

    let report = convert_file(&yaml, &bin, &ConvertOptions { atomic: true, ..Default::default() }).unwrap();
    assert_eq!(report.direction, Direction::TextToBinary(TextFormat::Yaml));
    assert_eq!(record_fields(&fs::read(&bin).unwrap()), vec![
        (0, 0, 0), (10, 0, 0), (0x20, 3, 4), (0x21, 0, 0),
    ]);
}

#[test]
fn test_preserve_header_reuses_existing_output() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("msg.json");
    let bin = dir.path().join("msg.bin");
    fs::write(&bin, build_binary(0x1122_3344, 1, &[(1, 0, 0, "old")])).unwrap();
    fs::write(&json, r#"[{"text": "new"}]"#).unwrap();

    let opts = ConvertOptions { preserve_header: true, ..Default::default() };
    convert_file(&json, &bin, &opts).unwrap();
    let resource = decode_resource(&fs::read(&bin).unwrap()).unwrap();
    assert_eq!(resource.header.id, 0x1122_3344);
    assert_eq!(resource.messages[0].text, "new");

    convert_file(&json, &bin, &ConvertOptions::default()).unwrap();
    let resource = decode_resource(&fs::read(&bin).unwrap()).unwrap();
    assert_eq!(resource.header.id, DEFAULT_RESOURCE_ID);
}

#[test]
fn test_usage_errors() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.yaml");
    let c = dir.path().join("c.bin");
    let d = dir.path().join("d.bin");
    fs::write(&a, "[]").unwrap();
    fs::write(&c, build_binary(0, 1, &[(1, 0, 0, "x")])).unwrap();

    assert!(matches!(convert_file(&a, &b, &ConvertOptions::default()), Err(ConvertError::Usage(_))));
    assert!(matches!(convert_file(&c, &d, &ConvertOptions::default()), Err(ConvertError::Usage(_))));

    let missing = dir.path().join("missing.bin");
    assert!(matches!(
        convert_file(&missing, &a, &ConvertOptions::default()),
        Err(ConvertError::InputNotFound(_))
    ));
}

#[test]
fn test_format_error_writes_no_output() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("bad.bin");
    let json = dir.path().join("bad.json");
    fs::write(&bin, build_binary(0, 0, &[])).unwrap();

    let err = convert_file(&bin, &json, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Stream(StreamError::Header(HeaderError::InvalidMessageCount(0)))));
    assert!(!json.exists());
}

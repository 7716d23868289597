use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::Result;

/// Prefix put in front of base64 GIF payloads.
pub const DATA_URL_PREFIX: &str = "data:image/gif;base64,";

/// Drops a `data:...,` header if there is one.
pub fn strip_data_url(payload: &str) -> &str {
    let payload = payload.trim();
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}

/// Decodes a base64 payload, with or without a data URL header, into GIF bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(strip_data_url(payload))?)
}

/// Base64-encodes GIF bytes as a `data:image/gif;base64,` URL.
pub fn encode_payload(bytes: &[u8]) -> String {
    let mut payload = String::from(DATA_URL_PREFIX);
    STANDARD.encode_string(bytes, &mut payload);
    payload
}

#[test]
fn strip_prefix() {
    assert_eq!(strip_data_url("data:image/gif;base64,R0lG"), "R0lG");
    assert_eq!(strip_data_url("data:application/octet-stream;base64,AAAA"), "AAAA");
    assert_eq!(strip_data_url("  R0lG\n"), "R0lG");
}

#[test]
fn payload_round_trip() {
    let payload = encode_payload(b"GIF89a");
    assert_eq!(payload, "data:image/gif;base64,R0lGODlh");
    assert_eq!(decode_payload(&payload).unwrap(), b"GIF89a");
    assert_eq!(decode_payload("R0lGODlh").unwrap(), b"GIF89a");
}

#[test]
fn bad_base64() {
    assert!(matches!(
        decode_payload("data:image/gif;base64,@@@"),
        Err(crate::Error::Transport(_))
    ));
}

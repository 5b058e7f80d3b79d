//! Legacy container header codec.
//!
//! A legacy file starts with a fixed 8192-byte slot holding a NUL-padded
//! UTF-8 JSON document. The document describes every dataset in the file:
//! name, dtype token, 1-3 element shape and absolute byte region. Extra
//! top-level fields (instrument metadata, capture notes) are free-form and
//! preserved as-is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::format::{HEADER_PAD, HEADER_SIZE};
use super::overlap::ByteRange;
use crate::util::{Error, Result};

/// Decoded legacy header document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyHeader {
    /// Declared datasets, in file order.
    #[serde(rename = "Data")]
    pub data: Vec<LegacyDataset>,
    /// Free-form instrument/capture metadata.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One dataset entry of the legacy header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyDataset {
    #[serde(rename = "Name")]
    pub name: String,
    /// dtype token, resolved through [`crate::util::ElementType::resolve`].
    pub dtype: String,
    /// Declared shape, 1-3 dimensions.
    #[serde(rename = "Size")]
    pub size: Vec<u64>,
    #[serde(rename = "Position")]
    pub position: ByteRange,
}

/// Extract the header text from the fixed-size slot: UTF-8 decode, strip
/// embedded NUL padding, trim surrounding whitespace.
pub fn header_text(bytes: &[u8]) -> Result<String> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::header(format!(
            "header slot truncated: {} of {} bytes",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    let text = std::str::from_utf8(&bytes[..HEADER_SIZE])
        .map_err(|e| Error::header(format!("header slot is not valid UTF-8: {}", e)))?;
    Ok(text.replace('\0', "").trim().to_string())
}

/// Decode the fixed-size header slot into a [`LegacyHeader`].
pub fn decode_header(bytes: &[u8]) -> Result<LegacyHeader> {
    let text = header_text(bytes)?;
    serde_json::from_str(&text).map_err(|e| Error::header(format!("unparseable header: {}", e)))
}

/// Encode a header back into an 8192-byte NUL-padded slot.
///
/// Round-trips logical content with [`decode_header`]; whitespace is not
/// preserved byte-for-byte.
pub fn encode_header(header: &LegacyHeader) -> Result<Vec<u8>> {
    let text = serde_json::to_string(header)
        .map_err(|e| Error::header(format!("unencodable header: {}", e)))?;
    if text.len() > HEADER_SIZE {
        return Err(Error::header(format!(
            "header text {} bytes exceeds the {} byte slot",
            text.len(),
            HEADER_SIZE
        )));
    }
    let mut slot = text.into_bytes();
    slot.resize(HEADER_SIZE, HEADER_PAD);
    Ok(slot)
}

/// Read and decode the header slot from the start of a legacy file.
pub fn read_header(path: impl AsRef<Path>) -> Result<LegacyHeader> {
    decode_header(&read_slot(path)?)
}

/// Read the raw header text (NUL-stripped) from a legacy file.
pub fn read_header_text(path: impl AsRef<Path>) -> Result<String> {
    header_text(&read_slot(path)?)
}

fn read_slot(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let mut slot = vec![0u8; HEADER_SIZE];
    file.read_exact(&mut slot).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::header("file ends inside the header slot".to_string())
        } else {
            Error::Io(e)
        }
    })?;
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> LegacyHeader {
        let mut extra = Map::new();
        extra.insert("Name".into(), Value::String("capture-042".into()));
        extra.insert("Operator".into(), Value::String("test rig".into()));
        LegacyHeader {
            data: vec![
                LegacyDataset {
                    name: "cube".into(),
                    dtype: "u32".into(),
                    size: vec![4, 4, 8],
                    position: ByteRange { start_byte: 8192, stop_byte: 8704, last_byte: 8704 },
                },
                LegacyDataset {
                    name: "position".into(),
                    dtype: "u32".into(),
                    size: vec![8],
                    position: ByteRange { start_byte: 8704, stop_byte: 8736, last_byte: 8736 },
                },
            ],
            extra,
        }
    }

    #[test]
    fn test_roundtrip() {
        let h = sample_header();
        let slot = encode_header(&h).unwrap();
        assert_eq!(slot.len(), HEADER_SIZE);
        let decoded = decode_header(&slot).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn test_nul_and_whitespace_stripped() {
        let mut slot = b"  {\"Data\": []}  ".to_vec();
        slot.resize(HEADER_SIZE, 0);
        let h = decode_header(&slot).unwrap();
        assert!(h.data.is_empty());
        assert_eq!(header_text(&slot).unwrap(), "{\"Data\": []}");
    }

    #[test]
    fn test_truncated_slot() {
        let slot = vec![0u8; HEADER_SIZE - 1];
        assert!(matches!(decode_header(&slot), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut slot = vec![0u8; HEADER_SIZE];
        slot[0] = 0xFF;
        slot[1] = 0xFE;
        assert!(matches!(decode_header(&slot), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_unparseable_text() {
        let mut slot = b"not json at all".to_vec();
        slot.resize(HEADER_SIZE, 0);
        assert!(matches!(decode_header(&slot), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_oversized_header_rejected() {
        let mut h = sample_header();
        h.extra.insert("Notes".into(), Value::String("x".repeat(HEADER_SIZE)));
        assert!(matches!(encode_header(&h), Err(Error::MalformedHeader(_))));
    }
}

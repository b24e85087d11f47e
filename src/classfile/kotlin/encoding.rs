//! Decoding of the `d1` string array back into protobuf bytes.
//!
//! The Kotlin compiler stores binary metadata in annotation strings. Modern
//! compilers use "UTF-8 mode", flagged by a leading NUL character, where every
//! char holds one byte. Older ones pack bytes into 7-bit chars.

use crate::error::MetadataError;

const UTF8_MODE_MARKER: char = '\u{0}';
const LEGACY_MODE_MARKER: char = '\u{FFFF}';

pub(crate) fn decode_bytes(data: &[String]) -> Result<Vec<u8>, MetadataError> {
    let first = data.first().and_then(|s| s.chars().next());
    match first {
        Some(UTF8_MODE_MARKER) => chars_to_bytes(data, 1),
        Some(LEGACY_MODE_MARKER) => decode_legacy(data, 1),
        _ => decode_legacy(data, 0),
    }
}

/// Concatenate all chars as bytes, dropping `skip` leading marker chars.
fn chars_to_bytes(data: &[String], skip: usize) -> Result<Vec<u8>, MetadataError> {
    let mut bytes = Vec::with_capacity(data.iter().map(String::len).sum());
    for c in data.iter().flat_map(|s| s.chars()).skip(skip) {
        let code = c as u32;
        if code > 0xFF {
            return Err(MetadataError::Encoding(format!(
                "character U+{:04X} does not fit a byte",
                code
            )));
        }
        bytes.push(code as u8);
    }
    Ok(bytes)
}

fn decode_legacy(data: &[String], skip: usize) -> Result<Vec<u8>, MetadataError> {
    let mut packed = chars_to_bytes(data, skip)?;
    // Undo the +1 (mod 0x80) applied on encoding
    for byte in packed.iter_mut() {
        *byte = byte.wrapping_add(0x7F) & 0x7F;
    }
    decode_7_to_8(&packed)
}

/// Unpack a little-endian stream of 7-bit groups into 8-bit bytes.
fn decode_7_to_8(data: &[u8]) -> Result<Vec<u8>, MetadataError> {
    let result_len = 7 * data.len() / 8;
    let mut result = Vec::with_capacity(result_len);
    let mut byte_index = 0;
    let mut bit = 0;
    let truncated = || MetadataError::Encoding("truncated 7-bit stream".to_string());
    for _ in 0..result_len {
        let first = (*data.get(byte_index).ok_or_else(truncated)? as u32) >> bit;
        byte_index += 1;
        let next = *data.get(byte_index).ok_or_else(truncated)?;
        let second = ((next as u32) & ((1 << (bit + 1)) - 1)) << (7 - bit);
        result.push((first + second) as u8);
        if bit == 6 {
            byte_index += 1;
            bit = 0;
        } else {
            bit += 1;
        }
    }
    Ok(result)
}

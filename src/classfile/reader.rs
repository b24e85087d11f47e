//! Big-endian byte cursor over class file data

use crate::error::UnitError;

pub(crate) struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8, UnitError> {
        let value = *self.data.get(self.pos).ok_or(UnitError::UnexpectedEof)?;
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16, UnitError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32, UnitError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], UnitError> {
        let end = self.pos.checked_add(len).ok_or(UnitError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(UnitError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), UnitError> {
        self.read_slice(len).map(|_| ())
    }

    /// Read an attribute header and return its name index and body.
    pub(crate) fn read_attribute(&mut self) -> Result<(u16, &'a [u8]), UnitError> {
        let name_index = self.read_u2()?;
        let length = self.read_u4()? as usize;
        let body = self.read_slice(length)?;
        Ok((name_index, body))
    }
}

/// Decode the JVM's modified UTF-8 (`CONSTANT_Utf8_info`).
///
/// Differs from standard UTF-8 in that NUL is written as `0xC0 0x80` and
/// supplementary characters as two three-byte surrogates. Unpaired
/// surrogates, which obfuscators do emit, are replaced rather than rejected.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<String, UnitError> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes, i + 1)?;
            units.push((((b & 0x1F) as u16) << 6) | b2);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes, i + 1)?;
            let b3 = continuation(bytes, i + 2)?;
            units.push((((b & 0x0F) as u16) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return Err(UnitError::InvalidUtf8);
        }
    }

    Ok(String::from_utf16_lossy(&units))
}

fn continuation(bytes: &[u8], index: usize) -> Result<u16, UnitError> {
    match bytes.get(index) {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(UnitError::InvalidUtf8),
    }
}

//! Constant pool parsing

use super::reader::{ClassReader, decode_modified_utf8};
use crate::error::UnitError;

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Class { name_index: u16 },
    Other,
    /// Index 0 and the second slot of longs and doubles
    Unusable,
}

#[derive(Debug)]
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ClassReader<'_>) -> Result<Self, UnitError> {
        let count = u32::from(reader.read_u2()?);
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u32 = 1;
        while index < count {
            // index < count <= u16::MAX
            let slot = index as u16;
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.read_slice(length)?)?)
                }
                3 => Constant::Integer(reader.read_u4()? as i32),
                4 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    // The second slot must still lie inside the pool
                    if index + 1 >= count {
                        return Err(UnitError::InvalidConstantIndex { index: slot });
                    }
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    index += 1;
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                // Field/method refs, NameAndType, Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                other => return Err(UnitError::UnsupportedConstant { tag: other, index: slot }),
            };
            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, UnitError> {
        self.entries
            .get(index as usize)
            .ok_or(UnitError::InvalidConstantIndex { index })
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, UnitError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(UnitError::InvalidConstantIndex { index }),
        }
    }

    pub(crate) fn integer(&self, index: u16) -> Result<i32, UnitError> {
        match self.get(index)? {
            Constant::Integer(value) => Ok(*value),
            _ => Err(UnitError::InvalidConstantIndex { index }),
        }
    }

    /// Internal (slash-separated) name of a `CONSTANT_Class` entry.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str, UnitError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(UnitError::InvalidConstantIndex { index }),
        }
    }

    /// Like [`Self::class_name`] but index 0 means "absent".
    pub(crate) fn optional_class_name(&self, index: u16) -> Result<Option<&str>, UnitError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    pub(crate) fn optional_utf8(&self, index: u16) -> Result<Option<&str>, UnitError> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(Some)
    }
}

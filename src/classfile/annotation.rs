//! `RuntimeVisibleAnnotations` element values, as far as `kotlin.Metadata` needs them

use super::constant_pool::ConstantPool;
use super::reader::ClassReader;
use crate::error::UnitError;

/// Descriptor of the annotation carrying Kotlin metadata
pub const KOTLIN_METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

/// Deepest nesting of array and annotation element values accepted
pub const MAX_ELEMENT_DEPTH: usize = 64;

/// An annotation element value.
///
/// Only the shapes `kotlin.Metadata` uses are kept; enums, class literals,
/// nested annotations and wide constants collapse to `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Int(i32),
    String(String),
    Array(Vec<ElementValue>),
    Other,
}

impl ElementValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ElementValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ElementValue]> {
        match self {
            ElementValue::Array(values) => Some(values),
            _ => None,
        }
    }
}

/// Named element values of one annotation, in declaration order
pub type AnnotationElements = Vec<(String, ElementValue)>;

/// Scan a `RuntimeVisibleAnnotations` body for the annotation with `descriptor`.
pub(crate) fn find_annotation(
    body: &[u8],
    pool: &ConstantPool,
    descriptor: &str,
) -> Result<Option<AnnotationElements>, UnitError> {
    let mut reader = ClassReader::new(body);
    let count = reader.read_u2()?;
    let mut found = None;
    for _ in 0..count {
        let type_index = reader.read_u2()?;
        let elements = read_elements(&mut reader, pool, 0)?;
        if found.is_none() && pool.utf8(type_index)? == descriptor {
            found = Some(elements);
        }
    }
    Ok(found)
}

fn read_elements(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<AnnotationElements, UnitError> {
    let pairs = reader.read_u2()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        let value = read_value(reader, pool, depth)?;
        elements.push((name, value));
    }
    Ok(elements)
}

fn read_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<ElementValue, UnitError> {
    if depth > MAX_ELEMENT_DEPTH {
        return Err(UnitError::InvalidDescriptor(format!(
            "annotation values nested deeper than {}",
            MAX_ELEMENT_DEPTH
        )));
    }
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => ElementValue::Int(pool.integer(reader.read_u2()?)?),
        b's' => ElementValue::String(pool.utf8(reader.read_u2()?)?.to_string()),
        b'D' | b'F' | b'J' | b'c' => {
            reader.read_u2()?;
            ElementValue::Other
        }
        b'e' => {
            reader.skip(4)?;
            ElementValue::Other
        }
        b'@' => {
            reader.read_u2()?;
            read_elements(reader, pool, depth + 1)?;
            ElementValue::Other
        }
        b'[' => {
            let count = reader.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_value(reader, pool, depth + 1)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(UnitError::InvalidDescriptor(format!(
                "unknown annotation element tag '{}'",
                other as char
            )));
        }
    };
    Ok(value)
}

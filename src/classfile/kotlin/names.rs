//! Name resolution against the `d2` string array and its `StringTableTypes` records

use super::messages::{Record, StringTableTypes};
use crate::error::MetadataError;

/// Upper bound on expanded records; real tables hold a few thousand
const MAX_EXPANDED_RECORDS: usize = 1 << 20;

impl Record {
    fn apply_operations(&self, mut value: String) -> String {
        if let &[begin, end, ..] = self.substring_index.as_slice() {
            let length = value.chars().count() as i32;
            if 0 <= begin && begin <= end && end <= length {
                value = value
                    .chars()
                    .skip(begin as usize)
                    .take((end - begin) as usize)
                    .collect();
            }
        }
        if let &[from, to, ..] = self.replace_char.as_slice()
            && let (Some(from), Some(to)) = (char::from_u32(from as u32), char::from_u32(to as u32))
        {
            value = value.replace(from, &to.to_string());
        }
        match self.operation.unwrap_or(0) {
            // INTERNAL_TO_CLASS_ID
            1 => value.replace('$', "."),
            // DESC_TO_CLASS_ID
            2 => {
                let length = value.chars().count();
                if length >= 2 {
                    value = value.chars().skip(1).take(length - 2).collect();
                }
                value.replace('$', ".")
            }
            _ => value,
        }
    }
}

/// Resolves the integer name ids used throughout the metadata protobuf.
pub(crate) struct NameResolver<'a> {
    records: Vec<Record>,
    /// Record index for each string id, after range expansion
    expanded: Vec<usize>,
    strings: &'a [String],
}

impl<'a> NameResolver<'a> {
    /// Build from a decoded `StringTableTypes` and the `d2` strings.
    pub(crate) fn new(table: StringTableTypes, strings: &'a [String]) -> Result<Self, MetadataError> {
        let records = table.record;
        let mut expanded = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let range = record.range.unwrap_or(1);
            let range = usize::try_from(range).map_err(|_| {
                MetadataError::Protobuf(format!("negative string table range {}", range))
            })?;
            if expanded.len() + range > MAX_EXPANDED_RECORDS {
                return Err(MetadataError::Protobuf("string table too large".to_string()));
            }
            expanded.extend(std::iter::repeat_n(index, range));
        }

        Ok(Self {
            records,
            expanded,
            strings,
        })
    }

    /// Resolve a name id.
    ///
    /// `Ok(None)` means the name exists but refers to the compiler's table of
    /// predefined strings, which is not modeled. An id outside both the
    /// records and `d2` means the metadata is inconsistent.
    pub(crate) fn lookup(&self, id: i32) -> Result<Option<String>, MetadataError> {
        let index = usize::try_from(id).map_err(|_| MetadataError::UnresolvedName(id))?;
        let record = self.expanded.get(index).map(|&r| &self.records[r]);

        let base = match record {
            Some(Record {
                string: Some(value),
                ..
            }) => value.clone(),
            Some(Record {
                predefined_index: Some(_),
                ..
            }) => return Ok(None),
            _ => self
                .strings
                .get(index)
                .cloned()
                .ok_or(MetadataError::UnresolvedName(id))?,
        };

        Ok(Some(match record {
            Some(record) => record.apply_operations(base),
            None => base,
        }))
    }
}

//! Reading class files out of classpath entries
//!
//! [`ArchiveReader`] walks the entries of a jar lazily, [`LooseClasses`]
//! walks a directory of `.class` files. Both yield [`UnitEntry`] values and
//! report unreadable entries without stopping.

mod loose;
mod source;

pub use loose::LooseClasses;
pub use source::{ArchiveSource, DirectorySource};

use crate::error::ArchiveError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";

/// Bytes of one class file and the entry name it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// `META-INF/versions/9/module-info.class` -> `META-INF.versions.9.module-info`
pub fn normalize_entry_name(name: &str) -> String {
    let name = name.strip_suffix(CLASS_SUFFIX).unwrap_or(name);
    name.replace(['/', '\\'], ".")
}

/// Whether an entry should be parsed as a class file
fn is_unit_entry(name: &str, module_descriptor: &str) -> bool {
    name.ends_with(CLASS_SUFFIX) && normalize_entry_name(name) != module_descriptor
}

pub struct ArchiveReader;

impl ArchiveReader {
    /// Open `path` as a zip archive.
    ///
    /// Entries whose normalized name equals `module_descriptor` are skipped,
    /// along with directories and anything that is not a `.class` file.
    pub fn open(path: impl AsRef<Path>, module_descriptor: &str) -> Result<ArchiveUnits, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Unreadable {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Opened {:?} with {} entries", path, archive.len());

        Ok(ArchiveUnits {
            path,
            archive,
            next_index: 0,
            module_descriptor: module_descriptor.to_string(),
        })
    }
}

/// Lazy iterator over the class files of one archive
pub struct ArchiveUnits {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    next_index: usize,
    module_descriptor: String,
}

impl ArchiveUnits {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of entries in the archive, including skipped ones
    pub fn entry_count(&self) -> usize {
        self.archive.len()
    }
}

fn entry_failed(path: &Path, entry: String, reason: impl ToString) -> ArchiveError {
    ArchiveError::EntryFailed {
        path: path.to_path_buf(),
        entry,
        reason: reason.to_string(),
    }
}

impl Iterator for ArchiveUnits {
    type Item = Result<UnitEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let mut entry = match self.archive.by_index(index) {
                Ok(entry) => entry,
                Err(err) => return Some(Err(entry_failed(&self.path, format!("#{}", index), err))),
            };
            if entry.is_dir() || !is_unit_entry(entry.name(), &self.module_descriptor) {
                continue;
            }

            let name = entry.name().to_string();
            // Declared sizes are untrusted
            let mut bytes = Vec::with_capacity((entry.size() as usize).min(1 << 20));
            return Some(match entry.read_to_end(&mut bytes) {
                Ok(_) => Ok(UnitEntry { name, bytes }),
                Err(err) => Err(entry_failed(&self.path, name, err)),
            });
        }
        None
    }
}

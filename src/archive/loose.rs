//! Class files lying loose in a directory tree

use super::{UnitEntry, is_unit_entry};
use crate::error::ArchiveError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Iterator over `.class` files below a directory, in file-name order.
///
/// Entry names are relative to the root with `/` separators, matching jar
/// entry names. Symlinks are not followed.
pub struct LooseClasses {
    root: PathBuf,
    walker: walkdir::IntoIter,
    module_descriptor: String,
}

impl LooseClasses {
    pub fn new(root: impl AsRef<Path>, module_descriptor: &str) -> Self {
        let root = root.as_ref().to_path_buf();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Self {
            root,
            walker,
            module_descriptor: module_descriptor.to_string(),
        }
    }

    fn entry_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Iterator for LooseClasses {
    type Item = Result<UnitEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    return Some(Err(ArchiveError::WalkFailed {
                        path: err.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                        reason: err.to_string(),
                    }));
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = self.entry_name(entry.path());
            if !is_unit_entry(&name, &self.module_descriptor) {
                continue;
            }

            return Some(match std::fs::read(entry.path()) {
                Ok(bytes) => Ok(UnitEntry { name, bytes }),
                Err(err) => Err(ArchiveError::EntryFailed {
                    path: self.root.clone(),
                    entry: name,
                    reason: err.to_string(),
                }),
            });
        }
    }
}

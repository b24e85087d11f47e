//! [`ClassSource`] implementations backed by a jar or a class directory

use crate::classfile::ClassSource;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::ZipArchive;

/// `pkg.Outer$Inner` -> `pkg/Outer$Inner.class`
fn class_entry_name(binary_name: &str) -> String {
    format!("{}.class", binary_name.replace('.', "/"))
}

/// Loads classes from a jar through its own handle, opened on first use.
///
/// The handle is separate from the one the scan iterates with, so lookups
/// never disturb the iteration.
pub struct ArchiveSource {
    path: PathBuf,
    archive: Mutex<Option<ZipArchive<BufReader<File>>>>,
}

impl ArchiveSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            archive: Mutex::new(None),
        }
    }

    fn open(&self) -> Option<ZipArchive<BufReader<File>>> {
        let file = File::open(&self.path)
            .map_err(|err| tracing::debug!("Cannot reopen {:?}: {}", self.path, err))
            .ok()?;
        ZipArchive::new(BufReader::new(file))
            .map_err(|err| tracing::debug!("Cannot reopen {:?}: {}", self.path, err))
            .ok()
    }
}

impl ClassSource for ArchiveSource {
    fn read_class(&self, binary_name: &str) -> Option<Vec<u8>> {
        let mut guard = self.archive.lock().ok()?;
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        let archive = guard.as_mut()?;
        let mut entry = archive.by_name(&class_entry_name(binary_name)).ok()?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).ok()?;
        Some(bytes)
    }
}

/// Loads classes from a directory laid out by package
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ClassSource for DirectorySource {
    fn read_class(&self, binary_name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.root.join(class_entry_name(binary_name))).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ClassBuilder, write_jar};

    #[test]
    fn test_class_entry_name() {
        assert_eq!(class_entry_name("pkg.Outer$Inner"), "pkg/Outer$Inner.class");
        assert_eq!(class_entry_name("Main"), "Main.class");
    }

    #[test]
    fn test_archive_source() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("a.jar");
        let bytes = ClassBuilder::new("pkg/Outer$Inner").build();
        write_jar(&jar, &[("pkg/Outer$Inner.class", bytes.clone())]);

        let source = ArchiveSource::new(&jar);
        assert_eq!(source.read_class("pkg.Outer$Inner"), Some(bytes));
        assert_eq!(source.read_class("pkg.Missing"), None);
    }

    #[test]
    fn test_archive_source_missing_file() {
        let source = ArchiveSource::new("/nonexistent/archive.jar");
        assert_eq!(source.read_class("pkg.A"), None);
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/A.class"), b"bytes").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.read_class("pkg.A"), Some(b"bytes".to_vec()));
        assert_eq!(source.read_class("pkg.B"), None);
    }
}

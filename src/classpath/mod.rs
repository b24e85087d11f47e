//! Classpath resolution: from a root directory to the ordered entries to scan

use crate::config::ScanConfig;
use crate::error::ResolutionError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory of loose class files
    Directory,
    /// A jar
    Archive,
}

/// One element of the resolved classpath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// On the classpath, but contributes no candidates
    pub excluded: bool,
}

impl ClasspathEntry {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

pub struct ClasspathResolver {
    pub(crate) archive_extension: String,
    pub(crate) library_dir: String,
    pub(crate) excluded_archives: Vec<String>,
}

impl ClasspathResolver {
    pub fn new() -> Self {
        Self::from_config(&ScanConfig::default())
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            archive_extension: config.archive_extension.trim_start_matches('.').to_string(),
            library_dir: config.library_dir.clone(),
            excluded_archives: config.excluded_archives.clone(),
        }
    }

    pub fn with_excluded_archives(mut self, excluded_archives: Vec<String>) -> Self {
        self.excluded_archives = excluded_archives;
        self
    }

    /// Resolve `root` into: the root itself, the archives directly in it,
    /// then the archives directly in its library directory. Each archive
    /// group is sorted by file name.
    pub fn resolve(&self, root: impl AsRef<Path>) -> Result<Vec<ClasspathEntry>, ResolutionError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(ResolutionError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ResolutionError::NotADirectory(root.to_path_buf()));
        }

        let mut entries = vec![ClasspathEntry {
            path: root.to_path_buf(),
            kind: EntryKind::Directory,
            excluded: false,
        }];
        for path in self.list_archives(root)? {
            entries.push(self.archive_entry(path));
        }

        let library = root.join(&self.library_dir);
        if library.is_dir() {
            match self.list_archives(&library) {
                Ok(archives) => entries.extend(archives.into_iter().map(|path| self.archive_entry(path))),
                Err(err) => tracing::warn!("Skipping library directory: {}", err),
            }
        }

        tracing::debug!(
            "Resolved {} classpath entries under {:?}",
            entries.len(),
            root
        );
        Ok(entries)
    }

    fn archive_entry(&self, path: PathBuf) -> ClasspathEntry {
        let excluded = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.excluded_archives.iter().any(|excluded| excluded == name));
        if excluded {
            tracing::debug!("Excluding archive {:?}", path);
        }
        ClasspathEntry {
            path,
            kind: EntryKind::Archive,
            excluded,
        }
    }

    /// Archive files directly inside `dir`, sorted by file name
    fn list_archives(&self, dir: &Path) -> Result<Vec<PathBuf>, ResolutionError> {
        let list_failed = |source| ResolutionError::ListFailed {
            path: dir.to_path_buf(),
            source,
        };
        let mut archives = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_failed)? {
            let path = entry.map_err(list_failed)?.path();
            if path.is_file() && self.is_archive(&path) {
                archives.push(path);
            }
        }
        archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(archives)
    }

    fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.archive_extension)
    }
}

impl Default for ClasspathResolver {
    fn default() -> Self {
        Self::new()
    }
}

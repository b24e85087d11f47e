//! Writing the finished index document

use crate::error::OutputError;
use crate::index::SymbolIndex;
use std::fs;
use std::path::{Path, PathBuf};

/// Sibling path the document is staged at before it replaces `path`
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.json".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Write `index` as JSON to `path`, replacing any previous document.
///
/// The document is staged next to the target and renamed over it, so the
/// target only ever holds a complete document.
pub fn write_index(index: &SymbolIndex, path: &Path, pretty: bool) -> Result<(), OutputError> {
    let json = index.to_json(pretty)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let staging = staging_path(path);
    let result = fs::write(&staging, json).and_then(|()| fs::rename(&staging, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&staging);
        return Err(OutputError::WriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    tracing::info!("Wrote {} candidates to {:?}", index.len(), path);
    Ok(())
}

//! # classpath-index - Import Candidates from JVM Classpaths
//!
//! Builds a symbol index over a directory of compiled archives: every public
//! class and every public static function reachable from the jars in it,
//! normalized into `(importPath, shortName, displayForm)` triples for
//! autocomplete and import suggestion.
//!
//! Class files are read directly; nothing from the scanned archives is ever
//! loaded or executed. Kotlin metadata is decoded when present so that
//! Kotlin visibility and names take precedence over what the bytecode shows,
//! and classes whose metadata cannot be decoded fall back to the plain JVM
//! view.
//!
//! ## Architecture
//!
//! ```text
//! root dir ──► classpath ──► archive ──► classfile ──► extractor ──► index ──► output
//!              (entries)     (bytes)     (BinaryUnit)  (candidates)  (dedup)   (JSON)
//! ```
//!
//! ## Modules
//!
//! - [`classpath`]: root directory to ordered classpath entries
//! - [`archive`]: class files out of jars and directories
//! - [`classfile`]: class file and Kotlin metadata parsing
//! - [`extractor`]: public surface of one class as import candidates
//! - [`index`]: parallel scan and first-wins deduplication
//! - [`output`]: atomic JSON document writing
//! - [`config`]: configuration with environment variable support
//! - [`types`]: candidate and statistics types
//! - [`error`]: error types
//!
//! ## Usage Example
//!
//! ```no_run
//! use classpath_index::config::Config;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::new(None)?;
//!     let stats = classpath_index::run(Path::new("/opt/app"), Path::new("index.json"), &config)?;
//!     println!("{} candidates", stats.candidates_emitted - stats.duplicates_dropped);
//!     Ok(())
//! }
//! ```

/// Class files out of jars and class directories
pub mod archive;

/// Class file parsing with Kotlin metadata enrichment
pub mod classfile;

/// Classpath resolution from a root directory
pub mod classpath;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Import candidates from parsed classes
pub mod extractor;

/// Index building and deduplication
pub mod index;

/// JSON document writing
pub mod output;

/// Candidate and statistics types
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::error::IndexError;
use crate::index::IndexBuilder;
use crate::types::ScanStats;
use std::path::Path;

/// Index the classpath under `root` and write the document to `output`.
///
/// On error the output file is left as it was.
pub fn run(root: &Path, output: &Path, config: &Config) -> Result<ScanStats, IndexError> {
    let index = IndexBuilder::new(config.scan.clone()).build(root)?;
    output::write_index(&index, output, config.output.pretty)?;
    Ok(*index.stats())
}

/// Centralized error types for classpath-index using thiserror
///
/// Each scope of the scan has its own error type so that failures can be
/// contained where they happen: a malformed class file never aborts its
/// archive, and an unreadable archive never aborts the run.
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end an indexing run.
///
/// Archive and class file errors never appear here: the index builder
/// contains them per entry and per unit.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Classpath resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// The root directory cannot be turned into a classpath
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Root directory does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Root path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to list directory '{path}': {source}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors scoped to one archive or directory entry of the classpath
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open archive '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to read archive '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read entry '{entry}' of '{path}': {reason}")]
    EntryFailed {
        path: PathBuf,
        entry: String,
        reason: String,
    },

    #[error("Failed to walk directory '{path}': {reason}")]
    WalkFailed { path: PathBuf, reason: String },
}

/// A single class file that cannot be parsed, even without rich metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unexpected end of class file")]
    UnexpectedEof,

    #[error("invalid class file magic header {0:#010x}")]
    InvalidMagic(u32),

    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("unsupported constant pool tag {tag} at index {index}")]
    UnsupportedConstant { tag: u8, index: u16 },

    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },

    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid modified UTF-8 string in constant pool")]
    InvalidUtf8,

    #[error("{trailing} trailing bytes after class file end")]
    TrailingBytes { trailing: usize },
}

/// Rich (Kotlin) metadata was present but could not be used.
///
/// Never escapes a unit: the unit degrades to its raw view instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata version {0} is newer than supported")]
    UnsupportedVersion(String),

    #[error("metadata kind {0} has no representable declarations")]
    UnsupportedKind(i32),

    #[error("metadata annotation is missing '{0}'")]
    MissingElement(&'static str),

    #[error("malformed annotation element '{0}'")]
    MalformedElement(String),

    #[error("undecodable d1 payload: {0}")]
    Encoding(String),

    #[error("malformed protobuf: {0}")]
    Protobuf(String),

    #[error("string table has no entry {0}")]
    UnresolvedName(i32),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to writing the finished index
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to serialize index: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<prost::DecodeError> for MetadataError {
    fn from(err: prost::DecodeError) -> Self {
        MetadataError::Protobuf(err.to_string())
    }
}

/// Configuration system for classpath-index
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, IndexError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Classpath scanning configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// Output document configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Classpath scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// File extension of archives, without the dot (matched exactly)
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,

    /// Name of the library subdirectory scanned after the root
    #[serde(default = "default_library_dir")]
    pub library_dir: String,

    /// Archive file names kept on the classpath but never indexed
    #[serde(default = "default_excluded_archives")]
    pub excluded_archives: Vec<String>,

    /// Normalized entry name of the module descriptor, which is skipped
    #[serde(default = "default_module_descriptor")]
    pub module_descriptor: String,

    /// Index `.class` files lying directly under the root directory tree
    #[serde(default = "default_scan_loose_classes")]
    pub scan_loose_classes: bool,

    /// Worker threads; 0 picks the number of CPUs
    #[serde(default)]
    pub jobs: usize,
}

/// Output document configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Indent the JSON document
    #[serde(default)]
    pub pretty: bool,
}

// Default value functions
fn default_archive_extension() -> String {
    "jar".to_string()
}

fn default_library_dir() -> String {
    "lib".to_string()
}

fn default_excluded_archives() -> Vec<String> {
    vec!["executors.jar".to_string()]
}

fn default_module_descriptor() -> String {
    "module-info".to_string()
}

fn default_scan_loose_classes() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            archive_extension: default_archive_extension(),
            library_dir: default_library_dir(),
            excluded_archives: default_excluded_archives(),
            module_descriptor: default_module_descriptor(),
            scan_loose_classes: default_scan_loose_classes(),
            jobs: 0,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> Result<Self, IndexError> {
        match path {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)
            }
            None => {
                tracing::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), IndexError> {
        let extension = self.scan.archive_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scan.archive_extension".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.scan.library_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scan.library_dir".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.scan.library_dir.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                key: "scan.library_dir".to_string(),
                reason: format!(
                    "must be a single directory name, got '{}'",
                    self.scan.library_dir
                ),
            }
            .into());
        }

        if self.scan.module_descriptor.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scan.module_descriptor".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Worker threads
        if let Some(jobs) = lookup("CLASSPATH_INDEX_JOBS") {
            match jobs.trim().parse() {
                Ok(jobs) => self.scan.jobs = jobs,
                Err(_) => tracing::warn!("Ignoring invalid CLASSPATH_INDEX_JOBS: {:?}", jobs),
            }
        }

        // Additional excluded archives, comma-separated
        if let Some(excluded) = lookup("CLASSPATH_INDEX_EXCLUDE") {
            for name in excluded.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                if !self.scan.excluded_archives.iter().any(|known| known == name) {
                    self.scan.excluded_archives.push(name.to_string());
                }
            }
        }

        // Pretty output
        if let Some(pretty) = lookup("CLASSPATH_INDEX_PRETTY") {
            match pretty.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.output.pretty = true,
                "0" | "false" | "no" | "off" => self.output.pretty = false,
                _ => tracing::warn!("Ignoring invalid CLASSPATH_INDEX_PRETTY: {:?}", pretty),
            }
        }
    }

    /// Load from an optional file, then apply environment overrides
    pub fn new(path: Option<&Path>) -> Result<Self, IndexError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests;

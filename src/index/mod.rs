//! Index building: scan every classpath entry and merge the candidates
//!
//! Entries are scanned independently, in parallel when configured, each
//! into its own [`EntryScan`]. Merging happens afterwards in classpath
//! order, so the first occurrence of a candidate wins exactly as in a
//! sequential run.

use crate::archive::{ArchiveReader, ArchiveSource, DirectorySource, LooseClasses, UnitEntry};
use crate::classfile::{BinaryUnit, TypeResolver};
use crate::classpath::{ClasspathEntry, ClasspathResolver, EntryKind};
use crate::config::ScanConfig;
use crate::error::{ArchiveError, IndexError, OutputError};
use crate::extractor::SymbolExtractor;
use crate::types::{ImportCandidate, ScanStats};
use indexmap::IndexSet;
use rayon::prelude::*;
use std::path::Path;

/// The deduplicated candidates of a run, in first-insertion order
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    candidates: IndexSet<ImportCandidate>,
    stats: ScanStats,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate; returns `false` if it was already present
    pub fn insert(&mut self, candidate: ImportCandidate) -> bool {
        self.candidates.insert(candidate)
    }

    pub fn contains(&self, candidate: &ImportCandidate) -> bool {
        self.candidates.contains(candidate)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.candidates.iter()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Merge one entry's scan, counting candidates that were already indexed
    pub fn merge(&mut self, scan: EntryScan) {
        let mut stats = scan.stats;
        for candidate in scan.candidates {
            if !self.insert(candidate) {
                stats.duplicates_dropped += 1;
            }
        }
        self.stats.absorb(&stats);
    }

    /// The JSON document: an array of candidate objects
    pub fn to_json(&self, pretty: bool) -> Result<String, OutputError> {
        let candidates: Vec<&ImportCandidate> = self.candidates.iter().collect();
        let json = if pretty {
            serde_json::to_string_pretty(&candidates)?
        } else {
            serde_json::to_string(&candidates)?
        };
        Ok(json)
    }
}

impl FromIterator<ImportCandidate> for SymbolIndex {
    fn from_iter<T: IntoIterator<Item = ImportCandidate>>(iter: T) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
            stats: ScanStats::default(),
        }
    }
}

/// Candidates and counters from one classpath entry, before merging
#[derive(Debug, Clone, Default)]
pub struct EntryScan {
    pub candidates: Vec<ImportCandidate>,
    pub stats: ScanStats,
}

pub struct IndexBuilder {
    config: ScanConfig,
    extractor: SymbolExtractor,
}

impl IndexBuilder {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            extractor: SymbolExtractor::new(),
        }
    }

    /// Resolve the classpath under `root` and index it.
    ///
    /// Only a root that cannot be listed fails the build; unreadable
    /// archives and malformed classes are skipped and counted.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<SymbolIndex, IndexError> {
        let root = root.as_ref();
        let entries = ClasspathResolver::from_config(&self.config).resolve(root)?;
        tracing::info!(
            "Scanning {} classpath entries under {:?}",
            entries.len(),
            root
        );

        let index = self.scan_entries(&entries);
        let stats = index.stats();
        tracing::info!(
            "Indexed {} candidates from {} units ({} malformed, {} with degraded metadata, {} unreadable archives)",
            index.len(),
            stats.units_parsed,
            stats.units_malformed,
            stats.units_degraded,
            stats.archives_unreadable
        );
        Ok(index)
    }

    /// Scan entries and merge them in the given order
    pub fn scan_entries(&self, entries: &[ClasspathEntry]) -> SymbolIndex {
        let scans: Vec<EntryScan> = if self.config.jobs == 1 || entries.len() < 2 {
            entries.iter().map(|entry| self.scan_entry(entry)).collect()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    entries
                        .par_iter()
                        .map(|entry| self.scan_entry(entry))
                        .collect()
                }),
                Err(err) => {
                    tracing::warn!("Falling back to sequential scan: {}", err);
                    entries.iter().map(|entry| self.scan_entry(entry)).collect()
                }
            }
        };

        let mut index = SymbolIndex::new();
        for scan in scans {
            index.merge(scan);
        }
        index
    }

    /// Scan one classpath entry in isolation
    pub fn scan_entry(&self, entry: &ClasspathEntry) -> EntryScan {
        let mut scan = EntryScan::default();
        if entry.excluded {
            scan.stats.entries_excluded += 1;
            return scan;
        }

        match entry.kind {
            EntryKind::Directory => {
                if !self.config.scan_loose_classes {
                    return scan;
                }
                let resolver = TypeResolver::new(DirectorySource::new(&entry.path));
                let units = LooseClasses::new(&entry.path, &self.config.module_descriptor);
                self.scan_units(units, &resolver, &mut scan);
            }
            EntryKind::Archive => {
                let units = match ArchiveReader::open(&entry.path, &self.config.module_descriptor) {
                    Ok(units) => units,
                    Err(err) => {
                        tracing::warn!("Skipping unreadable archive: {}", err);
                        scan.stats.archives_unreadable += 1;
                        return scan;
                    }
                };
                let resolver = TypeResolver::new(ArchiveSource::new(&entry.path));
                self.scan_units(units, &resolver, &mut scan);
            }
        }

        scan.stats.entries_scanned += 1;
        scan.stats.candidates_emitted = scan.candidates.len();
        tracing::info!(
            "{:?}: {} units, {} candidates",
            entry.path,
            scan.stats.units_parsed,
            scan.candidates.len()
        );
        scan
    }

    fn scan_units(
        &self,
        units: impl Iterator<Item = Result<UnitEntry, ArchiveError>>,
        resolver: &TypeResolver,
        scan: &mut EntryScan,
    ) {
        for unit in units {
            let unit = match unit {
                Ok(unit) => unit,
                Err(err) => {
                    tracing::warn!("{}", err);
                    scan.stats.entry_errors += 1;
                    continue;
                }
            };

            let parsed = match BinaryUnit::parse(&unit.bytes, resolver) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!("Skipping malformed class {}: {}", unit.name, err);
                    scan.stats.units_malformed += 1;
                    continue;
                }
            };

            scan.stats.units_parsed += 1;
            if parsed.has_rich_metadata() {
                scan.stats.units_rich += 1;
            }
            if let Some(reason) = parsed.degradation() {
                tracing::debug!(
                    "Degraded metadata in {}, using raw view: {}",
                    unit.name,
                    reason
                );
                scan.stats.units_degraded += 1;
            }
            scan.candidates.extend(self.extractor.extract(&parsed));
        }
    }
}

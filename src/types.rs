use serde::{Deserialize, Serialize};

/// One indexable public name.
///
/// Equality covers all three fields, so overloads that differ only in their
/// parameter list are distinct candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportCandidate {
    /// Fully qualified path used to import the symbol
    #[serde(rename = "importName")]
    pub import_path: String,
    /// The bare identifier a user would type
    #[serde(rename = "shortName")]
    pub short_name: String,
    /// Same as `short_name` for types; `name(params)` for functions
    #[serde(rename = "fullName")]
    pub display_form: String,
}

impl ImportCandidate {
    pub fn new(
        import_path: impl Into<String>,
        short_name: impl Into<String>,
        display_form: impl Into<String>,
    ) -> Self {
        Self {
            import_path: import_path.into(),
            short_name: short_name.into(),
            display_form: display_form.into(),
        }
    }

    /// A type: displayed by its bare name
    pub fn for_type(qualified_name: &str, simple_name: &str) -> Self {
        Self::new(qualified_name, simple_name, simple_name)
    }

    /// A function declared in `package`, displayed with its parameter types
    pub fn for_function(package: &str, name: &str, parameter_types: &[String]) -> Self {
        let import_path = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package, name)
        };
        let display_form = format!("{}({})", name, parameter_types.join(", "));
        Self::new(import_path, name, display_form)
    }
}

/// Counters describing one indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Classpath entries (archives and directories) that were read
    pub entries_scanned: usize,
    /// Entries skipped by the exclusion list
    pub entries_excluded: usize,
    /// Archives that could not be opened
    pub archives_unreadable: usize,
    /// Entries inside an archive or directory that could not be read
    pub entry_errors: usize,
    pub units_parsed: usize,
    pub units_malformed: usize,
    /// Units whose Kotlin metadata was decoded
    pub units_rich: usize,
    /// Units whose Kotlin metadata was present but unusable
    pub units_degraded: usize,
    pub candidates_emitted: usize,
    /// Candidates already present in the index when merged
    pub duplicates_dropped: usize,
}

impl ScanStats {
    /// Add another set of counters into this one
    pub fn absorb(&mut self, other: &ScanStats) {
        self.entries_scanned += other.entries_scanned;
        self.entries_excluded += other.entries_excluded;
        self.archives_unreadable += other.archives_unreadable;
        self.entry_errors += other.entry_errors;
        self.units_parsed += other.units_parsed;
        self.units_malformed += other.units_malformed;
        self.units_rich += other.units_rich;
        self.units_degraded += other.units_degraded;
        self.candidates_emitted += other.candidates_emitted;
        self.duplicates_dropped += other.duplicates_dropped;
    }
}

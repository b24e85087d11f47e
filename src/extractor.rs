//! Symbol extraction: the public surface of one binary unit as import candidates.

use indexmap::IndexSet;

use crate::classfile::{AccessFlags, BinaryUnit, KotlinKind, MemberDecl, UnitMetadata};
use crate::types::ImportCandidate;

/// Marker the compilers use in generated names (`foo$default`, `lambda$run$0`)
const SYNTHETIC_NAME_SEPARATOR: char = '$';

/// Turns parsed units into import candidates.
pub struct SymbolExtractor {
    // Stateless: everything needed travels with the unit
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self {}
    }

    /// Candidates of one unit: public nested types first, then the unit
    /// itself, then its functions. The result holds no duplicates.
    pub fn extract(&self, unit: &BinaryUnit) -> Vec<ImportCandidate> {
        let mut candidates = IndexSet::new();

        for nested in unit.nested_types.iter().filter(|nested| nested.is_public) {
            candidates.insert(ImportCandidate::for_type(
                &nested.qualified_name,
                &nested.simple_name,
            ));
        }

        if self.emits_self(unit) {
            candidates.insert(ImportCandidate::for_type(
                &unit.canonical_name,
                &unit.simple_name,
            ));
        }

        for member in unit.members.iter().filter(|member| !member.is_initializer()) {
            let Some(name) = self.indexable_name(unit, member) else {
                continue;
            };
            let short_name = truncate_synthetic_name(name);
            if short_name.is_empty() {
                continue;
            }
            candidates.insert(ImportCandidate::for_function(
                &unit.package,
                short_name,
                &member.parameter_types,
            ));
        }

        candidates.into_iter().collect()
    }

    /// Only top-level public classes are indexed for themselves; nested
    /// classes are emitted by their outer class.
    fn emits_self(&self, unit: &BinaryUnit) -> bool {
        if !unit.is_top_level {
            return false;
        }
        match &unit.metadata {
            UnitMetadata::Rich(view) => match view.kind {
                KotlinKind::Class { visibility, .. } => visibility.is_public(),
                KotlinKind::FileFacade | KotlinKind::MultiFileClassPart => false,
            },
            UnitMetadata::RawOnly(_) => {
                unit.access.is_public()
                    && !unit.access.is_synthetic()
                    && !unit.access.contains(AccessFlags::MODULE)
                    && !unit.is_package_info()
            }
        }
    }

    /// The name to index `member` under, or `None` if it is not indexable.
    ///
    /// A public Kotlin function is indexed by its Kotlin name. Anything else
    /// falls back to the JVM view, where only public static methods count.
    fn indexable_name<'u>(&self, unit: &'u BinaryUnit, member: &'u MemberDecl) -> Option<&'u str> {
        if let UnitMetadata::Rich(view) = &unit.metadata
            && let Some(function) = view.function_for(&member.name, &member.descriptor)
            && let Some(name) = function.name.as_deref()
            && function.visibility.is_public()
        {
            return Some(name);
        }
        (member.is_public() && member.is_static()).then_some(member.name.as_str())
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `foo$1$lambda` -> `foo`
pub fn truncate_synthetic_name(name: &str) -> &str {
    name.split(SYNTHETIC_NAME_SEPARATOR).next().unwrap_or(name)
}

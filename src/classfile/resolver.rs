//! Lookup of sibling classes while parsing a unit.
//!
//! Kotlin metadata names nested classes without their visibility; deciding
//! whether `Outer$Inner` is public means loading `Outer$Inner` itself from
//! the same classpath entry. The answer is cached per binary name.

use std::collections::HashMap;
use std::sync::RwLock;

/// A place class bytes can be loaded from by binary name (`pkg.Outer$Inner`)
pub trait ClassSource: Send + Sync {
    fn read_class(&self, binary_name: &str) -> Option<Vec<u8>>;
}

/// Source with no classes, for units parsed in isolation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClasses;

impl ClassSource for NoClasses {
    fn read_class(&self, _binary_name: &str) -> Option<Vec<u8>> {
        None
    }
}

impl ClassSource for HashMap<String, Vec<u8>> {
    fn read_class(&self, binary_name: &str) -> Option<Vec<u8>> {
        self.get(binary_name).cloned()
    }
}

/// Classloading context handed to [`super::BinaryUnit::parse`]
pub struct TypeResolver {
    source: Box<dyn ClassSource>,
    visibility: RwLock<HashMap<String, Option<bool>>>,
}

impl TypeResolver {
    pub fn new(source: impl ClassSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            visibility: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver that never finds anything
    pub fn detached() -> Self {
        Self::new(NoClasses)
    }

    /// Whether the class `binary_name` declares itself public.
    ///
    /// `None` when it cannot be loaded or parsed.
    pub fn is_public(&self, binary_name: &str) -> Option<bool> {
        if let Ok(cache) = self.visibility.read()
            && let Some(&known) = cache.get(binary_name)
        {
            return known;
        }

        let resolved = self
            .source
            .read_class(binary_name)
            .and_then(|bytes| super::declares_public(&bytes));

        if let Ok(mut cache) = self.visibility.write() {
            cache.insert(binary_name.to_string(), resolved);
        }
        resolved
    }

    /// Number of distinct classes looked up so far
    pub fn cached_lookups(&self) -> usize {
        self.visibility.read().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::detached()
    }
}

impl std::fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeResolver")
            .field("cached_lookups", &self.cached_lookups())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ACC_PUBLIC, ACC_STATIC, ClassBuilder};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: HashMap<String, Vec<u8>>,
        reads: Arc<AtomicUsize>,
    }

    impl ClassSource for CountingSource {
        fn read_class(&self, binary_name: &str) -> Option<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_class(binary_name)
        }
    }

    #[test]
    fn test_detached_finds_nothing() {
        let resolver = TypeResolver::detached();
        assert_eq!(resolver.is_public("pkg.Missing"), None);
    }

    #[test]
    fn test_lookup_is_cached() {
        let inner_bytes = ClassBuilder::new("pkg/Outer$Inner")
            .inner_class("pkg/Outer$Inner", Some("pkg/Outer"), Some("Inner"), ACC_PUBLIC | ACC_STATIC)
            .build();
        let reads = Arc::new(AtomicUsize::new(0));
        let resolver = TypeResolver::new(CountingSource {
            inner: HashMap::from([("pkg.Outer$Inner".to_string(), inner_bytes)]),
            reads: reads.clone(),
        });

        assert_eq!(resolver.is_public("pkg.Outer$Inner"), Some(true));
        assert_eq!(resolver.is_public("pkg.Outer$Inner"), Some(true));
        assert_eq!(resolver.is_public("pkg.Outer$Gone"), None);
        assert_eq!(resolver.is_public("pkg.Outer$Gone"), None);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_lookups(), 2);
    }

    #[test]
    fn test_unparseable_class_is_unknown() {
        let resolver = TypeResolver::new(HashMap::from([(
            "pkg.Broken".to_string(),
            vec![0xCA, 0xFE],
        )]));
        assert_eq!(resolver.is_public("pkg.Broken"), None);
    }
}

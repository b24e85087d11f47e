//! Binary unit model: one JVM class file parsed into what symbol extraction needs
//!
//! Parsing happens in two layers. The raw layer reads the class file format
//! (constant pool, access flags, `InnerClasses`, `Signature`, annotations)
//! and fails only on bytes that are not a class file. The rich layer decodes
//! Kotlin metadata on top of it; any failure there degrades the unit to its
//! raw view instead of failing it.

mod annotation;
mod constant_pool;
mod descriptor;
pub mod kotlin;
mod raw;
mod reader;
mod resolver;

pub use annotation::{AnnotationElements, ElementValue, KOTLIN_METADATA_DESCRIPTOR};
pub use descriptor::{internal_to_binary, method_parameter_types, signature_parameter_types};
pub use kotlin::{ClassKind, KotlinFunction, KotlinHeader, KotlinKind, KotlinView, Visibility};
pub use raw::{AccessFlags, InnerClassEntry, MAX_MAJOR_VERSION, MIN_MAJOR_VERSION, RawClass, RawMethod};
pub use resolver::{ClassSource, NoClasses, TypeResolver};

use crate::error::{MetadataError, UnitError};
use raw::MetadataAnnotation;

/// Why a unit only has its raw view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReason {
    /// No `kotlin.Metadata` annotation; a plain JVM class
    Absent,
    /// Metadata was present but unusable
    Degraded(MetadataError),
}

/// Outcome of the rich-metadata attempt for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitMetadata {
    Rich(KotlinView),
    RawOnly(RawReason),
}

impl UnitMetadata {
    fn from_annotation(annotation: &MetadataAnnotation) -> Self {
        match annotation {
            MetadataAnnotation::Absent => UnitMetadata::RawOnly(RawReason::Absent),
            MetadataAnnotation::Unreadable(err) => UnitMetadata::RawOnly(RawReason::Degraded(err.clone())),
            MetadataAnnotation::Present(elements) => {
                match KotlinHeader::from_elements(elements).and_then(|header| KotlinView::decode(&header)) {
                    Ok(view) => UnitMetadata::Rich(view),
                    Err(err) => UnitMetadata::RawOnly(RawReason::Degraded(err)),
                }
            }
        }
    }
}

/// A member type declared by a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedTypeRef {
    /// Canonical dotted name, e.g. `pkg.Outer.Inner`
    pub qualified_name: String,
    /// Binary name, e.g. `pkg.Outer$Inner`
    pub binary_name: String,
    pub simple_name: String,
    pub is_public: bool,
}

/// A declared method as the JVM sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    pub descriptor: String,
    /// Rendered parameter types, generic where a signature was available
    pub parameter_types: Vec<String>,
    pub access: AccessFlags,
}

impl MemberDecl {
    fn from_raw(method: &RawMethod) -> Result<Self, UnitError> {
        // The descriptor must always parse; a bad signature only loses generics
        let erased = method_parameter_types(&method.descriptor)?;
        let parameter_types = method
            .signature
            .as_deref()
            .and_then(|signature| signature_parameter_types(signature).ok())
            .unwrap_or(erased);
        Ok(Self {
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            parameter_types,
            access: method.access,
        })
    }

    pub fn is_public(&self) -> bool {
        self.access.is_public()
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    pub fn is_synthetic(&self) -> bool {
        self.access.is_synthetic()
    }

    /// Constructors and static initializers
    pub fn is_initializer(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }
}

/// One parsed class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryUnit {
    /// Binary name with `/` normalized to `.`, e.g. `pkg.Outer$Inner`
    pub qualified_name: String,
    /// Dotted source-level name, e.g. `pkg.Outer.Inner`
    pub canonical_name: String,
    pub simple_name: String,
    /// Empty for the default package
    pub package: String,
    pub access: AccessFlags,
    /// `false` when the class has an `InnerClasses` entry for itself
    pub is_top_level: bool,
    pub nested_types: Vec<NestedTypeRef>,
    pub members: Vec<MemberDecl>,
    pub metadata: UnitMetadata,
}

impl BinaryUnit {
    /// Parse a class file, using `resolver` to inspect sibling classes.
    pub fn parse(bytes: &[u8], resolver: &TypeResolver) -> Result<Self, UnitError> {
        let raw = RawClass::parse(bytes)?;
        let members = raw
            .methods
            .iter()
            .map(MemberDecl::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        let metadata = UnitMetadata::from_annotation(&raw.metadata);
        let canonical_name = raw.canonical_name_of(&raw.binary_name);

        let nested_types = match &metadata {
            UnitMetadata::Rich(view) => rich_nested_types(&raw, &canonical_name, view, resolver),
            UnitMetadata::RawOnly(_) => raw_nested_types(&raw),
        };

        Ok(Self {
            simple_name: raw.simple_name().to_string(),
            package: raw.package().to_string(),
            access: raw.access,
            is_top_level: raw.is_top_level(),
            qualified_name: raw.binary_name,
            canonical_name,
            nested_types,
            members,
            metadata,
        })
    }

    /// Whether Kotlin metadata was decoded for this unit
    pub fn has_rich_metadata(&self) -> bool {
        matches!(self.metadata, UnitMetadata::Rich(_))
    }

    /// The metadata failure, when the unit fell back to its raw view
    pub fn degradation(&self) -> Option<&MetadataError> {
        match &self.metadata {
            UnitMetadata::RawOnly(RawReason::Degraded(err)) => Some(err),
            _ => None,
        }
    }

    /// `package-info` carries package annotations, not a type
    pub fn is_package_info(&self) -> bool {
        self.simple_name == "package-info"
    }
}

fn raw_nested_types(raw: &RawClass) -> Vec<NestedTypeRef> {
    raw.declared_nested()
        .filter_map(|entry| {
            let simple_name = entry.simple_name.clone()?;
            Some(NestedTypeRef {
                qualified_name: raw.canonical_name_of(&entry.inner),
                binary_name: entry.inner.clone(),
                simple_name,
                is_public: entry.access.is_public(),
            })
        })
        .collect()
}

fn rich_nested_types(
    raw: &RawClass,
    canonical_name: &str,
    view: &KotlinView,
    resolver: &TypeResolver,
) -> Vec<NestedTypeRef> {
    view.nested_class_names
        .iter()
        .map(|simple_name| {
            let binary_name = format!("{}${}", raw.binary_name, simple_name);
            let is_public = resolver.is_public(&binary_name).unwrap_or_else(|| {
                raw.inner_classes
                    .iter()
                    .find(|entry| entry.inner == binary_name)
                    .is_some_and(|entry| entry.access.is_public())
            });
            NestedTypeRef {
                qualified_name: format!("{}.{}", canonical_name, simple_name),
                binary_name,
                simple_name: simple_name.clone(),
                is_public,
            }
        })
        .collect()
}

/// Whether a class declares itself public, judged by its Kotlin class flags
/// when they decode, otherwise by its own `InnerClasses` row or class flags.
pub(crate) fn declares_public(bytes: &[u8]) -> Option<bool> {
    let raw = RawClass::parse(bytes).ok()?;
    if let UnitMetadata::Rich(view) = UnitMetadata::from_annotation(&raw.metadata)
        && let Some(visibility) = view.class_visibility()
    {
        return Some(visibility.is_public());
    }
    let access = raw.self_entry().map(|entry| entry.access).unwrap_or(raw.access);
    Some(access.is_public())
}

//! Kotlin metadata: the `kotlin.Metadata` annotation decoded into a view of
//! declarations as the Kotlin compiler saw them.
//!
//! Only what import suggestion needs is decoded: the class name, its flags,
//! nested class names and functions with their JVM signatures. Everything
//! else in the protobuf payload is skipped by the decoder.

mod encoding;
mod messages;
mod names;

use super::annotation::{AnnotationElements, ElementValue};
use crate::error::MetadataError;
use messages::{Class, Function, Package, StringTableTypes};
use names::NameResolver;
use prost::Message;

/// Highest metadata major version this decoder understands
pub const MAX_METADATA_MAJOR: i32 = 2;

/// Default of the `flags` fields in `Class` and `Function`: public, final, class
const DEFAULT_FLAGS: i32 = 6;

/// The raw elements of a `kotlin.Metadata` annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KotlinHeader {
    pub kind: i32,
    pub metadata_version: Vec<i32>,
    pub data1: Vec<String>,
    pub data2: Vec<String>,
}

impl KotlinHeader {
    pub fn from_elements(elements: &AnnotationElements) -> Result<Self, MetadataError> {
        let mut kind = 1;
        let mut metadata_version = None;
        let mut data1 = Vec::new();
        let mut data2 = Vec::new();

        for (name, value) in elements {
            match name.as_str() {
                "k" => {
                    kind = value
                        .as_int()
                        .ok_or_else(|| MetadataError::MalformedElement("k".to_string()))?
                }
                "mv" => metadata_version = Some(int_array(name, value)?),
                "d1" => data1 = string_array(name, value)?,
                "d2" => data2 = string_array(name, value)?,
                _ => {}
            }
        }

        Ok(Self {
            kind,
            metadata_version: metadata_version.ok_or(MetadataError::MissingElement("mv"))?,
            data1,
            data2,
        })
    }
}

fn int_array(name: &str, value: &ElementValue) -> Result<Vec<i32>, MetadataError> {
    value
        .as_array()
        .and_then(|values| values.iter().map(ElementValue::as_int).collect())
        .ok_or_else(|| MetadataError::MalformedElement(name.to_string()))
}

fn string_array(name: &str, value: &ElementValue) -> Result<Vec<String>, MetadataError> {
    value
        .as_array()
        .and_then(|values| {
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .ok_or_else(|| MetadataError::MalformedElement(name.to_string()))
}

/// Declaration visibility as recorded in Kotlin flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Internal,
    Private,
    Protected,
    Public,
    PrivateToThis,
    Local,
    Unknown(i32),
}

impl Visibility {
    fn from_flags(flags: i32) -> Self {
        match (flags >> 1) & 0x7 {
            0 => Visibility::Internal,
            1 => Visibility::Private,
            2 => Visibility::Protected,
            3 => Visibility::Public,
            4 => Visibility::PrivateToThis,
            5 => Visibility::Local,
            other => Visibility::Unknown(other),
        }
    }

    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    EnumClass,
    EnumEntry,
    AnnotationClass,
    Object,
    CompanionObject,
    Unknown(i32),
}

impl ClassKind {
    fn from_flags(flags: i32) -> Self {
        match (flags >> 6) & 0x7 {
            0 => ClassKind::Class,
            1 => ClassKind::Interface,
            2 => ClassKind::EnumClass,
            3 => ClassKind::EnumEntry,
            4 => ClassKind::AnnotationClass,
            5 => ClassKind::Object,
            6 => ClassKind::CompanionObject,
            other => ClassKind::Unknown(other),
        }
    }
}

/// What a metadata-carrying class file represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KotlinKind {
    /// A class, interface, object or other class-like declaration
    Class {
        visibility: Visibility,
        class_kind: ClassKind,
    },
    /// Top-level declarations of one source file (`FooKt`)
    FileFacade,
    /// One part of a `@JvmMultifileClass` facade
    MultiFileClassPart,
}

/// A function declaration from the metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KotlinFunction {
    /// `None` when the name lives in the predefined string table
    pub name: Option<String>,
    pub visibility: Visibility,
    /// JVM method name when it differs from `name` (e.g. `@JvmName`)
    pub jvm_name: Option<String>,
    pub jvm_descriptor: Option<String>,
}

impl KotlinFunction {
    /// The JVM method name this function compiles to, if known
    pub fn method_name(&self) -> Option<&str> {
        self.jvm_name.as_deref().or(self.name.as_deref())
    }
}

/// Decoded Kotlin metadata of one class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KotlinView {
    pub kind: KotlinKind,
    pub metadata_version: Vec<i32>,
    /// Class id such as `pkg/Outer.Inner`, for class kinds only
    pub class_name: Option<String>,
    pub nested_class_names: Vec<String>,
    pub functions: Vec<KotlinFunction>,
}

impl KotlinView {
    pub fn decode(header: &KotlinHeader) -> Result<Self, MetadataError> {
        let major = header.metadata_version.first().copied().unwrap_or(0);
        if !(1..=MAX_METADATA_MAJOR).contains(&major) {
            return Err(MetadataError::UnsupportedVersion(
                header
                    .metadata_version
                    .iter()
                    .map(|part| part.to_string())
                    .collect::<Vec<_>>()
                    .join("."),
            ));
        }
        // Kinds 3 (synthetic class) and 4 (multi-file facade) declare nothing usable
        if !matches!(header.kind, 1 | 2 | 5) {
            return Err(MetadataError::UnsupportedKind(header.kind));
        }
        if header.data1.is_empty() {
            return Err(MetadataError::MissingElement("d1"));
        }

        let bytes = encoding::decode_bytes(&header.data1)?;
        let mut payload = bytes.as_slice();
        let table = StringTableTypes::decode_length_delimited(&mut payload)?;
        let resolver = NameResolver::new(table, &header.data2)?;

        let mut view = KotlinView {
            kind: KotlinKind::FileFacade,
            metadata_version: header.metadata_version.clone(),
            class_name: None,
            nested_class_names: Vec::new(),
            functions: Vec::new(),
        };
        match header.kind {
            1 => view.read_class(Class::decode(payload)?, &resolver)?,
            2 => view.read_package(Package::decode(payload)?, &resolver)?,
            _ => {
                view.kind = KotlinKind::MultiFileClassPart;
                view.read_package(Package::decode(payload)?, &resolver)?;
            }
        }
        Ok(view)
    }

    fn read_class(&mut self, class: Class, resolver: &NameResolver<'_>) -> Result<(), MetadataError> {
        let fq_name = class.fq_name.ok_or(MetadataError::MissingElement("fq_name"))?;
        self.class_name = resolver.lookup(fq_name)?;
        for id in class.nested_class_name {
            if let Some(name) = resolver.lookup(id)? {
                self.nested_class_names.push(name);
            }
        }
        for function in &class.function {
            self.functions.push(read_function(function, resolver)?);
        }
        let flags = class.flags.unwrap_or(DEFAULT_FLAGS);
        self.kind = KotlinKind::Class {
            visibility: Visibility::from_flags(flags),
            class_kind: ClassKind::from_flags(flags),
        };
        Ok(())
    }

    fn read_package(&mut self, package: Package, resolver: &NameResolver<'_>) -> Result<(), MetadataError> {
        for function in &package.function {
            self.functions.push(read_function(function, resolver)?);
        }
        Ok(())
    }

    /// Visibility of the class itself, `None` for facades
    pub fn class_visibility(&self) -> Option<Visibility> {
        match self.kind {
            KotlinKind::Class { visibility, .. } => Some(visibility),
            _ => None,
        }
    }

    /// The function that compiles to the JVM method `name` + `descriptor`.
    ///
    /// An exact signature match wins; functions without a recorded
    /// descriptor fall back to matching by name.
    pub fn function_for(&self, name: &str, descriptor: &str) -> Option<&KotlinFunction> {
        self.functions
            .iter()
            .find(|f| f.method_name() == Some(name) && f.jvm_descriptor.as_deref() == Some(descriptor))
            .or_else(|| {
                self.functions
                    .iter()
                    .find(|f| f.jvm_descriptor.is_none() && f.method_name() == Some(name))
            })
    }
}

/// Pre-1.1 compilers stored function flags in a different bit layout
fn load_old_flags(old_flags: i32) -> i32 {
    (old_flags & 0x3f) + ((old_flags >> 8) << 6)
}

fn read_function(function: &Function, resolver: &NameResolver<'_>) -> Result<KotlinFunction, MetadataError> {
    let flags = function
        .flags
        .unwrap_or_else(|| load_old_flags(function.old_flags.unwrap_or(DEFAULT_FLAGS)));
    let name = function
        .name
        .ok_or(MetadataError::MissingElement("function name"))?;
    let signature = function.method_signature.as_ref();
    let resolve = |id: Option<i32>| id.map(|id| resolver.lookup(id)).transpose().map(Option::flatten);
    Ok(KotlinFunction {
        name: resolver.lookup(name)?,
        visibility: Visibility::from_flags(flags),
        jvm_name: resolve(signature.and_then(|s| s.name))?,
        jvm_descriptor: resolve(signature.and_then(|s| s.desc))?,
    })
}

//! Raw class file structure: the view that needs nothing beyond the JVM format

use super::annotation::{AnnotationElements, KOTLIN_METADATA_DESCRIPTOR, find_annotation};
use super::constant_pool::ConstantPool;
use super::descriptor::internal_to_binary;
use super::reader::ClassReader;
use crate::error::{MetadataError, UnitError};

const MAGIC: u32 = 0xCAFEBABE;
/// JDK 1.0.2
pub const MIN_MAJOR_VERSION: u16 = 45;
/// JDK 26
pub const MAX_MAJOR_VERSION: u16 = 70;

/// JVM access flags of a class, nested class or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const BRIDGE: u16 = 0x0040;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MODULE: u16 = 0x8000;

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }
}

/// One row of the `InnerClasses` attribute, names in binary (dotted) form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner: String,
    /// `None` for local and anonymous classes
    pub outer: Option<String>,
    /// `None` for anonymous classes
    pub simple_name: Option<String>,
    pub access: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMethod {
    pub name: String,
    pub descriptor: String,
    /// Generic signature from the `Signature` attribute
    pub signature: Option<String>,
    pub access: AccessFlags,
}

/// What was found where Kotlin metadata would live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataAnnotation {
    Absent,
    Present(AnnotationElements),
    /// The annotations attribute itself could not be read
    Unreadable(MetadataError),
}

#[derive(Debug, Clone)]
pub struct RawClass {
    pub major_version: u16,
    pub minor_version: u16,
    pub access: AccessFlags,
    /// Binary name, e.g. `pkg.Outer$Inner`
    pub binary_name: String,
    pub inner_classes: Vec<InnerClassEntry>,
    pub methods: Vec<RawMethod>,
    pub metadata: MetadataAnnotation,
}

impl RawClass {
    /// Parse the structural metadata of one class file.
    pub fn parse(bytes: &[u8]) -> Result<Self, UnitError> {
        let mut reader = ClassReader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(UnitError::InvalidMagic(magic));
        }
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(UnitError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let pool = ConstantPool::parse(&mut reader)?;
        let access = AccessFlags(reader.read_u2()?);
        let binary_name = internal_to_binary(pool.class_name(reader.read_u2()?)?);
        let _super_class = reader.read_u2()?;

        let interfaces = reader.read_u2()?;
        reader.skip(interfaces as usize * 2)?;

        let fields = reader.read_u2()?;
        for _ in 0..fields {
            reader.skip(6)?; // access, name, descriptor
            let attributes = reader.read_u2()?;
            for _ in 0..attributes {
                reader.read_attribute()?;
            }
        }

        let method_count = reader.read_u2()?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            methods.push(read_method(&mut reader, &pool)?);
        }

        let mut inner_classes = Vec::new();
        let mut metadata = MetadataAnnotation::Absent;
        let attributes = reader.read_u2()?;
        for _ in 0..attributes {
            let (name_index, body) = reader.read_attribute()?;
            match pool.utf8(name_index)? {
                "InnerClasses" => inner_classes = read_inner_classes(body, &pool)?,
                "RuntimeVisibleAnnotations" => {
                    metadata = match find_annotation(body, &pool, KOTLIN_METADATA_DESCRIPTOR) {
                        Ok(Some(elements)) => MetadataAnnotation::Present(elements),
                        Ok(None) => MetadataAnnotation::Absent,
                        Err(err) => MetadataAnnotation::Unreadable(
                            MetadataError::MalformedElement(err.to_string()),
                        ),
                    };
                }
                _ => {}
            }
        }

        if reader.remaining() > 0 {
            return Err(UnitError::TrailingBytes {
                trailing: reader.remaining(),
            });
        }

        Ok(Self {
            major_version,
            minor_version,
            access,
            binary_name,
            inner_classes,
            methods,
            metadata,
        })
    }

    /// Package of the class, empty for the default package
    pub fn package(&self) -> &str {
        self.binary_name
            .rsplit_once('.')
            .map(|(package, _)| package)
            .unwrap_or("")
    }

    /// The `InnerClasses` row describing this class itself, if it is nested
    pub fn self_entry(&self) -> Option<&InnerClassEntry> {
        self.inner_classes
            .iter()
            .find(|entry| entry.inner == self.binary_name)
    }

    pub fn is_top_level(&self) -> bool {
        self.self_entry().is_none()
    }

    /// Source-level name with nesting expressed by dots: `pkg.Outer.Inner`.
    ///
    /// Falls back to the binary name for classes that are local, anonymous,
    /// or whose chain of outer classes is not recorded.
    pub fn canonical_name_of(&self, binary_name: &str) -> String {
        let mut segments = Vec::new();
        let mut current = binary_name;
        // Bounded walk: obfuscated input may contain cycles
        for _ in 0..=self.inner_classes.len() {
            let Some(entry) = self.inner_classes.iter().find(|e| e.inner == current) else {
                break;
            };
            match (&entry.outer, &entry.simple_name) {
                (Some(outer), Some(simple)) => {
                    segments.push(simple.as_str());
                    current = outer;
                }
                _ => return binary_name.to_string(),
            }
        }
        let mut name = current.to_string();
        for segment in segments.iter().rev() {
            name.push('.');
            name.push_str(segment);
        }
        name
    }

    /// Simple name of this class: the inner name when nested, otherwise the
    /// binary name without its package.
    pub fn simple_name(&self) -> &str {
        if let Some(simple) = self.self_entry().and_then(|e| e.simple_name.as_deref()) {
            return simple;
        }
        self.binary_name
            .rsplit_once('.')
            .map(|(_, simple)| simple)
            .unwrap_or(&self.binary_name)
    }

    /// Member types this class declares, per its `InnerClasses` attribute
    pub fn declared_nested(&self) -> impl Iterator<Item = &InnerClassEntry> {
        self.inner_classes.iter().filter(move |entry| {
            entry.outer.as_deref() == Some(self.binary_name.as_str()) && entry.simple_name.is_some()
        })
    }
}

fn read_method(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<RawMethod, UnitError> {
    let access = AccessFlags(reader.read_u2()?);
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let attributes = reader.read_u2()?;
    let mut signature = None;
    for _ in 0..attributes {
        let (name_index, body) = reader.read_attribute()?;
        if pool.utf8(name_index)? == "Signature" && body.len() == 2 {
            let index = u16::from_be_bytes([body[0], body[1]]);
            // A dangling signature only costs the generic rendering
            signature = pool.utf8(index).ok().map(str::to_string);
        }
    }
    Ok(RawMethod {
        name,
        descriptor,
        signature,
        access,
    })
}

fn read_inner_classes(body: &[u8], pool: &ConstantPool) -> Result<Vec<InnerClassEntry>, UnitError> {
    let mut reader = ClassReader::new(body);
    let count = reader.read_u2()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let inner = internal_to_binary(pool.class_name(reader.read_u2()?)?);
        let outer = pool.optional_class_name(reader.read_u2()?)?.map(internal_to_binary);
        let simple_name = pool.optional_utf8(reader.read_u2()?)?.map(str::to_string);
        let access = AccessFlags(reader.read_u2()?);
        entries.push(InnerClassEntry {
            inner,
            outer,
            simple_name,
            access,
        });
    }
    Ok(entries)
}

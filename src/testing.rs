//! Test support: synthesizes class files, Kotlin metadata and jars.
//!
//! Shared by unit tests (`crate::testing`) and the integration tests, which
//! include this file by path, so it only depends on `std`, `zip` and `prost`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_MODULE: u16 = 0x8000;

/// Kotlin declaration flags (visibility in bits 1-3, class kind in bits 6-8)
pub const KOTLIN_INTERNAL: i32 = 0;
pub const KOTLIN_PRIVATE: i32 = 1 << 1;
pub const KOTLIN_PROTECTED: i32 = 2 << 1;
pub const KOTLIN_PUBLIC: i32 = 3 << 1;
pub const KOTLIN_INTERFACE: i32 = 1 << 6;
pub const KOTLIN_OBJECT: i32 = 5 << 6;
pub const KOTLIN_COMPANION: i32 = 6 << 6;

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Java's modified UTF-8: NUL as two bytes, supplementary chars as surrogate pairs
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[derive(Default)]
struct PoolWriter {
    bytes: Vec<u8>,
    count: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    integers: HashMap<i32, u16>,
}

impl PoolWriter {
    fn new() -> Self {
        Self {
            count: 1,
            ..Self::default()
        }
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        let encoded = encode_modified_utf8(value);
        self.bytes.push(1);
        put_u2(&mut self.bytes, encoded.len() as u16);
        self.bytes.extend(encoded);
        let index = self.next();
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&index) = self.classes.get(internal_name) {
            return index;
        }
        let name = self.utf8(internal_name);
        self.bytes.push(7);
        put_u2(&mut self.bytes, name);
        let index = self.next();
        self.classes.insert(internal_name.to_string(), index);
        index
    }

    fn integer(&mut self, value: i32) -> u16 {
        if let Some(&index) = self.integers.get(&value) {
            return index;
        }
        self.bytes.push(3);
        put_u4(&mut self.bytes, value as u32);
        let index = self.next();
        self.integers.insert(value, index);
        index
    }

    /// A long constant, which occupies two pool slots
    fn long(&mut self, value: i64) -> u16 {
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        let index = self.next();
        self.count += 1;
        index
    }

    fn next(&mut self) -> u16 {
        let index = self.count;
        self.count += 1;
        index
    }
}

struct MethodSpec {
    access: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
}

struct InnerSpec {
    inner: String,
    outer: Option<String>,
    simple_name: Option<String>,
    access: u16,
}

/// Builds a structurally valid class file.
///
/// Names are internal (`pkg/Outer$Inner`). Method bodies are omitted; the
/// parser under test never needs `Code` attributes.
pub struct ClassBuilder {
    name: String,
    access: u16,
    major_version: u16,
    fields: Vec<(u16, String, String)>,
    methods: Vec<MethodSpec>,
    inner_classes: Vec<InnerSpec>,
    kotlin: Option<KotlinMetadata>,
    long_constant: bool,
}

impl ClassBuilder {
    pub fn new(internal_name: &str) -> Self {
        Self {
            name: internal_name.to_string(),
            access: ACC_PUBLIC | ACC_SUPER,
            major_version: 52,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            kotlin: None,
            long_constant: false,
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn version(mut self, major: u16) -> Self {
        self.major_version = major;
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push((access, name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(self, access: u16, name: &str, descriptor: &str) -> Self {
        self.push_method(access, name, descriptor, None)
    }

    pub fn generic_method(self, access: u16, name: &str, descriptor: &str, signature: &str) -> Self {
        self.push_method(access, name, descriptor, Some(signature))
    }

    fn push_method(mut self, access: u16, name: &str, descriptor: &str, signature: Option<&str>) -> Self {
        self.methods.push(MethodSpec {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: signature.map(str::to_string),
        });
        self
    }

    pub fn inner_class(mut self, inner: &str, outer: Option<&str>, simple_name: Option<&str>, access: u16) -> Self {
        self.inner_classes.push(InnerSpec {
            inner: inner.to_string(),
            outer: outer.map(str::to_string),
            simple_name: simple_name.map(str::to_string),
            access,
        });
        self
    }

    pub fn kotlin_metadata(mut self, metadata: KotlinMetadata) -> Self {
        self.kotlin = Some(metadata);
        self
    }

    /// Add a two-slot `long` constant to the pool
    pub fn with_long_constant(mut self) -> Self {
        self.long_constant = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = PoolWriter::new();
        if self.long_constant {
            pool.long(0x0123_4567_89AB_CDEF);
        }
        let mut body = Vec::new();

        put_u2(&mut body, self.access);
        let this_class = pool.class(&self.name);
        put_u2(&mut body, this_class);
        let super_class = pool.class("java/lang/Object");
        put_u2(&mut body, super_class);
        put_u2(&mut body, 0); // interfaces

        put_u2(&mut body, self.fields.len() as u16);
        for (access, name, descriptor) in &self.fields {
            put_u2(&mut body, *access);
            put_u2(&mut body, pool.utf8(name));
            put_u2(&mut body, pool.utf8(descriptor));
            put_u2(&mut body, 1);
            put_u2(&mut body, pool.utf8("Deprecated"));
            put_u4(&mut body, 0);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access);
            put_u2(&mut body, pool.utf8(&method.name));
            put_u2(&mut body, pool.utf8(&method.descriptor));
            match &method.signature {
                Some(signature) => {
                    put_u2(&mut body, 1);
                    put_u2(&mut body, pool.utf8("Signature"));
                    put_u4(&mut body, 2);
                    put_u2(&mut body, pool.utf8(signature));
                }
                None => put_u2(&mut body, 0),
            }
        }

        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        if !self.inner_classes.is_empty() {
            let mut attribute = Vec::new();
            put_u2(&mut attribute, self.inner_classes.len() as u16);
            for entry in &self.inner_classes {
                put_u2(&mut attribute, pool.class(&entry.inner));
                let outer = entry.outer.as_deref().map(|o| pool.class(o)).unwrap_or(0);
                put_u2(&mut attribute, outer);
                let simple = entry.simple_name.as_deref().map(|s| pool.utf8(s)).unwrap_or(0);
                put_u2(&mut attribute, simple);
                put_u2(&mut attribute, entry.access);
            }
            attributes.push((pool.utf8("InnerClasses"), attribute));
        }
        if let Some(kotlin) = &self.kotlin {
            let mut attribute = Vec::new();
            put_u2(&mut attribute, 1);
            put_u2(&mut attribute, pool.utf8("Lkotlin/Metadata;"));
            put_u2(&mut attribute, 4);

            put_u2(&mut attribute, pool.utf8("mv"));
            attribute.push(b'[');
            put_u2(&mut attribute, kotlin.metadata_version.len() as u16);
            for part in &kotlin.metadata_version {
                attribute.push(b'I');
                put_u2(&mut attribute, pool.integer(*part));
            }

            put_u2(&mut attribute, pool.utf8("k"));
            attribute.push(b'I');
            put_u2(&mut attribute, pool.integer(kotlin.kind));

            for (name, values) in [("d1", &kotlin.data1), ("d2", &kotlin.data2)] {
                put_u2(&mut attribute, pool.utf8(name));
                attribute.push(b'[');
                put_u2(&mut attribute, values.len() as u16);
                for value in values {
                    attribute.push(b's');
                    put_u2(&mut attribute, pool.utf8(value));
                }
            }
            attributes.push((pool.utf8("RuntimeVisibleAnnotations"), attribute));
        }

        put_u2(&mut body, attributes.len() as u16);
        for (name, attribute) in attributes {
            put_u2(&mut body, name);
            put_u4(&mut body, attribute.len() as u32);
            body.extend(attribute);
        }

        let mut out = Vec::new();
        put_u4(&mut out, 0xCAFEBABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, self.major_version);
        put_u2(&mut out, pool.count);
        out.extend(pool.bytes);
        out.extend(body);
        out
    }
}

/// Field-by-field protobuf writer over `prost`'s encoders, for messages
/// the tests shape by hand
#[derive(Default)]
pub struct ProtoWriter {
    bytes: Vec<u8>,
}

impl ProtoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int32(&mut self, field: u32, value: i32) -> &mut Self {
        prost::encoding::int32::encode(field, &value, &mut self.bytes);
        self
    }

    pub fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        prost::encoding::bytes::encode(field, &value.to_vec(), &mut self.bytes);
        self
    }

    pub fn packed_int32(&mut self, field: u32, values: &[i32]) -> &mut Self {
        prost::encoding::int32::encode_packed(field, values, &mut self.bytes);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// The four `kotlin.Metadata` elements the indexer reads
#[derive(Debug, Clone)]
pub struct KotlinMetadata {
    pub kind: i32,
    pub metadata_version: Vec<i32>,
    pub data1: Vec<String>,
    pub data2: Vec<String>,
}

struct FunctionSpec {
    name: i32,
    flags: i32,
    jvm_name: Option<i32>,
    jvm_descriptor: Option<i32>,
}

/// Builds `kotlin.Metadata` with an empty string table, so every name id
/// indexes `d2` directly. `d1` is written in UTF-8 mode.
pub struct KotlinMetadataBuilder {
    kind: i32,
    metadata_version: Vec<i32>,
    strings: Vec<String>,
    class_flags: i32,
    fq_name: Option<i32>,
    nested: Vec<i32>,
    functions: Vec<FunctionSpec>,
}

impl KotlinMetadataBuilder {
    fn with_kind(kind: i32) -> Self {
        Self {
            kind,
            metadata_version: vec![2, 1, 0],
            strings: Vec::new(),
            class_flags: KOTLIN_PUBLIC,
            fq_name: None,
            nested: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Class metadata; `class_id` like `pkg/Outer.Inner`
    pub fn class(class_id: &str, flags: i32) -> Self {
        let mut builder = Self::with_kind(1);
        builder.class_flags = flags;
        builder.fq_name = Some(builder.string_id(class_id));
        builder
    }

    pub fn file_facade() -> Self {
        Self::with_kind(2)
    }

    pub fn multi_file_part() -> Self {
        Self::with_kind(5)
    }

    pub fn kind(mut self, kind: i32) -> Self {
        self.kind = kind;
        self
    }

    pub fn version(mut self, metadata_version: &[i32]) -> Self {
        self.metadata_version = metadata_version.to_vec();
        self
    }

    pub fn nested(mut self, simple_name: &str) -> Self {
        let id = self.string_id(simple_name);
        self.nested.push(id);
        self
    }

    pub fn function(self, name: &str, flags: i32) -> Self {
        self.function_with_signature(name, flags, None, None)
    }

    pub fn function_with_signature(
        mut self,
        name: &str,
        flags: i32,
        jvm_name: Option<&str>,
        jvm_descriptor: Option<&str>,
    ) -> Self {
        let name = self.string_id(name);
        let jvm_name = jvm_name.map(|n| self.string_id(n));
        let jvm_descriptor = jvm_descriptor.map(|d| self.string_id(d));
        self.functions.push(FunctionSpec {
            name,
            flags,
            jvm_name,
            jvm_descriptor,
        });
        self
    }

    fn string_id(&mut self, value: &str) -> i32 {
        if let Some(position) = self.strings.iter().position(|s| s == value) {
            return position as i32;
        }
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as i32
    }

    fn function_message(function: &FunctionSpec) -> Vec<u8> {
        let mut message = ProtoWriter::new();
        message.int32(2, function.name).int32(9, function.flags);
        if function.jvm_name.is_some() || function.jvm_descriptor.is_some() {
            let mut signature = ProtoWriter::new();
            if let Some(id) = function.jvm_name {
                signature.int32(1, id);
            }
            if let Some(id) = function.jvm_descriptor {
                signature.int32(2, id);
            }
            message.bytes(100, &signature.finish());
        }
        message.finish()
    }

    pub fn build(&self) -> KotlinMetadata {
        let mut message = ProtoWriter::new();
        if self.kind == 1 {
            message.int32(1, self.class_flags);
            if let Some(fq_name) = self.fq_name {
                message.int32(3, fq_name);
            }
            if !self.nested.is_empty() {
                message.packed_int32(7, &self.nested);
            }
        }
        let function_field = if self.kind == 1 { 9 } else { 3 };
        for function in &self.functions {
            message.bytes(function_field, &Self::function_message(function));
        }

        // Empty StringTableTypes, length-delimited, then the message
        let mut payload = vec![0u8];
        payload.extend(message.finish());

        KotlinMetadata {
            kind: self.kind,
            metadata_version: self.metadata_version.clone(),
            data1: vec![utf8_mode_string(&payload)],
            data2: self.strings.clone(),
        }
    }
}

/// Encode bytes the way the Kotlin compiler's UTF-8 mode does
pub fn utf8_mode_string(bytes: &[u8]) -> String {
    std::iter::once('\u{0}')
        .chain(bytes.iter().map(|&b| b as char))
        .collect()
}

/// Write a jar with the given `(entry name, bytes)` pairs. Names ending in
/// `/` become directory entries.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// A public class with one public static method, the smallest useful jar entry
pub fn simple_class(internal_name: &str, method: &str, descriptor: &str) -> Vec<u8> {
    ClassBuilder::new(internal_name)
        .method(ACC_PUBLIC, "<init>", "()V")
        .method(ACC_PUBLIC | ACC_STATIC, method, descriptor)
        .build()
}

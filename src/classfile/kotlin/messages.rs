//! The parts of Kotlin's `metadata.proto` and `jvm_metadata.proto` the
//! indexer reads. Fields not declared here are skipped by `prost`.
//!
//! The schema is proto2, so scalars are `optional` and defaults are applied
//! by the callers.

/// `JvmProtoBuf.StringTableTypes`, written length-delimited ahead of the
/// class or package message in `d1`
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct StringTableTypes {
    #[prost(message, repeated, tag = "1")]
    pub record: Vec<Record>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Record {
    /// Number of consecutive string ids this record covers; defaults to 1
    #[prost(int32, optional, tag = "1")]
    pub range: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub predefined_index: Option<i32>,
    /// `NONE` = 0, `INTERNAL_TO_CLASS_ID` = 1, `DESC_TO_CLASS_ID` = 2
    #[prost(int32, optional, tag = "3")]
    pub operation: Option<i32>,
    #[prost(int32, repeated, tag = "4")]
    pub substring_index: Vec<i32>,
    #[prost(int32, repeated, tag = "5")]
    pub replace_char: Vec<i32>,
    #[prost(string, optional, tag = "6")]
    pub string: Option<String>,
}

/// `ProtoBuf.Class` (metadata kind 1)
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Class {
    #[prost(int32, optional, tag = "1")]
    pub flags: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub fq_name: Option<i32>,
    #[prost(int32, repeated, tag = "7")]
    pub nested_class_name: Vec<i32>,
    #[prost(message, repeated, tag = "9")]
    pub function: Vec<Function>,
}

/// `ProtoBuf.Package` (file facades and multi-file class parts)
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Package {
    #[prost(message, repeated, tag = "3")]
    pub function: Vec<Function>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Function {
    /// Layout used before Kotlin 1.1; read only when `flags` is absent
    #[prost(int32, optional, tag = "1")]
    pub old_flags: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub name: Option<i32>,
    #[prost(int32, optional, tag = "9")]
    pub flags: Option<i32>,
    /// The `JvmProtoBuf.methodSignature` extension
    #[prost(message, optional, tag = "100")]
    pub method_signature: Option<JvmMethodSignature>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct JvmMethodSignature {
    #[prost(int32, optional, tag = "1")]
    pub name: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub desc: Option<i32>,
}

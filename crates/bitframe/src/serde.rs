//! Serde-deserializable layout description.
//!
//! These types describe the *shape* of a record. They are intended to be loaded
//! from a data file (for example a JSON register map shipped with your
//! application) and then compiled into a [Layout].
//!
//! ```json
//! {
//!   "total_bytes": 4,
//!   "fields": [
//!     { "name": "id", "bit_offset": 0, "bit_width": 12 },
//!     { "name": "temp", "bit_offset": 12, "bit_width": 16, "signed": true, "byte_order": "LittleEndian" },
//!     { "name": "tag", "bit_offset": 28, "bit_width": 4, "kind": "Bool" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    assembly::{BitOrder, ByteOrder, ValueKind},
    errors::CompileError,
    field::{Field, FieldKind},
    layout::Layout,
};

/// What a field holds.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum FieldKindDef {
    #[default]
    Integer,
    Bool,
    Bytes,
    Text,
}

/// Byte order of a multi-byte field.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderDef {
    #[default]
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

/// Bit order of a field inside the buffer.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum BitOrderDef {
    #[default]
    /// Most significant bit first.
    MsbFirst,
    /// Least significant bit first.
    LsbFirst,
}

/// Caller-facing integer width.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ValueKindDef {
    Int8,
    Int16,
    Int32,
    Int64,
}

/// Top-level layout definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LayoutDef {
    /// Record size in bytes; the smallest size holding every field when absent.
    #[serde(default)]
    pub total_bytes: Option<usize>,
    /// All fields of the record.
    pub fields: Vec<FieldDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Field name; becomes the key in the unpacked map.
    pub name: String,
    /// Offset of the first bit, MSB-first from the start of the record.
    pub bit_offset: usize,
    /// Number of bits.
    pub bit_width: usize,
    #[serde(default)]
    pub kind: FieldKindDef,
    /// Whether the value is two's complement.
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub byte_order: ByteOrderDef,
    #[serde(default)]
    pub bit_order: BitOrderDef,
    #[serde(default)]
    pub value_kind: Option<ValueKindDef>,
}

impl From<FieldKindDef> for FieldKind {
    fn from(value: FieldKindDef) -> Self {
        match value {
            FieldKindDef::Integer => FieldKind::Integer,
            FieldKindDef::Bool => FieldKind::Bool,
            FieldKindDef::Bytes => FieldKind::Bytes,
            FieldKindDef::Text => FieldKind::Text,
        }
    }
}

impl From<ByteOrderDef> for ByteOrder {
    fn from(value: ByteOrderDef) -> Self {
        match value {
            ByteOrderDef::BigEndian => ByteOrder::BigEndian,
            ByteOrderDef::LittleEndian => ByteOrder::LittleEndian,
        }
    }
}

impl From<BitOrderDef> for BitOrder {
    fn from(value: BitOrderDef) -> Self {
        match value {
            BitOrderDef::MsbFirst => BitOrder::MsbFirst,
            BitOrderDef::LsbFirst => BitOrder::LsbFirst,
        }
    }
}

impl From<ValueKindDef> for ValueKind {
    fn from(value: ValueKindDef) -> Self {
        match value {
            ValueKindDef::Int8 => ValueKind::Int8,
            ValueKindDef::Int16 => ValueKind::Int16,
            ValueKindDef::Int32 => ValueKind::Int32,
            ValueKindDef::Int64 => ValueKind::Int64,
        }
    }
}

impl From<FieldDef> for Field {
    fn from(value: FieldDef) -> Self {
        Field {
            name: value.name,
            bit_offset: value.bit_offset,
            bit_width: value.bit_width,
            kind: value.kind.into(),
            signed: value.signed,
            byte_order: value.byte_order.into(),
            bit_order: value.bit_order.into(),
            value_kind: value.value_kind.map(Into::into),
        }
    }
}

impl TryFrom<LayoutDef> for Layout {
    type Error = CompileError;

    fn try_from(value: LayoutDef) -> Result<Self, Self::Error> {
        let fields: Vec<Field> = value.fields.into_iter().map(Into::into).collect();

        match value.total_bytes {
            Some(total_bytes) => Layout::build(&fields, total_bytes),
            None => Layout::compile(&fields),
        }
    }
}

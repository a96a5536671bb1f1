//! Definition of named fields used to build a [crate::layout::Layout].

use crate::assembly::{BitOrder, ByteOrder, ValueKind};

/// What a field's bits hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    /// Two's complement or unsigned integer of 1..=64 bits.
    #[default]
    Integer,
    /// Flag of 1..=64 bits: any non-zero content reads as 1, packing stores 0 or 1.
    Bool,
    /// Raw bytes. A partial last byte is stored left-aligned.
    Bytes,
    /// UTF-8 text stored like [FieldKind::Bytes].
    Text,
}

impl FieldKind {
    /// Whether the field's value is a byte string rather than a number.
    pub fn is_bytes(self) -> bool {
        matches!(self, FieldKind::Bytes | FieldKind::Text)
    }
}

/// A single named field: where its bits live and how they are interpreted.
///
/// `Field` is not validated; compile it into a [crate::descriptor::FieldDescriptor]
/// (or build a layout from it) to check it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    /// Name used in the unpacked result map.
    pub name: String,
    /// Position of the field's first bit, counted MSB-first from the start of the record.
    pub bit_offset: usize,
    /// Number of bits; 1..=64 for integer and bool fields.
    pub bit_width: usize,
    pub kind: FieldKind,
    /// If true, values are two's complement and sign-extended on unpack. Integers only.
    pub signed: bool,
    /// Byte significance order for fields wider than one byte. Integer and bool fields only.
    pub byte_order: ByteOrder,
    /// Order of the field's bits in the buffer.
    pub bit_order: BitOrder,
    /// Caller-facing integer width; the smallest fitting kind when `None`.
    pub value_kind: Option<ValueKind>,
}

impl Field {
    /// Unsigned, big-endian, MSB-first field.
    pub fn unsigned(name: impl Into<String>, bit_offset: usize, bit_width: usize) -> Self {
        Field {
            name: name.into(),
            bit_offset,
            bit_width,
            ..Default::default()
        }
    }

    /// Signed, big-endian, MSB-first field.
    pub fn signed(name: impl Into<String>, bit_offset: usize, bit_width: usize) -> Self {
        Field {
            signed: true,
            ..Field::unsigned(name, bit_offset, bit_width)
        }
    }

    pub fn boolean(name: impl Into<String>, bit_offset: usize, bit_width: usize) -> Self {
        Field::unsigned(name, bit_offset, bit_width).with_kind(FieldKind::Bool)
    }

    /// Raw byte field of `bit_width` bits.
    pub fn bytes(name: impl Into<String>, bit_offset: usize, bit_width: usize) -> Self {
        Field::unsigned(name, bit_offset, bit_width).with_kind(FieldKind::Bytes)
    }

    pub fn text(name: impl Into<String>, bit_offset: usize, bit_width: usize) -> Self {
        Field::unsigned(name, bit_offset, bit_width).with_kind(FieldKind::Text)
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = Some(value_kind);
        self
    }

    /// One past the last bit of the field.
    pub fn end_bits(&self) -> usize {
        self.bit_offset.saturating_add(self.bit_width)
    }
}

//! Validated field placement, compiled from a [Field].
//!
//! ```
//! use bitframe::{descriptor::FieldDescriptor, field::Field};
//!
//! let descriptor = FieldDescriptor::try_from(&Field::signed("delta", 3, 5)).unwrap();
//! assert_eq!((descriptor.min_value(), descriptor.max_value()), (-16, 15));
//! assert!(FieldDescriptor::try_from(&Field::unsigned("wide", 0, 65)).is_err());
//! ```

use crate::{
    assembly::{BitOrder, ByteOrder, ValueKind},
    bits::MAX_BITS,
    errors::CompileError,
    field::{Field, FieldKind},
};

/// Validated placement of one field.
///
/// Invariants: `bit_width >= 1`; integer and bool fields are at most 64 bits wide
/// and their `value_kind` holds `bit_width` bits. Byte and text fields are unsigned,
/// big-endian and have the `Int8` value kind. A descriptor describes shape only;
/// it holds no reference to any buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    bit_offset: usize,
    bit_width: usize,
    kind: FieldKind,
    signed: bool,
    byte_order: ByteOrder,
    bit_order: BitOrder,
    value_kind: ValueKind,
}

impl FieldDescriptor {
    /// Big-endian, MSB-first integer descriptor with the smallest fitting value kind.
    pub fn new(bit_offset: usize, bit_width: usize, signed: bool) -> Result<Self, CompileError> {
        Self::with_options(
            bit_offset,
            bit_width,
            signed,
            ByteOrder::default(),
            BitOrder::default(),
            None,
        )
    }

    /// Integer descriptor with every setting spelled out.
    pub fn with_options(
        bit_offset: usize,
        bit_width: usize,
        signed: bool,
        byte_order: ByteOrder,
        bit_order: BitOrder,
        value_kind: Option<ValueKind>,
    ) -> Result<Self, CompileError> {
        Self::compile(
            FieldKind::Integer,
            bit_offset,
            bit_width,
            signed,
            byte_order,
            bit_order,
            value_kind,
        )
    }

    /// Unsigned, big-endian descriptor of any kind.
    pub fn of_kind(
        kind: FieldKind,
        bit_offset: usize,
        bit_width: usize,
        bit_order: BitOrder,
    ) -> Result<Self, CompileError> {
        Self::compile(
            kind,
            bit_offset,
            bit_width,
            false,
            ByteOrder::default(),
            bit_order,
            None,
        )
    }

    fn compile(
        kind: FieldKind,
        bit_offset: usize,
        bit_width: usize,
        signed: bool,
        byte_order: ByteOrder,
        bit_order: BitOrder,
        value_kind: Option<ValueKind>,
    ) -> Result<Self, CompileError> {
        if bit_width == 0 || (!kind.is_bytes() && bit_width > MAX_BITS) {
            return Err(CompileError::InvalidFieldSize { bit_width });
        }

        let value_kind = if kind.is_bytes() {
            let reason = if signed {
                Some("byte fields cannot be signed")
            } else if byte_order != ByteOrder::BigEndian {
                Some("byte fields have no byte order")
            } else if value_kind.is_some_and(|k| k != ValueKind::Int8) {
                Some("byte fields hand out 8-bit elements")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(CompileError::InvalidFieldKind { kind, reason });
            }
            ValueKind::Int8
        } else {
            if kind == FieldKind::Bool && signed {
                return Err(CompileError::InvalidFieldKind {
                    kind,
                    reason: "bool fields cannot be signed",
                });
            }
            match value_kind {
                Some(k) if (k.bits() as usize) < bit_width => {
                    return Err(CompileError::ValueKindTooNarrow {
                        kind_bits: k.bits(),
                        bit_width,
                    });
                }
                Some(k) => k,
                None => ValueKind::fitting(bit_width)
                    .ok_or(CompileError::InvalidFieldSize { bit_width })?,
            }
        };

        Ok(FieldDescriptor {
            bit_offset,
            bit_width,
            kind,
            signed,
            byte_order,
            bit_order,
            value_kind,
        })
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn signed(&self) -> bool {
        self.signed
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Declared integer width of the field's values.
    ///
    /// The kind only bounds the field width at compile time. Unpacked integers are
    /// always [crate::assembly::Value::I64] or [crate::assembly::Value::U64]; narrow
    /// them with `TryFrom<Value>` (for example `i16::try_from(value)`).
    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    /// Number of bytes a byte or text value of this field occupies.
    pub fn byte_len(&self) -> usize {
        self.bit_width.div_ceil(8)
    }

    /// One past the last bit of the field.
    pub fn end_bits(&self) -> usize {
        self.bit_offset.saturating_add(self.bit_width)
    }

    /// Same descriptor moved to `bit_offset`.
    pub fn at_offset(&self, bit_offset: usize) -> Self {
        FieldDescriptor {
            bit_offset,
            ..*self
        }
    }

    /// Smallest value the field can represent. Zero for bool and byte fields.
    pub fn min_value(&self) -> i128 {
        if self.kind == FieldKind::Integer && self.signed {
            -(1i128 << (self.bit_width - 1))
        } else {
            0
        }
    }

    /// Largest value the field can represent: 1 for bool fields, 0 for byte fields.
    pub fn max_value(&self) -> i128 {
        match self.kind {
            FieldKind::Integer if self.signed => (1i128 << (self.bit_width - 1)) - 1,
            FieldKind::Integer => (1i128 << self.bit_width) - 1,
            FieldKind::Bool => 1,
            FieldKind::Bytes | FieldKind::Text => 0,
        }
    }

    /// Whether `value` lies in `min_value()..=max_value()`.
    pub fn contains(&self, value: i128) -> bool {
        (self.min_value()..=self.max_value()).contains(&value)
    }
}

impl TryFrom<&Field> for FieldDescriptor {
    type Error = CompileError;

    fn try_from(field: &Field) -> Result<Self, Self::Error> {
        FieldDescriptor::compile(
            field.kind,
            field.bit_offset,
            field.bit_width,
            field.signed,
            field.byte_order,
            field.bit_order,
            field.value_kind,
        )
    }
}

//! Reading and writing single field values through a [FieldDescriptor].
//!
//! Unpack reads the raw bits, undoes LSB-first bit order, reinterprets the byte
//! order and finally sign-extends. Pack runs the same steps in reverse after the
//! value has been checked against the field, so a failed pack never touches the
//! buffer. Bool fields store 0 or 1 and read any non-zero content as 1. Byte and
//! text fields hold their bytes MSB-first; LSB-first order reverses the whole bit
//! string.

use crate::{
    assembly::{BitOrder, Value},
    bits::{BitSpan, BitSpanMut, low_mask, reverse_bit_string, reverse_bits_n, sign_extend},
    descriptor::FieldDescriptor,
    errors::{ReadError, SpanError, WriteError},
    field::FieldKind,
};

/// A field's content as it is laid out in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Encoded {
    Bits(u64),
    Bytes(Vec<u8>),
}

/// Reads the field described by `field` from `span`.
pub fn unpack(span: BitSpan<'_>, field: &FieldDescriptor) -> Result<Value, ReadError> {
    unpack_at(span, field, 0)
}

/// Reads `field` with its offset shifted by `base_bits`.
pub fn unpack_at(
    span: BitSpan<'_>,
    field: &FieldDescriptor,
    base_bits: usize,
) -> Result<Value, ReadError> {
    let offset = shifted_offset(field, base_bits, span.len_bits())?;

    match field.kind() {
        FieldKind::Integer if field.signed() => Ok(Value::I64(sign_extend(
            read_integer(span, field, offset)?,
            field.bit_width(),
        ))),
        FieldKind::Integer => Ok(Value::U64(read_integer(span, field, offset)?)),
        FieldKind::Bool => Ok(Value::U64((read_integer(span, field, offset)? != 0) as u64)),
        FieldKind::Bytes => Ok(Value::Bytes(read_bytes(span, field, offset)?)),
        FieldKind::Text => String::from_utf8(read_bytes(span, field, offset)?)
            .map(Value::Text)
            .map_err(|_| ReadError::InvalidText { bit_offset: offset }),
    }
}

/// Writes `value` into the field described by `field`.
///
/// Fails with [WriteError::ValueOutOfRange] if the value cannot be represented in
/// the field's width and signedness, and with [WriteError::KindMismatch] if the
/// value's type does not suit the field.
pub fn pack(
    span: &mut BitSpanMut<'_>,
    field: &FieldDescriptor,
    value: impl Into<Value>,
) -> Result<(), WriteError> {
    pack_at(span, field, 0, value)
}

/// Writes `value` into `field` with its offset shifted by `base_bits`.
pub fn pack_at(
    span: &mut BitSpanMut<'_>,
    field: &FieldDescriptor,
    base_bits: usize,
    value: impl Into<Value>,
) -> Result<(), WriteError> {
    let offset = shifted_offset(field, base_bits, span.len_bits())?;
    let encoded = encode(field, &value.into())?;
    write_encoded(span, field, offset, &encoded)?;
    Ok(())
}

/// Checks `value` against the field and converts it into the content stored in the buffer.
pub(crate) fn encode(field: &FieldDescriptor, value: &Value) -> Result<Encoded, WriteError> {
    let kind = field.kind();
    let width = field.bit_width();

    match kind {
        FieldKind::Integer => {
            let numeric = value.as_i128().ok_or(WriteError::KindMismatch { kind })?;
            if !field.contains(numeric) {
                return Err(WriteError::ValueOutOfRange {
                    value: numeric,
                    min: field.min_value(),
                    max: field.max_value(),
                });
            }
            // two's complement for negative values
            let masked = (numeric as u64) & low_mask(width);
            Ok(Encoded::Bits(stored_bits(field, masked)))
        }
        FieldKind::Bool => {
            let flag = value.as_bool().ok_or(WriteError::KindMismatch { kind })?;
            Ok(Encoded::Bits(stored_bits(field, flag as u64)))
        }
        FieldKind::Bytes | FieldKind::Text => {
            let bytes = match (kind, value) {
                (FieldKind::Text, Value::Text(text)) => text.as_bytes(),
                (FieldKind::Bytes, value) => value
                    .as_bytes()
                    .ok_or(WriteError::KindMismatch { kind })?,
                _ => return Err(WriteError::KindMismatch { kind }),
            };
            Ok(Encoded::Bytes(stored_bytes(field, bytes)?))
        }
    }
}

/// Writes content produced by [encode] at `bit_offset`.
pub(crate) fn write_encoded(
    span: &mut BitSpanMut<'_>,
    field: &FieldDescriptor,
    bit_offset: usize,
    encoded: &Encoded,
) -> Result<(), SpanError> {
    match encoded {
        Encoded::Bits(raw) => span.write_bits(bit_offset, field.bit_width(), *raw),
        Encoded::Bytes(bytes) => span.write_bytes(bit_offset, field.bit_width(), bytes),
    }
}

fn read_integer(
    span: BitSpan<'_>,
    field: &FieldDescriptor,
    offset: usize,
) -> Result<u64, SpanError> {
    let width = field.bit_width();

    let mut raw = span.read_bits(offset, width)?;
    if field.bit_order() == BitOrder::LsbFirst {
        raw = reverse_bits_n(raw, width);
    }

    Ok(field.byte_order().decode(raw, width))
}

fn read_bytes(
    span: BitSpan<'_>,
    field: &FieldDescriptor,
    offset: usize,
) -> Result<Vec<u8>, SpanError> {
    let bytes = span.read_bytes(offset, field.bit_width())?;

    match field.bit_order() {
        BitOrder::MsbFirst => Ok(bytes),
        BitOrder::LsbFirst => Ok(reverse_bit_string(&bytes, field.bit_width())),
    }
}

fn stored_bits(field: &FieldDescriptor, value: u64) -> u64 {
    let width = field.bit_width();

    let raw = field.byte_order().encode(value, width);
    match field.bit_order() {
        BitOrder::MsbFirst => raw,
        BitOrder::LsbFirst => reverse_bits_n(raw, width),
    }
}

/// Pads `bytes` with zeros to the field's byte length. Content that would be cut
/// off (extra bytes, or low bits of a partial last byte) is rejected.
fn stored_bytes(field: &FieldDescriptor, bytes: &[u8]) -> Result<Vec<u8>, WriteError> {
    let width = field.bit_width();
    let len = field.byte_len();

    let spare_bits = len * 8 - width;
    let cut = bytes.len() > len
        || (bytes.len() == len && bytes[len - 1] as u64 & low_mask(spare_bits) != 0);
    if cut {
        return Err(WriteError::BytesDoNotFit {
            len: bytes.len(),
            bit_width: width,
        });
    }

    let mut stored = bytes.to_vec();
    stored.resize(len, 0);

    match field.bit_order() {
        BitOrder::MsbFirst => Ok(stored),
        BitOrder::LsbFirst => Ok(reverse_bit_string(&stored, width)),
    }
}

fn shifted_offset(
    field: &FieldDescriptor,
    base_bits: usize,
    len_bits: usize,
) -> Result<usize, SpanError> {
    field
        .bit_offset()
        .checked_add(base_bits)
        .ok_or(SpanError::OutOfRange {
            bit_offset: field.bit_offset(),
            bit_width: field.bit_width(),
            len_bits,
        })
}

//! Error types for descriptor compilation, bit access and packing.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors produced by [crate::bits::BitSpan] and [crate::bits::BitSpanMut] accessors.
///
/// Both are reported before any byte of the buffer is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    /// The addressed bit range is empty, wider than 64 bits, or runs past the end of the buffer.
    #[error("bit range {bit_offset}+{bit_width} is out of range for a {len_bits}-bit buffer")]
    OutOfRange {
        bit_offset: usize,
        bit_width: usize,
        len_bits: usize,
    },
    /// The value has set bits above `bit_width - 1`.
    #[error("value {value:#x} does not fit in {bit_width} bits")]
    ValueTooLarge { value: u64, bit_width: usize },
}

/// Shape errors produced when compiling a [crate::field::Field] or building a [crate::layout::Layout].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Field width is 0, or greater than 64 bits for an integer or bool field.
    #[error("field width {bit_width} is not supported")]
    InvalidFieldSize { bit_width: usize },
    /// The caller-facing value kind cannot hold the field width.
    #[error("value kind of {kind_bits} bits cannot hold a {bit_width}-bit field")]
    ValueKindTooNarrow { kind_bits: u32, bit_width: usize },
    /// Two fields (or a field and a padding region) share at least one bit.
    #[error("fields '{first}' and '{second}' overlap")]
    OverlappingFields { first: String, second: String },
    /// A field extends past the end of the record.
    #[error("field '{name}' ends at bit {end_bits}, past the {total_bits}-bit record")]
    FieldOutOfBounds {
        name: String,
        end_bits: usize,
        total_bits: usize,
    },
    /// A setting that the field's kind cannot carry, such as a signed byte field.
    #[error("invalid {kind:?} field: {reason}")]
    InvalidFieldKind { kind: FieldKind, reason: &'static str },
    /// Field name is empty.
    #[error("field name is empty")]
    InvalidFieldName,
    /// Field name is used more than once.
    #[error("field name '{0}' is defined more than once")]
    DuplicateFieldName(String),
    /// Format string could not be parsed.
    #[error("invalid format at position {position}: {reason}")]
    InvalidFormat { position: usize, reason: &'static str },
    /// Format type character is recognised but not implemented.
    #[error("format type '{0}' is not supported")]
    UnsupportedFormatType(char),
    /// Number of names differs from the number of non-padding format items.
    #[error("format has {expected} named items but {actual} names were given")]
    NameCountMismatch { expected: usize, actual: usize },
}

/// Errors produced when unpacking fields from a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Span(#[from] SpanError),
    /// Input data is shorter than the layout's byte length.
    #[error("buffer holds {actual} bytes, layout needs {needed}")]
    PacketTooShort { needed: usize, actual: usize },
    /// No field with this name exists in the layout.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// A text field's bytes are not valid UTF-8.
    #[error("text field at bit {bit_offset} is not valid UTF-8")]
    InvalidText { bit_offset: usize },
}

/// Errors produced when packing values into a buffer.
///
/// Every variant is reported before the buffer is modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error(transparent)]
    Span(#[from] SpanError),
    /// The value cannot be represented by the field (or by the requested integer type).
    #[error("value {value} is outside {min}..={max}")]
    ValueOutOfRange { value: i128, min: i128, max: i128 },
    /// The value's type does not match the field (for example bytes for an integer).
    #[error("value cannot be stored in a {kind:?} field")]
    KindMismatch { kind: FieldKind },
    /// Byte value is longer than the field, or has bits set past the field's end.
    #[error("{len} bytes do not fit in a {bit_width}-bit field")]
    BytesDoNotFit { len: usize, bit_width: usize },
    /// No field with this name exists in the layout.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// A layout field has no value to pack.
    #[error("no value given for field '{0}'")]
    MissingField(String),
    /// Buffer is shorter than the layout's byte length.
    #[error("buffer holds {actual} bytes, layout needs {needed}")]
    PacketTooShort { needed: usize, actual: usize },
    /// Number of positional values differs from the number of fields.
    #[error("layout has {expected} fields but {actual} values were given")]
    ValueCount { expected: usize, actual: usize },
}

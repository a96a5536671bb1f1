//! How a field's raw bits are assembled into a value: bit order, byte order and value kind.

use crate::{bits::low_mask, errors::WriteError, field::FieldKind};

/// Order of a field's bits as they sit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitOrder {
    /// First bit in the buffer is the most significant bit of the field.
    #[default]
    MsbFirst,
    /// First bit in the buffer is the least significant bit of the field.
    LsbFirst,
}

/// Mapping between a multi-byte value's byte significance and buffer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first. Bits keep their logical order.
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// Converts `bit_width` bits as laid out in the buffer into the logical value.
    ///
    /// The buffer bits are cut into 8-bit chunks, MSB-first; when `bit_width` is not a
    /// multiple of 8 the last chunk is short. Little-endian puts the least significant
    /// byte in the first chunk and the value's topmost bits in the short last chunk.
    pub fn decode(self, raw: u64, bit_width: usize) -> u64 {
        if self == ByteOrder::BigEndian || bit_width <= 8 {
            return raw;
        }

        let chunks = bit_width.div_ceil(8);
        let mut value = 0u64;
        for i in 0..chunks - 1 {
            let byte = (raw >> (bit_width - 8 * (i + 1))) & 0xff;
            value |= byte << (8 * i);
        }

        let top_bits = bit_width - 8 * (chunks - 1);
        value | ((raw & low_mask(top_bits)) << (8 * (chunks - 1)))
    }

    /// Inverse of [ByteOrder::decode].
    pub fn encode(self, value: u64, bit_width: usize) -> u64 {
        if self == ByteOrder::BigEndian || bit_width <= 8 {
            return value;
        }

        let chunks = bit_width.div_ceil(8);
        let mut raw = 0u64;
        for i in 0..chunks - 1 {
            let byte = (value >> (8 * i)) & 0xff;
            raw |= byte << (bit_width - 8 * (i + 1));
        }

        raw | (value >> (8 * (chunks - 1)))
    }
}

/// Width of the integer type a field's value is handed out as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Int8,
    Int16,
    Int32,
    Int64,
}

impl ValueKind {
    pub const fn bits(self) -> u32 {
        match self {
            ValueKind::Int8 => 8,
            ValueKind::Int16 => 16,
            ValueKind::Int32 => 32,
            ValueKind::Int64 => 64,
        }
    }

    /// Smallest kind holding `bit_width` bits, or `None` above 64.
    pub const fn fitting(bit_width: usize) -> Option<ValueKind> {
        match bit_width {
            0..=8 => Some(ValueKind::Int8),
            9..=16 => Some(ValueKind::Int16),
            17..=32 => Some(ValueKind::Int32),
            33..=64 => Some(ValueKind::Int64),
            _ => None,
        }
    }
}

/// A value read from, or to be written to, a field.
///
/// Integer and bool fields unpack to `I64` (signed) or `U64`; byte fields to
/// `Bytes` and text fields to `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    I64(i64),
    U64(u64),
    Bytes(Vec<u8>),
    Text(String),
}

impl Value {
    /// Numeric value, independent of the variant. `None` for bytes and text.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I64(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            Value::Bytes(_) | Value::Text(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Non-zero numbers are `true`.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_i128().map(|v| v != 0)
    }

    /// Content of a bytes or text value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            Value::Text(text) => Some(text.as_bytes()),
            Value::I64(_) | Value::U64(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    fn numeric(&self, kind: FieldKind) -> Result<i128, WriteError> {
        self.as_i128().ok_or(WriteError::KindMismatch { kind })
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::U64(value as u64)
    }
}

impl TryFrom<Value> for bool {
    type Error = WriteError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.numeric(FieldKind::Bool)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WriteError::ValueOutOfRange {
                value: other,
                min: 0,
                max: 1,
            }),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(value: [u8; N]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = WriteError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(text) => Ok(text.into_bytes()),
            Value::I64(_) | Value::U64(_) => Err(WriteError::KindMismatch {
                kind: FieldKind::Bytes,
            }),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = WriteError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(text) => Ok(text),
            _ => Err(WriteError::KindMismatch {
                kind: FieldKind::Text,
            }),
        }
    }
}

macro_rules! impl_value_conversions {
    ($variant:ident, $wide:ty, $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value as $wide)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = WriteError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    let v = value.numeric(FieldKind::Integer)?;
                    <$ty>::try_from(v).map_err(|_| WriteError::ValueOutOfRange {
                        value: v,
                        min: <$ty>::MIN as i128,
                        max: <$ty>::MAX as i128,
                    })
                }
            }
        )*
    };
}

impl_value_conversions!(U64, u64, u8, u16, u32, u64);
impl_value_conversions!(I64, i64, i8, i16, i32, i64);

//! Layout: a validated, fixed-size arrangement of named fields.

use std::collections::{BTreeMap, HashMap};

use crate::{
    assembly::Value,
    bits::{BitSpan, BitSpanMut, MAX_BITS, low_mask},
    codec::{self, Encoded},
    descriptor::FieldDescriptor,
    errors::{CompileError, ReadError, WriteError},
    field::Field,
};

/// A named, compiled field inside a [Layout].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub name: String,
    pub descriptor: FieldDescriptor,
}

/// What a padding region is filled with when a whole record is packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadFill {
    #[default]
    Zeros,
    Ones,
}

/// Unnamed bits that belong to the record but carry no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    pub bit_offset: usize,
    pub bit_width: usize,
    pub fill: PadFill,
}

impl Padding {
    fn label(&self) -> String {
        format!("<padding@{}>", self.bit_offset)
    }
}

/// A compiled record layout. Use [Layout::build] to create one from [Field]s, then
/// [Layout::unpack_all] and [Layout::pack_field] to read and write buffers.
///
/// Fields never overlap each other or padding, and every field lies inside
/// `total_bytes`. A layout is immutable once built.
#[derive(Debug, Clone)]
pub struct Layout {
    total_bytes: usize,
    fields: Vec<LayoutField>,
    padding: Vec<Padding>,
    index: HashMap<String, usize>,
}

impl Layout {
    /// Compiles `fields` into a layout of exactly `total_bytes` bytes.
    pub fn build(fields: &[Field], total_bytes: usize) -> Result<Self, CompileError> {
        Self::build_with_padding(fields, Vec::new(), total_bytes)
    }

    /// Compiles `fields` into the smallest layout that holds all of them.
    pub fn compile(fields: &[Field]) -> Result<Self, CompileError> {
        let total_bits = fields.iter().map(Field::end_bits).max().unwrap_or(0);
        Self::build(fields, total_bits.div_ceil(8))
    }

    pub(crate) fn build_with_padding(
        fields: &[Field],
        padding: Vec<Padding>,
        total_bytes: usize,
    ) -> Result<Self, CompileError> {
        let total_bits = total_bytes.saturating_mul(8);
        let mut compiled: Vec<LayoutField> = Vec::with_capacity(fields.len());
        let mut index = HashMap::with_capacity(fields.len());

        for field in fields {
            let descriptor = FieldDescriptor::try_from(field)?;

            if field.name.is_empty() {
                return Err(CompileError::InvalidFieldName);
            }
            if index.insert(field.name.clone(), compiled.len()).is_some() {
                return Err(CompileError::DuplicateFieldName(field.name.clone()));
            }
            if descriptor.end_bits() > total_bits {
                return Err(CompileError::FieldOutOfBounds {
                    name: field.name.clone(),
                    end_bits: descriptor.end_bits(),
                    total_bits,
                });
            }

            compiled.push(LayoutField {
                name: field.name.clone(),
                descriptor,
            });
        }

        for pad in &padding {
            if pad.bit_width == 0 {
                return Err(CompileError::InvalidFieldSize { bit_width: 0 });
            }
            let end_bits = pad.bit_offset.saturating_add(pad.bit_width);
            if end_bits > total_bits {
                return Err(CompileError::FieldOutOfBounds {
                    name: pad.label(),
                    end_bits,
                    total_bits,
                });
            }
        }

        check_overlap(&compiled, &padding)?;

        log::debug!(
            "compiled layout: {} fields, {} padding regions, {} bits",
            compiled.len(),
            padding.len(),
            total_bits
        );

        Ok(Layout {
            total_bytes,
            fields: compiled,
            padding,
            index,
        })
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn total_bits(&self) -> usize {
        self.total_bytes * 8
    }

    /// Fields in definition order.
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    pub fn padding(&self) -> &[Padding] {
        &self.padding
    }

    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Unpacks every field of the record at the start of `data`.
    ///
    /// Fails without producing any values if `data` is shorter than the layout.
    pub fn unpack_all(&self, data: &[u8]) -> Result<BTreeMap<String, Value>, ReadError> {
        self.unpack_all_at(data, 0)
    }

    /// Unpacks every field of the record starting `base_bits` into `data`.
    pub fn unpack_all_at(
        &self,
        data: &[u8],
        base_bits: usize,
    ) -> Result<BTreeMap<String, Value>, ReadError> {
        self.check_read_len(data, base_bits)?;

        let span = BitSpan::new(data);
        let mut map = BTreeMap::new();
        for field in &self.fields {
            map.insert(
                field.name.clone(),
                codec::unpack_at(span, &field.descriptor, base_bits)?,
            );
        }

        Ok(map)
    }

    /// Unpacks every field in definition order.
    pub fn unpack_values(&self, data: &[u8]) -> Result<Vec<Value>, ReadError> {
        self.check_read_len(data, 0)?;

        let span = BitSpan::new(data);
        self.fields
            .iter()
            .map(|field| codec::unpack(span, &field.descriptor))
            .collect()
    }

    /// Unpacks a single named field.
    pub fn unpack_field(&self, data: &[u8], name: &str) -> Result<Value, ReadError> {
        let field = self
            .field(name)
            .ok_or_else(|| ReadError::UnknownField(name.to_string()))?;

        codec::unpack(BitSpan::new(data), &field.descriptor)
    }

    /// Packs `value` into the named field, leaving every other bit of `data` as is.
    pub fn pack_field(
        &self,
        data: &mut [u8],
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), WriteError> {
        let field = self
            .field(name)
            .ok_or_else(|| WriteError::UnknownField(name.to_string()))?;

        codec::pack(&mut BitSpanMut::new(data), &field.descriptor, value)
    }

    /// Packs a whole record: every field from `values`, and every padding region.
    ///
    /// All names and values are validated before `data` is modified.
    pub fn pack_all(
        &self,
        data: &mut [u8],
        values: &BTreeMap<String, Value>,
    ) -> Result<(), WriteError> {
        self.pack_all_at(data, 0, values)
    }

    /// Packs a whole record starting `base_bits` into `data`.
    ///
    /// Bits before `base_bits` and after the record keep their value.
    pub fn pack_all_at(
        &self,
        data: &mut [u8],
        base_bits: usize,
        values: &BTreeMap<String, Value>,
    ) -> Result<(), WriteError> {
        self.check_write_len(data, base_bits)?;

        if let Some(unknown) = values.keys().find(|name| !self.index.contains_key(*name)) {
            return Err(WriteError::UnknownField(unknown.clone()));
        }

        let encoded = self
            .fields
            .iter()
            .map(|field| {
                let value = values
                    .get(&field.name)
                    .ok_or_else(|| WriteError::MissingField(field.name.clone()))?;
                codec::encode(&field.descriptor, value)
            })
            .collect::<Result<Vec<Encoded>, WriteError>>()?;

        self.write_record(data, base_bits, &encoded)
    }

    /// Packs a whole record from values given in field definition order.
    pub fn pack_values(&self, data: &mut [u8], values: &[Value]) -> Result<(), WriteError> {
        self.pack_values_at(data, 0, values)
    }

    /// Positional form of [Layout::pack_all_at].
    pub fn pack_values_at(
        &self,
        data: &mut [u8],
        base_bits: usize,
        values: &[Value],
    ) -> Result<(), WriteError> {
        if values.len() != self.fields.len() {
            return Err(WriteError::ValueCount {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        self.check_write_len(data, base_bits)?;

        let encoded = self
            .fields
            .iter()
            .zip(values)
            .map(|(field, value)| codec::encode(&field.descriptor, value))
            .collect::<Result<Vec<Encoded>, WriteError>>()?;

        self.write_record(data, base_bits, &encoded)
    }

    fn write_record(
        &self,
        data: &mut [u8],
        base_bits: usize,
        encoded: &[Encoded],
    ) -> Result<(), WriteError> {
        let mut span = BitSpanMut::new(data);

        for pad in &self.padding {
            fill_padding(&mut span, base_bits, pad)?;
        }
        for (field, content) in self.fields.iter().zip(encoded) {
            let offset = base_bits + field.descriptor.bit_offset();
            codec::write_encoded(&mut span, &field.descriptor, offset, content)?;
        }

        Ok(())
    }

    fn check_read_len(&self, data: &[u8], base_bits: usize) -> Result<(), ReadError> {
        let needed = self.needed_bytes(base_bits);
        if data.len() < needed {
            return Err(ReadError::PacketTooShort {
                needed,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn check_write_len(&self, data: &[u8], base_bits: usize) -> Result<(), WriteError> {
        let needed = self.needed_bytes(base_bits);
        if data.len() < needed {
            return Err(WriteError::PacketTooShort {
                needed,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn needed_bytes(&self, base_bits: usize) -> usize {
        base_bits.saturating_add(self.total_bits()).div_ceil(8)
    }
}

fn fill_padding(
    span: &mut BitSpanMut<'_>,
    base_bits: usize,
    pad: &Padding,
) -> Result<(), WriteError> {
    let mut offset = base_bits + pad.bit_offset;
    let end = offset + pad.bit_width;

    while offset < end {
        let width = (end - offset).min(MAX_BITS);
        let bits = match pad.fill {
            PadFill::Zeros => 0,
            PadFill::Ones => low_mask(width),
        };
        span.write_bits(offset, width, bits)?;
        offset += width;
    }

    Ok(())
}

/// Sorts every occupied range by start bit; any overlap shows up between neighbours.
fn check_overlap(fields: &[LayoutField], padding: &[Padding]) -> Result<(), CompileError> {
    let mut ranges: Vec<(usize, usize, String)> = fields
        .iter()
        .map(|f| (f.descriptor.bit_offset(), f.descriptor.end_bits(), f.name.clone()))
        .chain(
            padding
                .iter()
                .map(|p| (p.bit_offset, p.bit_offset + p.bit_width, p.label())),
        )
        .collect();

    ranges.sort_by_key(|&(start, end, _)| (start, end));

    for pair in ranges.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.0 < prev.1 {
            return Err(CompileError::OverlappingFields {
                first: prev.2.clone(),
                second: next.2.clone(),
            });
        }
    }

    Ok(())
}

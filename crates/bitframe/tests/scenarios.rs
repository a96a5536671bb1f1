use std::collections::BTreeMap;

use bitframe::{
    assembly::{BitOrder, ByteOrder, Value},
    bits::{BitSpan, BitSpanMut},
    codec::{pack, pack_at, unpack, unpack_at},
    descriptor::FieldDescriptor,
    errors::{CompileError, ReadError, SpanError, WriteError},
    field::Field,
    layout::Layout,
};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_types_are_send_and_sync() {
    assert_send_sync::<Layout>();
    assert_send_sync::<FieldDescriptor>();
    assert_send_sync::<Value>();
}

#[test]
fn straddling_byte_field() {
    let field = FieldDescriptor::new(4, 8, false).unwrap();
    let mut buf = [0u8; 4];

    pack(&mut BitSpanMut::new(&mut buf), &field, 0x4Fu8).unwrap();
    assert_eq!(buf, [0x04, 0xF0, 0x00, 0x00]);
    assert_eq!(unpack(BitSpan::new(&buf), &field), Ok(Value::U64(0x4F)));
}

#[test]
fn signed_five_bit_minus_one() {
    let field = FieldDescriptor::new(0, 5, true).unwrap();
    let mut buf = [0u8; 1];

    pack(&mut BitSpanMut::new(&mut buf), &field, -1i8).unwrap();
    assert_eq!(buf, [0xF8]);
    assert_eq!(unpack(BitSpan::new(&buf), &field), Ok(Value::I64(-1)));
}

#[test]
fn oversized_value_is_reported_not_truncated() {
    let field = FieldDescriptor::new(0, 4, false).unwrap();
    let mut buf = [0xAAu8];

    assert_eq!(
        pack(&mut BitSpanMut::new(&mut buf), &field, 16u8),
        Err(WriteError::ValueOutOfRange {
            value: 16,
            min: 0,
            max: 15
        })
    );
    assert_eq!(buf, [0xAA]);
}

#[test]
fn field_past_buffer_end() {
    let field = FieldDescriptor::new(20, 8, false).unwrap();
    let buf = [0u8; 3];

    assert_eq!(
        unpack(BitSpan::new(&buf), &field),
        Err(ReadError::Span(SpanError::OutOfRange {
            bit_offset: 20,
            bit_width: 8,
            len_bits: 24
        }))
    );
}

#[test]
fn record_at_bit_offset() {
    let field = FieldDescriptor::new(0, 12, false).unwrap();
    let mut buf = [0u8; 3];

    pack_at(&mut BitSpanMut::new(&mut buf), &field, 6, 0xABCu16).unwrap();
    assert_eq!(buf, [0x02, 0xAF, 0x00]);
    assert_eq!(unpack_at(BitSpan::new(&buf), &field, 6), Ok(Value::U64(0xABC)));
}

fn sensor_layout() -> Layout {
    Layout::build(
        &[
            Field::unsigned("id", 0, 12),
            Field::signed("temp", 12, 16).with_byte_order(ByteOrder::LittleEndian),
            Field::unsigned("flags", 28, 4).with_bit_order(BitOrder::LsbFirst),
        ],
        4,
    )
    .unwrap()
}

#[test]
fn layout_pack_all_and_unpack_all() {
    let layout = sensor_layout();
    let values = BTreeMap::from([
        ("id".to_string(), Value::U64(0x123)),
        ("temp".to_string(), Value::I64(-2)),
        ("flags".to_string(), Value::U64(0b0001)),
    ]);

    let mut buf = [0u8; 4];
    layout.pack_all(&mut buf, &values).unwrap();
    // -2 as 16 bits is 0xFFFE, stored low byte first; flags reversed to 0b1000
    assert_eq!(buf, [0x12, 0x3F, 0xEF, 0xF8]);
    assert_eq!(layout.unpack_all(&buf), Ok(values));
}

#[test]
fn layout_rejects_bad_shapes() {
    assert_eq!(
        Layout::build(
            &[Field::unsigned("a", 0, 9), Field::unsigned("b", 8, 4)],
            4
        )
        .unwrap_err(),
        CompileError::OverlappingFields {
            first: "a".into(),
            second: "b".into()
        }
    );
    assert_eq!(
        Layout::build(&[Field::unsigned("a", 28, 8)], 4).unwrap_err(),
        CompileError::FieldOutOfBounds {
            name: "a".into(),
            end_bits: 36,
            total_bits: 32
        }
    );
    assert_eq!(
        Layout::build(&[Field::unsigned("a", 0, 0)], 4).unwrap_err(),
        CompileError::InvalidFieldSize { bit_width: 0 }
    );
}

#[test]
fn layout_unknown_and_missing_fields() {
    let layout = sensor_layout();
    let mut buf = [0u8; 4];

    assert_eq!(
        layout.unpack_field(&buf, "humidity"),
        Err(ReadError::UnknownField("humidity".into()))
    );
    assert_eq!(
        layout.pack_field(&mut buf, "humidity", 1u8),
        Err(WriteError::UnknownField("humidity".into()))
    );

    let partial = BTreeMap::from([("id".to_string(), Value::U64(1))]);
    assert!(matches!(
        layout.pack_all(&mut buf, &partial),
        Err(WriteError::MissingField(_))
    ));
    assert_eq!(buf, [0u8; 4]);
}

#[test]
fn layout_short_buffer() {
    let layout = sensor_layout();

    assert_eq!(
        layout.unpack_all(&[0u8; 3]),
        Err(ReadError::PacketTooShort {
            needed: 4,
            actual: 3
        })
    );
}

#[test]
fn text_record_at_bit_offset() {
    let layout = Layout::from_format("u4t16b4", &["kind", "label", "ok"]).unwrap();
    let values = BTreeMap::from([
        ("kind".to_string(), Value::U64(0xA)),
        ("label".to_string(), Value::from("hi")),
        ("ok".to_string(), Value::U64(3)),
    ]);

    let mut short = [0u8; 4];
    assert_eq!(
        layout.pack_all_at(&mut short, 12, &values),
        Err(WriteError::PacketTooShort {
            needed: 5,
            actual: 4
        })
    );
    assert_eq!(short, [0u8; 4]);

    let mut buf = [0u8; 5];
    layout.pack_all_at(&mut buf, 12, &values).unwrap();
    assert_eq!(buf, [0x00, 0x0A, 0x68, 0x69, 0x10]);

    let unpacked = layout.unpack_all_at(&buf, 12).unwrap();
    assert_eq!(unpacked["label"], Value::from("hi"));
    assert_eq!(unpacked["ok"], Value::U64(1));
}

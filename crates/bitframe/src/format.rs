//! bitstruct-style format strings.
//!
//! A format is a sequence of items, each a type character followed by a bit count:
//!
//! | char | meaning                           |
//! |------|-----------------------------------|
//! | `u`  | unsigned integer                  |
//! | `s`  | signed integer                    |
//! | `b`  | boolean (stores 0 or 1)           |
//! | `t`  | UTF-8 text                        |
//! | `r`  | raw bytes                         |
//! | `p`  | padding filled with zeros         |
//! | `P`  | padding filled with ones          |
//!
//! `f` (float) is recognised but not supported. Text and raw items may be any
//! number of bits; a partial last byte is stored left-aligned.
//!
//! `>` or `<` in front of an item switches to MSB-first or LSB-first bit order for
//! that item and every following one. A `>` or `<` at the very end sets the byte
//! order of every integer and boolean field. Items are placed back to back
//! starting at bit 0.
//!
//! ```
//! use bitframe::{assembly::Value, layout::Layout};
//!
//! let layout = Layout::from_format("u4p4s8", &["kind", "delta"]).unwrap();
//! let mut buf = [0u8; 2];
//! layout.pack_values(&mut buf, &[Value::U64(3), Value::I64(-1)]).unwrap();
//! assert_eq!(buf, [0x30, 0xFF]);
//! ```

use crate::{
    assembly::{BitOrder, ByteOrder},
    errors::CompileError,
    field::{Field, FieldKind},
    layout::{Layout, PadFill, Padding},
};

/// What a single format item holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Unsigned,
    Signed,
    Bool,
    Text,
    Raw,
    Padding(PadFill),
}

/// One parsed format item, already placed at its bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatItem {
    pub kind: FormatKind,
    pub bit_offset: usize,
    pub bit_width: usize,
    pub bit_order: BitOrder,
}

impl FormatItem {
    pub fn is_padding(&self) -> bool {
        matches!(self.kind, FormatKind::Padding(_))
    }
}

/// A parsed format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub items: Vec<FormatItem>,
    pub byte_order: ByteOrder,
}

impl Format {
    /// Total number of bits covered by the items.
    pub fn total_bits(&self) -> usize {
        self.items
            .last()
            .map_or(0, |item| item.bit_offset + item.bit_width)
    }

    /// Number of items that carry a value.
    pub fn value_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_padding()).count()
    }
}

/// Parses `fmt` into placed items.
pub fn parse(fmt: &str) -> Result<Format, CompileError> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut items = Vec::new();
    let mut bit_order = BitOrder::MsbFirst;
    let mut byte_order = ByteOrder::BigEndian;
    let mut offset = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(order) = mode(c) {
            if i + 1 == chars.len() {
                byte_order = match order {
                    BitOrder::MsbFirst => ByteOrder::BigEndian,
                    BitOrder::LsbFirst => ByteOrder::LittleEndian,
                };
            } else {
                bit_order = order;
            }
            i += 1;
            continue;
        }

        let kind = match c {
            'u' => FormatKind::Unsigned,
            's' => FormatKind::Signed,
            'b' => FormatKind::Bool,
            't' => FormatKind::Text,
            'r' => FormatKind::Raw,
            'p' => FormatKind::Padding(PadFill::Zeros),
            'P' => FormatKind::Padding(PadFill::Ones),
            'f' => return Err(CompileError::UnsupportedFormatType(c)),
            _ => {
                return Err(CompileError::InvalidFormat {
                    position: i,
                    reason: "expected a type character",
                });
            }
        };
        i += 1;

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if start == i {
            return Err(CompileError::InvalidFormat {
                position: start,
                reason: "expected a bit count",
            });
        }

        let digits: String = chars[start..i].iter().collect();
        let bit_width = digits
            .parse::<usize>()
            .map_err(|_| CompileError::InvalidFormat {
                position: start,
                reason: "bit count is too large",
            })?;
        if bit_width == 0 {
            return Err(CompileError::InvalidFormat {
                position: start,
                reason: "bit count must be positive",
            });
        }

        items.push(FormatItem {
            kind,
            bit_offset: offset,
            bit_width,
            bit_order,
        });
        offset = offset
            .checked_add(bit_width)
            .ok_or(CompileError::InvalidFormat {
                position: start,
                reason: "format is too large",
            })?;
    }

    Ok(Format { items, byte_order })
}

/// Number of bits described by `fmt`.
pub fn calcsize(fmt: &str) -> Result<usize, CompileError> {
    Ok(parse(fmt)?.total_bits())
}

/// Number of bytes needed to hold `fmt`.
pub fn calcbytes(fmt: &str) -> Result<usize, CompileError> {
    Ok(calcsize(fmt)?.div_ceil(8))
}

fn mode(c: char) -> Option<BitOrder> {
    match c {
        '>' => Some(BitOrder::MsbFirst),
        '<' => Some(BitOrder::LsbFirst),
        _ => None,
    }
}

impl Layout {
    /// Builds a layout from a format string, naming the non-padding items in order.
    pub fn from_format<S: AsRef<str>>(fmt: &str, names: &[S]) -> Result<Layout, CompileError> {
        let format = parse(fmt)?;

        if format.value_count() != names.len() {
            return Err(CompileError::NameCountMismatch {
                expected: format.value_count(),
                actual: names.len(),
            });
        }

        let mut names = names.iter();
        let mut fields = Vec::with_capacity(format.value_count());
        let mut padding = Vec::new();

        for item in &format.items {
            if let FormatKind::Padding(fill) = item.kind {
                padding.push(Padding {
                    bit_offset: item.bit_offset,
                    bit_width: item.bit_width,
                    fill,
                });
                continue;
            }

            let kind = match item.kind {
                FormatKind::Bool => FieldKind::Bool,
                FormatKind::Text => FieldKind::Text,
                FormatKind::Raw => FieldKind::Bytes,
                _ => FieldKind::Integer,
            };
            let byte_order = if kind.is_bytes() {
                ByteOrder::BigEndian
            } else {
                format.byte_order
            };

            let name: &str = names.next().map_or("", |n| n.as_ref());
            fields.push(Field {
                name: name.to_string(),
                bit_offset: item.bit_offset,
                bit_width: item.bit_width,
                kind,
                signed: item.kind == FormatKind::Signed,
                byte_order,
                bit_order: item.bit_order,
                value_kind: None,
            });
        }

        Layout::build_with_padding(&fields, padding, format.total_bits().div_ceil(8))
    }
}

#[cfg(test)]
mod tests {
    use crate::assembly::Value;

    use super::*;

    #[test]
    fn test_parse_items() {
        let format = parse("u5b2").unwrap();
        assert_eq!(format.items.len(), 2);
        assert_eq!(format.items[1].kind, FormatKind::Bool);
        assert_eq!(format.items[1].bit_offset, 5);
        assert_eq!(format.total_bits(), 7);
        assert_eq!(format.byte_order, ByteOrder::BigEndian);
    }

    #[test]
    fn test_parse_modes() {
        let format = parse("<u4u10>u12<").unwrap();
        let orders: Vec<BitOrder> = format.items.iter().map(|i| i.bit_order).collect();
        assert_eq!(
            orders,
            vec![BitOrder::LsbFirst, BitOrder::LsbFirst, BitOrder::MsbFirst]
        );
        assert_eq!(format.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_count_items() {
        assert_eq!(parse("t3u1s3b2r3").unwrap().value_count(), 5);
        assert_eq!(parse("u1f32").unwrap_err(), CompileError::UnsupportedFormatType('f'));
        assert_eq!(parse("p3<u3>u1<s3P9>b2").unwrap().items.len(), 6);
        assert_eq!(parse("b1u1s3b2p5<").unwrap().value_count(), 4);
        assert_eq!(parse("<u5P6>b2").unwrap().value_count(), 2);
    }

    #[test]
    fn test_calcsize() {
        assert_eq!(calcsize("u12b1b1u14s24"), Ok(52));
        assert_eq!(calcbytes("u12b1b1u14s24"), Ok(7));
        assert_eq!(calcsize(""), Ok(0));
    }

    #[test]
    fn test_invalid_formats() {
        assert_eq!(
            parse("u"),
            Err(CompileError::InvalidFormat {
                position: 1,
                reason: "expected a bit count"
            })
        );
        assert_eq!(
            parse("u0"),
            Err(CompileError::InvalidFormat {
                position: 1,
                reason: "bit count must be positive"
            })
        );
        assert_eq!(
            parse("x4"),
            Err(CompileError::InvalidFormat {
                position: 0,
                reason: "expected a type character"
            })
        );
        assert_eq!(parse("f32"), Err(CompileError::UnsupportedFormatType('f')));
    }

    #[test]
    fn test_name_count_mismatch() {
        assert_eq!(
            Layout::from_format("u4p4u8", &["a"]).unwrap_err(),
            CompileError::NameCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_integer_wider_than_64_rejected() {
        assert_eq!(
            Layout::from_format("u65", &["a"]).unwrap_err(),
            CompileError::InvalidFieldSize { bit_width: 65 }
        );
        assert!(Layout::from_format("p100u4", &["a"]).is_ok());
    }

    #[test]
    fn test_pack_mixed_format() {
        let layout =
            Layout::from_format("u12b1b1u14s24", &["a", "b", "c", "d", "e"]).unwrap();
        let mut buf = [0u8; 7];
        layout
            .pack_values(
                &mut buf,
                &[
                    Value::from(3300u16),
                    Value::from(true),
                    Value::from(false),
                    Value::from(4500u16),
                    Value::from(-12423i32),
                ],
            )
            .unwrap();
        assert_eq!(buf, [0xCE, 0x49, 0x19, 0x4F, 0xFC, 0xF7, 0x90]);
    }

    #[test]
    fn test_pack_multiple_unsigned() {
        let layout = Layout::from_format("u4u4u8u3u5", &["a", "b", "c", "d", "e"]).unwrap();
        let mut buf = [0u8; 3];
        let values: Vec<Value> = [5u8, 2, 0xFF, 5, 0b11010].into_iter().map(Value::from).collect();
        layout.pack_values(&mut buf, &values).unwrap();
        assert_eq!(buf, [0x52, 0xFF, 0xBA]);
        assert_eq!(layout.unpack_values(&buf).unwrap(), values);
    }

    #[test]
    fn test_lsb_first_items() {
        let layout = Layout::from_format("<u4", &["a"]).unwrap();
        let mut buf = [0u8; 1];
        layout.pack_values(&mut buf, &[Value::U64(0b1010)]).unwrap();
        assert_eq!(buf, [0x50]);

        let layout = Layout::from_format("<u10", &["a"]).unwrap();
        let mut buf = [0u8; 2];
        layout
            .pack_values(&mut buf, &[Value::U64(0b11_1010_0101)])
            .unwrap();
        assert_eq!(buf, [0xA5, 0xC0]);
        assert_eq!(layout.unpack_values(&buf), Ok(vec![Value::U64(0b11_1010_0101)]));
    }

    #[test]
    fn test_padding_fill() {
        let layout = Layout::from_format("p4u4P4u4", &["a", "b"]).unwrap();
        assert_eq!(layout.padding().len(), 2);

        let mut buf = [0xFF, 0x00];
        layout
            .pack_values(&mut buf, &[Value::U64(3), Value::U64(5)])
            .unwrap();
        assert_eq!(buf, [0x03, 0xF5]);
    }

    #[test]
    fn test_trailing_little_endian() {
        let layout = Layout::from_format("u16<", &["a"]).unwrap();
        let mut buf = [0u8; 2];
        layout.pack_values(&mut buf, &[Value::U64(0x1234)]).unwrap();
        assert_eq!(buf, [0x34, 0x12]);
    }

    #[test]
    fn test_signed_minus_one_fills_field() {
        for width in [1usize, 4, 10, 12, 30, 43, 64] {
            let layout = Layout::from_format(&format!("s{width}"), &["v"]).unwrap();
            let mut buf = vec![0u8; width.div_ceil(8)];
            layout.pack_values(&mut buf, &[Value::I64(-1)]).unwrap();
            assert_eq!(layout.unpack_values(&buf), Ok(vec![Value::I64(-1)]));
            assert_eq!(buf[0] >> 7, 1);
        }
    }

    #[test]
    fn test_multi_bit_bool() {
        let layout = Layout::from_format("b3u5", &["flag", "rest"]).unwrap();
        assert_eq!(
            layout.unpack_values(&[0b1010_0000]),
            Ok(vec![Value::U64(1), Value::U64(0)])
        );

        let mut buf = [0u8; 1];
        layout
            .pack_values(&mut buf, &[Value::U64(2), Value::U64(0)])
            .unwrap();
        assert_eq!(buf, [0b0010_0000]);
    }

    #[test]
    fn test_text_mixed_with_integers() {
        let ge = || Value::from("ge");
        let cases: [(&str, Vec<Value>, &[u8]); 4] = [
            (
                "u5u3t16s8",
                vec![Value::U64(25), Value::U64(5), ge(), Value::I64(-45)],
                &[0xCD, 0x67, 0x65, 0xD3],
            ),
            (
                "u5t16s8",
                vec![Value::U64(25), ge(), Value::I64(-45)],
                &[0xCB, 0x3B, 0x2E, 0x98],
            ),
            (
                "u5t21s8",
                vec![Value::U64(25), Value::from("geH"), Value::I64(-45)],
                &[0xCB, 0x3B, 0x2A, 0x74, 0xC0],
            ),
            (
                "u3t18s12",
                vec![Value::U64(7), Value::from("ge@"), Value::I64(-45)],
                &[0xEC, 0xEC, 0xAF, 0xE9, 0x80],
            ),
        ];

        for (fmt, values, expected) in cases {
            let names: Vec<String> = (0..values.len()).map(|i| format!("v{i}")).collect();
            let layout = Layout::from_format(fmt, &names).unwrap();
            let mut buf = vec![0u8; calcbytes(fmt).unwrap()];
            layout.pack_values(&mut buf, &values).unwrap();
            assert_eq!(buf, expected, "{fmt}");
            assert_eq!(layout.unpack_values(&buf), Ok(values), "{fmt}");
        }
    }

    #[test]
    fn test_text_arrays() {
        for (fmt, text, expected) in [
            ("t16", "ge", vec![0x67, 0x65]),
            ("<t16", "ge", vec![0xA6, 0xE6]),
            ("t32", "gehs", b"gehs".to_vec()),
            ("t96", "crustyauklet", b"crustyauklet".to_vec()),
        ] {
            let layout = Layout::from_format(fmt, &["text"]).unwrap();
            let mut buf = vec![0u8; expected.len()];
            layout.pack_values(&mut buf, &[Value::from(text)]).unwrap();
            assert_eq!(buf, expected, "{fmt}");
            assert_eq!(layout.unpack_values(&buf), Ok(vec![Value::from(text)]));
        }
    }

    #[test]
    fn test_raw_arrays() {
        for (fmt, raw, expected) in [
            ("r8", b"g".to_vec(), vec![0x67]),
            ("r32", b"gehs".to_vec(), vec![0x67, 0x65, 0x68, 0x73]),
            ("<r32", b"gehs".to_vec(), vec![0xCE, 0x16, 0xA6, 0xE6]),
            ("r96", b"crustyauklet".to_vec(), b"crustyauklet".to_vec()),
            (
                "<r96",
                b"crustyauklet".to_vec(),
                vec![
                    0x2E, 0xA6, 0x36, 0xD6, 0xAE, 0x86, 0x9E, 0x2E, 0xCE, 0xAE, 0x4E, 0xC6,
                ],
            ),
        ] {
            let layout = Layout::from_format(fmt, &["raw"]).unwrap();
            let mut buf = vec![0u8; expected.len()];
            layout
                .pack_values(&mut buf, &[Value::Bytes(raw.clone())])
                .unwrap();
            assert_eq!(buf, expected, "{fmt}");
            assert_eq!(layout.unpack_values(&buf), Ok(vec![Value::Bytes(raw)]));
        }
    }

    #[test]
    fn test_trailing_byte_order_skips_byte_items() {
        let layout = Layout::from_format("u16r16<", &["n", "raw"]).unwrap();
        let mut buf = [0u8; 4];
        layout
            .pack_values(&mut buf, &[Value::U64(0x1234), Value::from(*b"ge")])
            .unwrap();
        assert_eq!(buf, [0x34, 0x12, 0x67, 0x65]);
    }
}

//! # bitframe
//!
//! Type-safe packing and unpacking of integer fields that sit at arbitrary bit
//! offsets and widths inside a caller-owned byte buffer. Fields may also hold
//! flags, raw bytes or text.
//!
//! Bits are numbered MSB-first: bit 0 is the high bit of the first byte. Each
//! field is described by its offset, width, signedness, byte order and bit
//! order; a [layout::Layout] groups named fields into a fixed-size record and
//! guarantees they do not overlap.
//!
//! ## Example
//!
//! ```
//! use bitframe::assembly::Value;
//! use bitframe::field::Field;
//! use bitframe::layout::Layout;
//!
//! let layout = Layout::build(
//!     &[
//!         Field::unsigned("version", 0, 4),
//!         Field::signed("offset", 4, 8),
//!     ],
//!     2,
//! )
//! .unwrap();
//!
//! let mut buf = [0u8; 2];
//! layout.pack_field(&mut buf, "version", 2u8).unwrap();
//! layout.pack_field(&mut buf, "offset", -3i8).unwrap();
//! assert_eq!(buf, [0x2F, 0xD0]);
//!
//! let values = layout.unpack_all(&buf).unwrap();
//! assert_eq!(values["offset"], Value::I64(-3));
//! ```
//!
//! Single fields can be read and written without a layout through [codec]:
//!
//! ```
//! use bitframe::bits::{BitSpan, BitSpanMut};
//! use bitframe::codec::{pack, unpack};
//! use bitframe::descriptor::FieldDescriptor;
//! use bitframe::assembly::Value;
//!
//! let field = FieldDescriptor::new(4, 8, false).unwrap();
//! let mut buf = [0u8; 4];
//! pack(&mut BitSpanMut::new(&mut buf), &field, 0x4Fu8).unwrap();
//! assert_eq!(buf, [0x04, 0xF0, 0x00, 0x00]);
//! assert_eq!(unpack(BitSpan::new(&buf), &field).unwrap(), Value::U64(0x4F));
//! ```

pub mod assembly;
pub mod bits;
pub mod codec;
pub mod descriptor;
pub mod errors;
pub mod field;
pub mod format;
pub mod layout;
#[cfg(feature = "serde")]
pub mod serde;

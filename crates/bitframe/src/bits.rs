//! Bit-addressed views over byte slices.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte.
//! A field of up to 64 bits at an arbitrary sub-byte offset touches at most nine
//! bytes, so every access is done through a `u128` window over the touched bytes.

use crate::errors::SpanError;

/// Largest field width a single read or write handles.
pub const MAX_BITS: usize = 64;

/// Read-only bit view over a borrowed byte slice.
#[derive(Debug, Clone, Copy)]
pub struct BitSpan<'a> {
    data: &'a [u8],
}

/// Writable bit view over a borrowed byte slice.
#[derive(Debug)]
pub struct BitSpanMut<'a> {
    data: &'a mut [u8],
}

impl<'a> BitSpan<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Number of addressable bits.
    pub fn len_bits(&self) -> usize {
        self.data.len() * 8
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Reads `bit_width` bits starting at `bit_offset` as an unsigned value.
    ///
    /// The first bit read becomes the most significant bit of the result.
    pub fn read_bits(&self, bit_offset: usize, bit_width: usize) -> Result<u64, SpanError> {
        read_window(self.data, bit_offset, bit_width)
    }

    /// Reads the single bit at `bit_offset`.
    pub fn read_bit(&self, bit_offset: usize) -> Result<bool, SpanError> {
        Ok(self.read_bits(bit_offset, 1)? == 1)
    }

    /// Reads `bit_width` bits (any width) as bytes, MSB-first.
    ///
    /// A partial last byte is left-aligned with its low bits cleared.
    pub fn read_bytes(&self, bit_offset: usize, bit_width: usize) -> Result<Vec<u8>, SpanError> {
        check_long_range(self.data.len(), bit_offset, bit_width)?;

        byte_chunks(bit_offset, bit_width)
            .map(|chunk| {
                let bits = self.read_bits(chunk.bit_offset, chunk.bit_width)?;
                Ok((bits as u8) << (8 - chunk.bit_width))
            })
            .collect()
    }
}

impl<'a> From<&'a [u8]> for BitSpan<'a> {
    fn from(data: &'a [u8]) -> Self {
        BitSpan::new(data)
    }
}

impl<'a> BitSpanMut<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Number of addressable bits.
    pub fn len_bits(&self) -> usize {
        self.data.len() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.data
    }

    /// Reborrows as a read-only span.
    pub fn as_span(&self) -> BitSpan<'_> {
        BitSpan::new(&*self.data)
    }

    /// See [BitSpan::read_bits].
    pub fn read_bits(&self, bit_offset: usize, bit_width: usize) -> Result<u64, SpanError> {
        read_window(&*self.data, bit_offset, bit_width)
    }

    /// Writes the low `bit_width` bits of `value` at `bit_offset`.
    ///
    /// Bits outside `[bit_offset, bit_offset + bit_width)` keep their value. Fails
    /// without touching the buffer if the range is invalid or `value` does not fit.
    pub fn write_bits(
        &mut self,
        bit_offset: usize,
        bit_width: usize,
        value: u64,
    ) -> Result<(), SpanError> {
        check_range(self.data.len(), bit_offset, bit_width)?;

        if value & !low_mask(bit_width) != 0 {
            return Err(SpanError::ValueTooLarge { value, bit_width });
        }

        let window = Window::new(bit_offset, bit_width);
        let bytes = &mut self.data[window.start..window.end];

        let current = bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128);
        let mask = (low_mask(bit_width) as u128) << window.shift;
        let mut updated = (current & !mask) | ((value as u128) << window.shift);

        log::trace!(
            "write_bits offset={} width={} bytes={}..{} shift={} old={:#x} new={:#x}",
            bit_offset,
            bit_width,
            window.start,
            window.end,
            window.shift,
            current,
            updated
        );

        for byte in bytes.iter_mut().rev() {
            *byte = (updated & 0xff) as u8;
            updated >>= 8;
        }

        Ok(())
    }

    /// Sets or clears the single bit at `bit_offset`.
    pub fn write_bit(&mut self, bit_offset: usize, bit: bool) -> Result<(), SpanError> {
        self.write_bits(bit_offset, 1, bit as u64)
    }

    /// See [BitSpan::read_bytes].
    pub fn read_bytes(&self, bit_offset: usize, bit_width: usize) -> Result<Vec<u8>, SpanError> {
        self.as_span().read_bytes(bit_offset, bit_width)
    }

    /// Writes the first `bit_width` bits of `bytes`, MSB-first, at `bit_offset`.
    ///
    /// A partial last byte contributes its high bits. Missing bytes are written as
    /// zeros. Nothing is written unless the whole range fits in the buffer.
    pub fn write_bytes(
        &mut self,
        bit_offset: usize,
        bit_width: usize,
        bytes: &[u8],
    ) -> Result<(), SpanError> {
        check_long_range(self.data.len(), bit_offset, bit_width)?;

        for (i, chunk) in byte_chunks(bit_offset, bit_width).enumerate() {
            let byte = bytes.get(i).copied().unwrap_or(0);
            let bits = (byte >> (8 - chunk.bit_width)) as u64;
            self.write_bits(chunk.bit_offset, chunk.bit_width, bits)?;
        }

        Ok(())
    }
}

impl<'a> From<&'a mut [u8]> for BitSpanMut<'a> {
    fn from(data: &'a mut [u8]) -> Self {
        BitSpanMut::new(data)
    }
}

/// Byte range touched by a bit range, and how far the field sits above bit 0 of it.
struct Window {
    start: usize,
    end: usize,
    shift: usize,
}

impl Window {
    fn new(bit_offset: usize, bit_width: usize) -> Self {
        let start = bit_offset / 8;
        let lead = bit_offset % 8;
        let touched = (lead + bit_width).div_ceil(8);

        Window {
            start,
            end: start + touched,
            shift: touched * 8 - (lead + bit_width),
        }
    }
}

/// One byte-sized piece of a longer bit range.
struct Chunk {
    bit_offset: usize,
    bit_width: usize,
}

fn byte_chunks(bit_offset: usize, bit_width: usize) -> impl Iterator<Item = Chunk> {
    (0..bit_width.div_ceil(8)).map(move |i| Chunk {
        bit_offset: bit_offset + 8 * i,
        bit_width: (bit_width - 8 * i).min(8),
    })
}

/// Like [check_range] without the 64-bit width limit.
fn check_long_range(
    len_bytes: usize,
    bit_offset: usize,
    bit_width: usize,
) -> Result<(), SpanError> {
    let len_bits = len_bytes * 8;
    let in_range = bit_width > 0
        && bit_offset
            .checked_add(bit_width)
            .is_some_and(|end| end <= len_bits);

    if in_range {
        Ok(())
    } else {
        Err(SpanError::OutOfRange {
            bit_offset,
            bit_width,
            len_bits,
        })
    }
}

fn check_range(len_bytes: usize, bit_offset: usize, bit_width: usize) -> Result<(), SpanError> {
    let len_bits = len_bytes * 8;
    let in_range = (1..=MAX_BITS).contains(&bit_width)
        && bit_offset
            .checked_add(bit_width)
            .is_some_and(|end| end <= len_bits);

    if in_range {
        Ok(())
    } else {
        Err(SpanError::OutOfRange {
            bit_offset,
            bit_width,
            len_bits,
        })
    }
}

fn read_window(data: &[u8], bit_offset: usize, bit_width: usize) -> Result<u64, SpanError> {
    check_range(data.len(), bit_offset, bit_width)?;

    let window = Window::new(bit_offset, bit_width);
    let bytes = &data[window.start..window.end];
    let acc = bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128);
    let value = ((acc >> window.shift) as u64) & low_mask(bit_width);

    log::trace!(
        "read_bits offset={} width={} bytes={:?} shift={} value={:#x}",
        bit_offset,
        bit_width,
        bytes,
        window.shift,
        value
    );

    Ok(value)
}

/// Mask with the low `n` bits set (`n` in 0..=64).
pub fn low_mask(n: usize) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
///
/// Zero bits yield 0; 64 or more bits reinterpret `value` unchanged.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    match bits {
        0 => 0,
        1..=63 => {
            let shift = 64 - bits;
            ((value << shift) as i64) >> shift
        }
        _ => value as i64,
    }
}

/// Reverses the low `n` bits of `x` (LSB becomes MSB of the result).
pub fn reverse_bits_n(x: u64, n: usize) -> u64 {
    match n {
        0 => 0,
        1..=63 => (x & low_mask(n)).reverse_bits() >> (64 - n),
        _ => x.reverse_bits(),
    }
}

/// Reverses the first `bit_width` bits of `bytes`, read MSB-first.
///
/// The result holds `bit_width` bits left-aligned; missing input bytes count as zeros.
pub fn reverse_bit_string(bytes: &[u8], bit_width: usize) -> Vec<u8> {
    let mut out = vec![0u8; bit_width.div_ceil(8)];

    for i in 0..bit_width {
        let src = bit_width - 1 - i;
        let set = bytes
            .get(src / 8)
            .is_some_and(|byte| (byte >> (7 - src % 8)) & 1 == 1);
        if set {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }

    out
}

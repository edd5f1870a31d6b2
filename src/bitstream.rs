//! Ordered-bit cursors over byte buffers
//!
//! Serial payloads are sequences of variable-width fields packed MSB-first.
//! `BitReader` consumes fields front-to-back; `BitWriter` builds the payload by
//! prepending fields onto a preserved tail, because the wire format writes fields
//! in reverse order on top of whatever trailing bits the decoder left untouched.

use crate::error::{Result, SerialError};
use serde::{Deserialize, Serialize};

/// Trailing bits left unconsumed after the last full-width field read.
///
/// Carried opaquely on a decoded item so that re-encoding reproduces the
/// original byte stream bit-for-bit, including data the decoder did not
/// interpret. Bits are packed MSB-first; unused low bits of the final byte are
/// always zero so that equality is bit-exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitTail {
    bytes: Vec<u8>,
    len: usize,
}

impl BitTail {
    /// Empty tail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tail from packed bytes and a bit length.
    ///
    /// `len` may be shorter than `bytes.len() * 8`; excess bytes are dropped and
    /// pad bits in the final byte are cleared.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let byte_len = len.div_ceil(8);
        let mut bytes = bytes[..byte_len.min(bytes.len())].to_vec();
        bytes.resize(byte_len, 0);
        if len % 8 != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFFu8 << (8 - len % 8);
            }
        }
        BitTail { bytes, len }
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed representation, MSB-first, zero-padded to a byte boundary.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn bit(&self, index: usize) -> bool {
        (self.bytes[index / 8] >> (7 - index % 8)) & 1 == 1
    }
}

/// Sequential MSB-first bit reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, pos: 0 }
    }

    /// Bits consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bits left in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Consume the next `n` bits and return them as the low bits of a `u64`.
    ///
    /// Field widths come from external catalog data, so a width the buffer
    /// cannot satisfy is reported as `OutOfData` rather than panicking.
    pub fn read_bits(&mut self, n: usize) -> Result<u64> {
        if n > 64 || n > self.remaining() {
            return Err(SerialError::OutOfData {
                requested: n,
                available: self.remaining(),
            });
        }
        let mut value = 0u64;
        for _ in 0..n {
            let bit = (self.data[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u64::from(bit);
            self.pos += 1;
        }
        Ok(value)
    }

    /// Capture everything from the cursor to the end of the buffer.
    ///
    /// The result is restorable bit-for-bit by seeding a `BitWriter` with it.
    pub fn tail(&self) -> BitTail {
        let len = self.remaining();
        let mut bytes = vec![0u8; len.div_ceil(8)];
        for i in 0..len {
            let src = self.pos + i;
            if (self.data[src / 8] >> (7 - src % 8)) & 1 == 1 {
                bytes[i / 8] |= 1 << (7 - i % 8);
            }
        }
        BitTail { bytes, len }
    }
}

/// Bit writer that assembles a payload by prepending fields.
///
/// Seed it with the decoder's captured tail, prepend fields in reverse wire
/// order, and `finalize` yields bytes that read back in decode order with the
/// tail in its original position.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a preserved tail; fields are prepended in front of it.
    pub fn with_tail(tail: &BitTail) -> Self {
        BitWriter {
            bits: (0..tail.len()).map(|i| tail.bit(i)).collect(),
        }
    }

    /// Current length in bits.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Prepend the low `width` bits of `value`, MSB-first.
    pub fn prepend(&mut self, value: u64, width: usize) -> Result<()> {
        if width < 64 && value >> width != 0 {
            return Err(SerialError::ValueTooWide { value, width });
        }
        self.bits
            .splice(0..0, (0..width).rev().map(|i| (value >> i) & 1 == 1));
        Ok(())
    }

    /// Pack into bytes, padding the final partial byte with zero bits.
    pub fn finalize(self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.bits.len().div_ceil(8)];
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                bytes[i / 8] |= 1 << (7 - i % 8);
            }
        }
        bytes
    }
}

//! Bit-level accumulation for fixed-width LZW codes.
//!
//! Compressed bytes arrive one at a time (possibly split across many calls)
//! and are appended to a small pending-bits buffer. Codes are taken off the
//! low end of that buffer.
//!
//! # Bit Ordering
//!
//! Both Unix `compress` and ZIP Shrink pack codes LSB-first: the first code
//! occupies the least significant bits of the first byte, continuing into
//! the low bits of the following byte.
//!
//! # Example
//!
//! ```
//! use unlzw_core::bitstream::BitAccumulator;
//!
//! // 9-bit code 0x141 followed by the start of the next code
//! let mut acc = BitAccumulator::new();
//! acc.add_byte(0x41);
//! acc.add_byte(0x03);
//! assert!(acc.bits_available() >= 9);
//! assert_eq!(acc.take_code(9), 0x141);
//! assert_eq!(acc.bits_available(), 7);
//! ```

/// Widest code the accumulator hands out.
pub const MAX_CODE_BITS: u8 = 16;

/// LSB-first pending-bits buffer.
///
/// The caller feeds whole bytes and must only ask for a code once
/// [`bits_available`](Self::bits_available) covers it. Because a byte is only
/// added while fewer than [`MAX_CODE_BITS`] bits are pending, the buffer never
/// holds more than 23 bits.
#[derive(Debug, Clone, Default)]
pub struct BitAccumulator {
    /// Pending bits, oldest in the LSB position.
    buffer: u32,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
}

impl BitAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a byte's worth of bits above the ones already pending.
    #[inline]
    pub fn add_byte(&mut self, byte: u8) {
        debug_assert!(self.bits_in_buffer <= 24);
        self.buffer |= u32::from(byte) << self.bits_in_buffer;
        self.bits_in_buffer += 8;
    }

    /// Remove and return the lowest `nbits` pending bits.
    ///
    /// Callers check [`bits_available`](Self::bits_available) first; asking for
    /// more bits than are pending is a logic error.
    #[inline]
    pub fn take_code(&mut self, nbits: u8) -> u16 {
        debug_assert!(nbits <= MAX_CODE_BITS);
        debug_assert!(nbits <= self.bits_in_buffer);

        let mask = (1u32 << nbits).wrapping_sub(1);
        let code = (self.buffer & mask) as u16;

        self.buffer >>= nbits;
        self.bits_in_buffer = self.bits_in_buffer.saturating_sub(nbits);

        code
    }

    /// Number of bits currently pending.
    #[inline]
    pub fn bits_available(&self) -> u8 {
        self.bits_in_buffer
    }

    /// Discard all pending bits.
    pub fn clear(&mut self) {
        self.buffer = 0;
        self.bits_in_buffer = 0;
    }
}

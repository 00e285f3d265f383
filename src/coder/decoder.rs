//! The arithmetic decoder: component C.

use log::trace;

use crate::bitstream::BitVec;
use crate::decoder_error::DecoderError;
use crate::table::{Table, PROBABILITY_SCALE};

use super::{narrow_range, renorm_case, RenormCase, HIGH_INIT, LOW_INIT};

/// Decodes class bases from a symbol-bit stream against a [`Table`].
///
/// Yields only the class base (`E.v_min`) for each decoded symbol; callers
/// pair this with the offset stream to reconstruct the full symbol. See
/// [`crate::decode`] for the convenience entry point that does this pairing.
#[derive(Debug)]
pub(crate) struct ArithmeticDecoder<'a> {
    table: &'a Table,
    low: u16,
    high: u16,
    value: u16,
    bits: &'a BitVec,
    cursor: usize,
}

impl<'a> ArithmeticDecoder<'a> {
    pub(crate) fn new(table: &'a Table, bits: &'a BitVec) -> Result<Self, DecoderError> {
        trace!(
            "arithmetic decoder: {} classes, {}-bit alphabet",
            table.len(),
            table.alphabet_bits()
        );
        if bits.is_empty() {
            return Err(DecoderError::ShortStream);
        }
        // Finalization always emits at least one bit for a non-empty symbol
        // sequence, but never guarantees 16: short or low-entropy inputs
        // legitimately produce fewer. Bits past the physical end are read as
        // 0, the same implicit-trailing-zero convention `next_bit` uses.
        let mut value: u16 = 0;
        let mut cursor = 0;
        for _ in 0..16 {
            value = (value << 1) | u16::from(bits.get(cursor).unwrap_or(0));
            cursor += 1;
        }
        Ok(Self {
            table,
            low: LOW_INIT,
            high: HIGH_INIT,
            value,
            bits,
            cursor,
        })
    }

    fn next_bit(&mut self) -> u8 {
        let bit = self.bits.get(self.cursor).unwrap_or(0);
        self.cursor += 1;
        bit
    }

    /// Decodes the next symbol's class base.
    pub(crate) fn decode_class_base(&mut self) -> Result<u32, DecoderError> {
        let range = u64::from(self.high) - u64::from(self.low) + 1;
        // `value` comes straight off the bitstream: a corrupt stream or a
        // table mismatch can put it below `low`, which must surface as a
        // lookup failure rather than underflow this subtraction.
        let offset = self
            .value
            .checked_sub(self.low)
            .ok_or(DecoderError::RangeLookupFailed(u32::from(self.value)))?;
        let numerator = (u64::from(offset) + 1) * u64::from(PROBABILITY_SCALE) - 1;
        let scaled_value = (numerator / range) as u32;

        let class_index = self.table.class_of_scaled_value(scaled_value)?;
        let class = self.table.entry(class_index);

        let (new_low, new_high) = narrow_range(
            self.low,
            self.high,
            u32::from(class.t_low),
            u32::from(class.t_high),
            PROBABILITY_SCALE,
        );
        self.low = new_low;
        self.high = new_high;

        self.renormalize();
        Ok(class.v_min)
    }

    fn renormalize(&mut self) {
        loop {
            match renorm_case(self.low, self.high) {
                RenormCase::MsbAgreeZero | RenormCase::MsbAgreeOne => {
                    self.low <<= 1;
                    self.high = (self.high << 1) | 1;
                    self.value = (self.value << 1) | u16::from(self.next_bit());
                }
                RenormCase::Underflow => {
                    self.low = (self.low << 1) & 0x7FFF;
                    self.high = ((self.high << 1) & 0xFFFF) | 0x8001;
                    let shifted = (self.value << 1) | u16::from(self.next_bit());
                    self.value = shifted ^ 0x8000;
                }
                RenormCase::Settled => break,
            }
        }
    }
}

//! The arithmetic encoder: component B.

use log::{trace, warn};

use crate::bitstream::BitVec;
use crate::encoder_error::EncoderError;
use crate::table::{Table, PROBABILITY_SCALE};

use super::{narrow_range, renorm_case, RenormCase, HIGH_INIT, LOW_INIT};

/// Encodes a sequence of symbols against a [`Table`] into a symbol-bit
/// stream plus a paired offset stream.
///
/// One instance encodes exactly one stream; it carries no state useful
/// across calls and is not meant to be reused.
pub(crate) struct ArithmeticEncoder<'a> {
    table: &'a Table,
    low: u16,
    high: u16,
    ubc: u32,
    symbol_bits: BitVec,
    offset_bits: Vec<u32>,
    offset_lengths: Vec<u8>,
    symbols_seen: usize,
}

impl<'a> ArithmeticEncoder<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        trace!(
            "arithmetic encoder: {} classes, {}-bit alphabet",
            table.len(),
            table.alphabet_bits()
        );
        Self {
            table,
            low: LOW_INIT,
            high: HIGH_INIT,
            ubc: 0,
            symbol_bits: BitVec::new(),
            offset_bits: Vec::new(),
            offset_lengths: Vec::new(),
            symbols_seen: 0,
        }
    }

    /// Encodes one symbol, updating the range and emitting renormalization
    /// bits and the symbol's residual offset.
    pub(crate) fn encode_symbol(&mut self, symbol: u8) -> Result<(), EncoderError> {
        let symbol = u32::from(symbol);
        let class_index = self.table.class_of_symbol(symbol).map_err(|error| {
            warn!("encoder: symbol {symbol} is out of range");
            EncoderError::from(error)
        })?;
        let class = self.table.entry(class_index);

        let offset = symbol - class.v_min;
        let required_bits = 32 - offset.leading_zeros();
        if required_bits > u32::from(class.offset_length) {
            warn!(
                "encoder: symbol {symbol} needs {required_bits} offset bits but class {class_index} only reserves {}",
                class.offset_length
            );
            return Err(EncoderError::OffsetTooLarge {
                symbol,
                required_bits,
                offset_length: class.offset_length,
            });
        }
        self.offset_bits.push(offset);
        self.offset_lengths.push(class.offset_length);

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
        self.symbols_seen += 1;
        Ok(())
    }

    fn renormalize(&mut self) {
        loop {
            match renorm_case(self.low, self.high) {
                RenormCase::MsbAgreeZero => {
                    self.emit_with_pending(0);
                    self.low <<= 1;
                    self.high = (self.high << 1) | 1;
                }
                RenormCase::MsbAgreeOne => {
                    self.emit_with_pending(1);
                    self.low <<= 1;
                    self.high = (self.high << 1) | 1;
                }
                RenormCase::Underflow => {
                    self.ubc += 1;
                    self.low = (self.low << 1) & 0x7FFF;
                    self.high = ((self.high << 1) & 0xFFFF) | 0x8001;
                }
                RenormCase::Settled => break,
            }
        }
    }

    fn emit_with_pending(&mut self, bit: u8) {
        self.symbol_bits.push(bit);
        let pending = 1 - bit;
        for _ in 0..self.ubc {
            self.symbol_bits.push(pending);
        }
        self.ubc = 0;
    }

    /// Flushes the final disambiguating bits. Must be called exactly once,
    /// after the last call to [`Self::encode_symbol`].
    fn finalize(&mut self) {
        self.ubc += 1;
        if self.low < 0x4000 {
            self.emit_with_pending(0);
        } else {
            self.emit_with_pending(1);
        }
    }

    pub(crate) fn finish(mut self) -> (BitVec, Vec<u32>, Vec<u8>) {
        if self.symbols_seen > 0 {
            self.finalize();
        }
        (self.symbol_bits, self.offset_bits, self.offset_lengths)
    }
}

//! The public encoding entry point.

use crate::bitstream::BitVec;
use crate::coder::ArithmeticEncoder;
use crate::encoder_error::EncoderError;
use crate::table::Table;

/// Encodes `symbols` against `table`, returning the symbol-bit stream and
/// the paired offset streams.
///
/// The three streams must be kept together and passed to [`crate::decode`]
/// with the same `table` and `symbols.len()` to reconstruct the input.
pub fn encode(
    symbols: &[u8],
    table: &Table,
) -> Result<(BitVec, Vec<u32>, Vec<u8>), EncoderError> {
    let mut encoder = ArithmeticEncoder::new(table);
    for &symbol in symbols {
        encoder.encode_symbol(symbol)?;
    }
    Ok(encoder.finish())
}

//! Encoder errors.

use crate::error::ModelError;

/// Errors thrown by the encoder.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EncoderError {
    /// The symbol is not covered by the table.
    SymbolOutOfRange(u32),
    /// The table's `OL` for the symbol's class is smaller than the offset
    /// actually requires. This is a corruption indicator: it should be
    /// unreachable for a table whose invariants hold.
    OffsetTooLarge {
        /// The symbol that produced the oversized offset.
        symbol: u32,
        /// The offset's required bit length.
        required_bits: u32,
        /// The class's declared offset length.
        offset_length: u8,
    },
}

impl From<ModelError> for EncoderError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::SymbolOutOfRange(symbol) => EncoderError::SymbolOutOfRange(symbol),
            ModelError::RangeLookupFailed(_) => {
                unreachable!("the encoder never performs a scaled-value lookup")
            }
        }
    }
}

impl std::fmt::Display for EncoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderError::SymbolOutOfRange(symbol) => {
                write!(f, "symbol {symbol} is not covered by the coding table")
            }
            EncoderError::OffsetTooLarge {
                symbol,
                required_bits,
                offset_length,
            } => write!(
                f,
                "offset for symbol {symbol} needs {required_bits} bits but the class only reserves {offset_length}"
            ),
        }
    }
}

impl std::error::Error for EncoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

//! Decoder errors.

use crate::error::ModelError;

/// Errors thrown by the decoder.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecoderError {
    /// The symbol-bit stream was empty, so no initial decoder state could be
    /// seeded at all. A non-empty stream shorter than 16 bits is read with
    /// implicit trailing zero bits instead of rejected.
    ShortStream,
    /// The decoder could not resolve a class for the current state: indicates
    /// a bitstream/table mismatch. The payload is a scaled value in
    /// `[0, 1024)` when one was computed, or the raw decoder register when
    /// the mismatch was caught earlier, before scaling was possible.
    RangeLookupFailed(u32),
    /// `offset_bits` did not carry exactly one entry per requested symbol.
    OffsetStreamLengthMismatch {
        /// Number of symbols requested.
        expected: usize,
        /// Number of offsets actually supplied.
        actual: usize,
    },
}

impl From<ModelError> for DecoderError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::RangeLookupFailed(scaled_value) => {
                DecoderError::RangeLookupFailed(scaled_value)
            }
            ModelError::SymbolOutOfRange(_) => {
                unreachable!("the decoder never performs a symbol lookup")
            }
        }
    }
}

impl std::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderError::ShortStream => {
                write!(f, "symbol-bit stream is empty, nothing to decode")
            }
            DecoderError::RangeLookupFailed(value) => {
                write!(f, "value {value} does not match any class in the table")
            }
            DecoderError::OffsetStreamLengthMismatch { expected, actual } => write!(
                f,
                "offset stream has {actual} entries but {expected} symbols were requested"
            ),
        }
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

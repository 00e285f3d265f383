//! Stream artifact bookkeeping: component F.
//!
//! A [`StreamArtifact`] is the unit callers persist or compare across
//! layers and models. It owns one `encode` call's output streams plus the
//! naming and accounting needed to tell streams apart and measure how well
//! each compressed.

use crate::bitstream::BitVec;

/// One encoded stream, named and measured.
#[derive(Debug, Clone)]
pub struct StreamArtifact {
    /// Name of the model the stream was extracted from.
    pub model_name: String,
    /// Layer identifier within the model.
    pub layer: String,
    /// What the stream holds (e.g. "weights", "activations").
    pub kind: String,
    /// Range-coded class-index bits.
    pub symbol_bits: BitVec,
    /// Residual in-class offsets, one per symbol.
    pub offset_bits: Vec<u32>,
    /// Bit width of each offset, one per symbol.
    pub offset_lengths: Vec<u8>,
    /// Number of symbols in the original, uncompressed stream.
    pub original_len: usize,
}

impl StreamArtifact {
    /// Names and wraps the three streams an `encode` call produced.
    pub fn new(
        model_name: impl Into<String>,
        layer: impl Into<String>,
        kind: impl Into<String>,
        symbol_bits: BitVec,
        offset_bits: Vec<u32>,
        offset_lengths: Vec<u8>,
        original_len: usize,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            layer: layer.into(),
            kind: kind.into(),
            symbol_bits,
            offset_bits,
            offset_lengths,
            original_len,
        }
    }

    /// Total compressed size: symbol bits plus every offset's bit width.
    pub fn compressed_bits(&self) -> u64 {
        self.symbol_bits.len() as u64
            + self
                .offset_lengths
                .iter()
                .map(|&len| u64::from(len))
                .sum::<u64>()
    }

    /// Compression ratio against the original stream, assuming one byte per
    /// symbol. Returns `0.0` for an empty compressed stream.
    pub fn ratio(&self) -> f64 {
        let compressed = self.compressed_bits();
        if compressed == 0 {
            return 0.0;
        }
        (8 * self.original_len as u64) as f64 / compressed as f64
    }
}

//! The public decoding entry point.

use crate::bitstream::BitVec;
use crate::coder::ArithmeticDecoder;
use crate::decoder_error::DecoderError;
use crate::table::Table;

/// Decodes `n` symbols from `symbol_bits`/`offset_bits`/`offset_lengths`
/// against `table`, reconstructing the original sequence produced by
/// [`crate::encode`].
///
/// `n` must be the exact number of symbols originally encoded; decoding is
/// length-driven and has no end-of-stream marker of its own.
pub fn decode(
    symbol_bits: &BitVec,
    offset_bits: &[u32],
    _offset_lengths: &[u8],
    table: &Table,
    n: usize,
) -> Result<Vec<u8>, DecoderError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    if offset_bits.len() != n {
        return Err(DecoderError::OffsetStreamLengthMismatch {
            expected: n,
            actual: offset_bits.len(),
        });
    }

    let mut decoder = ArithmeticDecoder::new(table, symbol_bits)?;
    let mut symbols = Vec::with_capacity(n);
    for &offset in offset_bits {
        let class_base = decoder.decode_class_base()?;
        symbols.push((class_base + offset) as u8);
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::optimizer::{optimize_table, OptimizerConfig};
    use crate::table::ClassEntry;

    fn two_class_table() -> Table {
        let classes = vec![
            ClassEntry {
                v_min: 0,
                v_max: 127,
                offset_length: 7,
                t_low: 0,
                t_high: 512,
            },
            ClassEntry {
                v_min: 128,
                v_max: 255,
                offset_length: 7,
                t_low: 512,
                t_high: 1024,
            },
        ];
        Table::from_validated(8, classes)
    }

    #[test]
    fn n_zero_returns_empty_without_touching_the_stream() {
        let table = two_class_table();
        let symbol_bits = BitVec::new();
        let result = decode(&symbol_bits, &[], &[], &table, 0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn rejects_an_offset_stream_shorter_than_n() {
        let table = two_class_table();
        let (symbol_bits, offset_bits, offset_lengths) = encode(&[3, 200, 1], &table).unwrap();
        let err = decode(&symbol_bits, &offset_bits[..1], &offset_lengths, &table, 3).unwrap_err();
        assert_eq!(
            err,
            DecoderError::OffsetStreamLengthMismatch {
                expected: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn round_trips_the_smallest_example() {
        let mut histogram = vec![0u64; 256];
        for v in 0..4u8 {
            histogram[v as usize] = 1;
        }
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        let input = vec![0u8, 1, 2, 3];
        let (symbol_bits, offset_bits, offset_lengths) = encode(&input, &table).unwrap();
        let output = decode(&symbol_bits, &offset_bits, &offset_lengths, &table, input.len())
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn round_trips_a_single_symbol() {
        let table = two_class_table();
        let (symbol_bits, offset_bits, offset_lengths) = encode(&[200], &table).unwrap();
        let output = decode(&symbol_bits, &offset_bits, &offset_lengths, &table, 1).unwrap();
        assert_eq!(output, vec![200]);
    }

    #[test]
    fn round_trips_a_full_ramp() {
        let table = two_class_table();
        let input: Vec<u8> = (0..=255u8).collect();
        let (symbol_bits, offset_bits, offset_lengths) = encode(&input, &table).unwrap();
        let output = decode(
            &symbol_bits,
            &offset_bits,
            &offset_lengths,
            &table,
            input.len(),
        )
        .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn uniform_input_yields_close_to_one_to_one_compression() {
        let histogram = vec![1u64; 256];
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        let input: Vec<u8> = (0..=255u8).collect();
        let (symbol_bits, offset_bits, offset_lengths) = encode(&input, &table).unwrap();
        let output = decode(
            &symbol_bits,
            &offset_bits,
            &offset_lengths,
            &table,
            input.len(),
        )
        .unwrap();
        assert_eq!(output, input);

        let artifact = crate::artifact::StreamArtifact::new(
            "m",
            "l",
            "weights",
            symbol_bits,
            offset_bits,
            offset_lengths,
            input.len(),
        );
        assert!(
            artifact.ratio() > 0.9,
            "uniform input should compress close to 1:1, got {}",
            artifact.ratio()
        );
    }

    #[test]
    fn round_trips_pseudo_random_data_deterministically() {
        use nanorand::RNG;

        let mut histogram = vec![1u64; 256];
        for (i, count) in histogram.iter_mut().enumerate() {
            *count += (i as u64 * 13) % 37;
        }
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();

        let mut rng = nanorand::WyRand::new_seed(42);
        let input: Vec<u8> = (0..10_000)
            .map(|_| rng.generate_range::<u32>(0, 256) as u8)
            .collect();

        let (bits_a, offsets_a, lengths_a) = encode(&input, &table).unwrap();
        let (bits_b, offsets_b, lengths_b) = encode(&input, &table).unwrap();
        assert_eq!(bits_a, bits_b);
        assert_eq!(offsets_a, offsets_b);
        assert_eq!(lengths_a, lengths_b);

        let output = decode(&bits_a, &offsets_a, &lengths_a, &table, input.len()).unwrap();
        assert_eq!(output, input);
    }
}

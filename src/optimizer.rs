//! The probability-table optimizer: component D.
//!
//! Given an empirical histogram over the symbol alphabet, derives a coding
//! table that minimizes the total encoded bit length (offset bits plus the
//! quantized entropy of the class distribution) via bounded-depth
//! hill-climbing neighbor search.

use log::{debug, trace};

use crate::optimizer_error::OptimizerError;
use crate::table::{ClassEntry, Table, PROBABILITY_SCALE};

/// Tunables for [`optimize_table`]. The default matches the constants the
/// reference search hardcoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    /// Alphabet width B: symbols range over `[0, 2^alphabet_bits)`.
    pub alphabet_bits: u8,
    /// Number of classes P the table is partitioned into.
    pub classes: u32,
    /// Recursion depth ceiling for the neighbor search.
    pub depth_max: u32,
    /// The outer loop stops once `new_best / prev_best` exceeds this ratio.
    pub convergence_ratio: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            alphabet_bits: 8,
            classes: 16,
            depth_max: 2,
            convergence_ratio: 0.99,
        }
    }
}

/// Derives a coding table from `histogram` (length `2^alphabet_bits`)
/// minimizing the estimated encoded size.
pub fn optimize_table(
    histogram: &[u64],
    config: OptimizerConfig,
) -> Result<Table, OptimizerError> {
    if histogram.iter().all(|&count| count == 0) {
        return Err(OptimizerError::EmptyInput);
    }

    let alphabet_size = 1u32 << config.alphabet_bits;
    if histogram.len() != alphabet_size as usize {
        return Err(OptimizerError::HistogramLengthMismatch {
            expected: alphabet_size,
            actual: histogram.len(),
        });
    }
    if config.classes == 0
        || config.classes > alphabet_size
        || config.classes > PROBABILITY_SCALE
    {
        return Err(OptimizerError::InvalidClassCount {
            classes: config.classes,
            alphabet_size,
        });
    }

    let classes = config.classes as usize;
    let mut best = initial_boundaries(alphabet_size, classes);

    loop {
        let prev_best = encoded_size(histogram, &best, classes);
        // `encoded_size` is never negative (offset bits are non-negative,
        // entropy is non-positive); 0 is the global minimum, so a table
        // already scoring 0 cannot improve further and the ratio below
        // would otherwise divide 0.0/0.0 into NaN.
        if prev_best <= 0.0 {
            break;
        }
        let mut trial = best.clone();
        let mut best_score = prev_best;
        search_try(
            histogram,
            &mut trial,
            &mut best_score,
            &mut best,
            config.depth_max,
            -2,
            classes,
            config.depth_max,
        );
        let ratio = best_score / prev_best;
        debug!("optimizer: iteration score {best_score:.3} (previous {prev_best:.3}, ratio {ratio:.4})");
        if ratio > config.convergence_ratio {
            break;
        }
    }

    Ok(build_table(histogram, &best, classes, config.alphabet_bits))
}

fn initial_boundaries(alphabet_size: u32, classes: usize) -> Vec<u32> {
    let step = alphabet_size / classes as u32;
    let mut boundaries: Vec<u32> = (0..classes as u32).map(|i| i * step).collect();
    boundaries.push(alphabet_size);
    boundaries
}

fn offset_length_for_span(span: u32) -> u8 {
    if span <= 1 {
        0
    } else {
        (32 - (span - 1).leading_zeros()) as u8
    }
}

fn class_counts(histogram: &[u64], boundaries: &[u32], classes: usize) -> Vec<u64> {
    (0..classes)
        .map(|i| {
            let lo = boundaries[i] as usize;
            let hi = boundaries[i + 1] as usize;
            histogram[lo..hi].iter().sum()
        })
        .collect()
}

fn quantized_log2(p: f64) -> f64 {
    let scaled = (p * f64::from(PROBABILITY_SCALE)).round() / f64::from(PROBABILITY_SCALE);
    if scaled <= 0.0 {
        0.0
    } else {
        scaled.log2()
    }
}

/// Offset bits plus quantized entropy, the score the search minimizes.
fn encoded_size(histogram: &[u64], boundaries: &[u32], classes: usize) -> f64 {
    let counts = class_counts(histogram, boundaries, classes);
    let total: u64 = counts.iter().sum();

    let mut offset_total = 0f64;
    for i in 0..classes {
        let span = boundaries[i + 1] - boundaries[i];
        offset_total += counts[i] as f64 * f64::from(offset_length_for_span(span));
    }

    let mut entropy_total = 0f64;
    for &count in &counts {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total as f64;
        entropy_total += count as f64 * quantized_log2(p);
    }

    offset_total - entropy_total
}

/// Recursive neighbor search over interior boundaries. Mutates `trial` in
/// place as it sweeps; improvements are copied into `best`.
///
/// The top-level call is entered with `depth == depth_max`, so the
/// `depth < depth_max` branch below never recurses from that entry point:
/// one flat sweep runs per outer iteration. This mirrors the reference
/// search exactly rather than a corrected, always-recursive variant.
fn search_try(
    histogram: &[u64],
    trial: &mut Vec<u32>,
    best_score: &mut f64,
    best: &mut Vec<u32>,
    depth: u32,
    around: i64,
    classes: usize,
    depth_max: u32,
) {
    for c in 1..classes {
        if around >= 0 && (c as i64 - around).abs() != 1 {
            continue;
        }
        while trial[c] > trial[c - 1] {
            trial[c] -= 1;
            consider(histogram, trial, best_score, best, depth, c, classes, depth_max);
        }
        while trial[c] < trial[c + 1] {
            trial[c] += 1;
            consider(histogram, trial, best_score, best, depth, c, classes, depth_max);
        }
    }
}

fn consider(
    histogram: &[u64],
    trial: &mut Vec<u32>,
    best_score: &mut f64,
    best: &mut Vec<u32>,
    depth: u32,
    moved: usize,
    classes: usize,
    depth_max: u32,
) {
    if depth < depth_max {
        search_try(
            histogram,
            trial,
            best_score,
            best,
            depth + 1,
            moved as i64,
            classes,
            depth_max,
        );
    } else {
        let score = encoded_size(histogram, trial, classes);
        if score < *best_score {
            *best = trial.clone();
            *best_score = score;
            trace!("optimizer: accepted candidate with score {score:.3}");
        }
    }
}

/// Distributes `scale` units of probability mass across `classes` in
/// proportion to `counts`, guaranteeing every class a width of at least 1
/// and the total exactly equal to `scale` (the largest-remainder method).
fn quantize_widths(counts: &[u64], total: u64, classes: usize, scale: u64) -> Vec<u16> {
    let reserved = classes as u64;
    let distributable = scale - reserved;

    let mut width = vec![1u64; classes];
    let mut remainders = Vec::with_capacity(classes);
    let mut assigned = 0u64;
    for (i, &count) in counts.iter().enumerate() {
        let share = u128::from(count) * u128::from(distributable);
        let floor = (share / u128::from(total)) as u64;
        width[i] += floor;
        assigned += floor;
        remainders.push((share % u128::from(total), i));
    }
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    for &(_, i) in remainders.iter().take((distributable - assigned) as usize) {
        width[i] += 1;
    }
    width.into_iter().map(|w| w as u16).collect()
}

fn build_table(histogram: &[u64], boundaries: &[u32], classes: usize, alphabet_bits: u8) -> Table {
    let counts = class_counts(histogram, boundaries, classes);
    let total: u64 = counts.iter().sum();
    let widths = quantize_widths(&counts, total, classes, u64::from(PROBABILITY_SCALE));

    let mut entries = Vec::with_capacity(classes);
    let mut t_low = 0u16;
    for i in 0..classes {
        let t_high = t_low + widths[i];
        let v_min = boundaries[i];
        let v_max = boundaries[i + 1] - 1;
        let offset_length = offset_length_for_span(boundaries[i + 1] - boundaries[i]);
        entries.push(ClassEntry {
            v_min,
            v_max,
            offset_length,
            t_low,
            t_high,
        });
        t_low = t_high;
    }

    Table::from_validated(alphabet_bits, entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_empty_histogram() {
        let histogram = vec![0u64; 256];
        let err = optimize_table(&histogram, OptimizerConfig::default()).unwrap_err();
        assert_eq!(err, OptimizerError::EmptyInput);
    }

    #[test]
    fn rejects_a_histogram_shorter_than_the_alphabet() {
        let histogram = vec![1u64; 4];
        let err = optimize_table(&histogram, OptimizerConfig::default()).unwrap_err();
        assert_eq!(
            err,
            OptimizerError::HistogramLengthMismatch {
                expected: 256,
                actual: 4,
            }
        );
    }

    #[test]
    fn rejects_zero_classes() {
        let histogram = vec![1u64; 256];
        let mut config = OptimizerConfig::default();
        config.classes = 0;
        let err = optimize_table(&histogram, config).unwrap_err();
        assert_eq!(
            err,
            OptimizerError::InvalidClassCount {
                classes: 0,
                alphabet_size: 256,
            }
        );
    }

    #[test]
    fn rejects_more_classes_than_the_alphabet_holds() {
        let histogram = vec![1u64; 256];
        let mut config = OptimizerConfig::default();
        config.classes = 257;
        let err = optimize_table(&histogram, config).unwrap_err();
        assert_eq!(
            err,
            OptimizerError::InvalidClassCount {
                classes: 257,
                alphabet_size: 256,
            }
        );
    }

    #[test]
    fn sparse_histogram_produces_a_valid_table() {
        let mut histogram = vec![0u64; 256];
        histogram[0] = 1;
        histogram[1] = 1;
        histogram[2] = 1;
        histogram[3] = 1;
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        assert_eq!(table.len(), 16);
        assert_eq!(table.alphabet_bits(), 8);
        let total_width: u32 = table
            .classes()
            .iter()
            .map(|c| u32::from(c.t_high - c.t_low))
            .sum();
        assert_eq!(total_width, PROBABILITY_SCALE);
    }

    #[test]
    fn uniform_histogram_yields_roughly_equal_widths() {
        let histogram = vec![1u64; 256];
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        for class in table.classes() {
            let width = class.t_high - class.t_low;
            assert!((60..=68).contains(&width), "width {width} far from 64");
        }
    }

    #[test]
    fn degenerate_histogram_concentrates_probability_in_one_class() {
        let mut histogram = vec![0u64; 256];
        histogram[42] = 1000;
        let table = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        let class_index = table.class_of_symbol(42).unwrap();
        let class = table.entry(class_index);
        assert!(class.t_high - class.t_low > 900);
    }

    #[test]
    fn optimize_table_is_deterministic() {
        let mut histogram = vec![0u64; 256];
        for (i, count) in histogram.iter_mut().enumerate() {
            *count = (i as u64 * 7 + 1) % 23;
        }
        let a = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        let b = optimize_table(&histogram, OptimizerConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}

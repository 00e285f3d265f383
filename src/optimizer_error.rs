//! Optimizer errors.

/// Errors thrown by [`crate::optimize_table`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OptimizerError {
    /// The histogram carried no mass at all (every count was zero).
    EmptyInput,
    /// `classes` was zero, or exceeded the alphabet size, so no valid
    /// partition into classes exists.
    InvalidClassCount {
        /// The requested number of classes.
        classes: u32,
        /// The alphabet size (`2^alphabet_bits`) classes partition.
        alphabet_size: u32,
    },
    /// The histogram's length does not match `2^alphabet_bits`.
    HistogramLengthMismatch {
        /// The alphabet size `config.alphabet_bits` implies.
        expected: u32,
        /// The histogram's actual length.
        actual: usize,
    },
}

impl std::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerError::EmptyInput => {
                write!(f, "histogram is empty (all counts are zero)")
            }
            OptimizerError::InvalidClassCount {
                classes,
                alphabet_size,
            } => write!(
                f,
                "cannot partition an alphabet of size {alphabet_size} into {classes} classes"
            ),
            OptimizerError::HistogramLengthMismatch { expected, actual } => write!(
                f,
                "histogram has {actual} entries but the alphabet needs {expected}"
            ),
        }
    }
}

impl std::error::Error for OptimizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

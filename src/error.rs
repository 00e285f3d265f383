//! Custom errors.

/// Errors thrown while querying a [`crate::table::Table`].
///
/// These are raised by the probability model itself and are re-exported
/// through both [`crate::EncoderError`] and [`crate::DecoderError`], since
/// both components consult the same table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ModelError {
    /// A symbol fell outside the table's alphabet coverage.
    SymbolOutOfRange(u32),
    /// A scaled value fell outside `[0, 1024)`.
    RangeLookupFailed(u32),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::SymbolOutOfRange(symbol) => {
                write!(f, "symbol {symbol} is not covered by the coding table")
            }
            ModelError::RangeLookupFailed(scaled_value) => {
                write!(
                    f,
                    "scaled value {scaled_value} does not fall inside any class"
                )
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

//! Implements the coding table (PCNT): the probability model queried by both
//! the encoder and the decoder.
//!
//! A table is an ordered partition of the symbol alphabet `[0, 2^bits)` into
//! classes, each carrying a fixed-width residual (`OL`) and a cumulative
//! probability range in 10-bit fixed point (`t_low`/`t_high`). The table is
//! immutable once built; [`crate::optimize_table`] is the only thing that
//! constructs one from scratch, while [`Table::from_csv`] reconstructs one
//! serialized earlier.

use crate::error::ModelError;

/// The fixed-point scale all cumulative probabilities are expressed in.
pub const PROBABILITY_SCALE: u32 = 1024;

/// One class of the coding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "csv", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassEntry {
    /// Inclusive lower symbol bound of the class.
    #[cfg_attr(feature = "csv", serde(rename = "v_min"))]
    pub v_min: u32,
    /// Inclusive upper symbol bound of the class.
    #[cfg_attr(feature = "csv", serde(rename = "v_max"))]
    pub v_max: u32,
    /// Number of raw bits needed to distinguish symbols within the class.
    #[cfg_attr(feature = "csv", serde(rename = "OL"))]
    pub offset_length: u8,
    /// Inclusive lower cumulative-probability bound, in units of `1/1024`.
    #[cfg_attr(feature = "csv", serde(rename = "t_low"))]
    pub t_low: u16,
    /// Exclusive upper cumulative-probability bound, in units of `1/1024`.
    #[cfg_attr(feature = "csv", serde(rename = "t_high"))]
    pub t_high: u16,
}

impl ClassEntry {
    /// The class's probability mass, informational only: `t_low`/`t_high`
    /// are the values the codec actually consults.
    pub fn probability(&self) -> f64 {
        f64::from(self.t_high - self.t_low) / f64::from(PROBABILITY_SCALE)
    }
}

/// A CSV row shape mirroring the interop format, carrying the informational
/// `p` column that [`ClassEntry`] otherwise derives on demand.
#[cfg(feature = "csv")]
#[derive(serde::Serialize, serde::Deserialize)]
struct CsvRow {
    v_min: u32,
    v_max: u32,
    #[serde(rename = "OL")]
    offset_length: u8,
    t_low: u16,
    t_high: u16,
    p: f64,
}

/// Errors raised only by the CSV interop path.
#[cfg(feature = "csv")]
#[derive(Debug)]
pub enum TableError {
    /// The underlying CSV reader/writer failed.
    Csv(csv_crate::Error),
    /// Flushing the CSV writer's underlying buffer failed.
    Io(std::io::Error),
    /// The parsed rows do not form a valid coding table.
    MalformedRow(String),
}

#[cfg(feature = "csv")]
impl From<csv_crate::Error> for TableError {
    fn from(error: csv_crate::Error) -> Self {
        TableError::Csv(error)
    }
}

#[cfg(feature = "csv")]
impl From<std::io::Error> for TableError {
    fn from(error: std::io::Error) -> Self {
        TableError::Io(error)
    }
}

#[cfg(feature = "csv")]
impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Csv(error) => write!(f, "CSV error: {error}"),
            TableError::Io(error) => write!(f, "CSV writer I/O error: {error}"),
            TableError::MalformedRow(message) => write!(f, "malformed table: {message}"),
        }
    }
}

#[cfg(feature = "csv")]
impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Csv(error) => Some(error),
            TableError::Io(error) => Some(error),
            TableError::MalformedRow(_) => None,
        }
    }
}

/// The coding table: an immutable partition of `[0, 2^bits)` into classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    alphabet_bits: u8,
    classes: Vec<ClassEntry>,
}

impl Table {
    /// Builds a table from its classes, validating every invariant named in
    /// the data model: strictly increasing `v_min`, full alphabet coverage,
    /// and a gap-free partition of `[0, 1024)`.
    ///
    /// This is the single choke point both the optimizer's final conversion
    /// and the CSV loader funnel through, so a table that exists at all is
    /// guaranteed well-formed.
    #[cfg(feature = "csv")]
    pub fn new(alphabet_bits: u8, classes: Vec<ClassEntry>) -> Result<Self, TableError> {
        Self::validate(alphabet_bits, &classes).map_err(TableError::MalformedRow)?;
        Ok(Self {
            alphabet_bits,
            classes,
        })
    }

    pub(crate) fn from_validated(alphabet_bits: u8, classes: Vec<ClassEntry>) -> Self {
        debug_assert!(Self::validate(alphabet_bits, &classes).is_ok());
        Self {
            alphabet_bits,
            classes,
        }
    }

    fn validate(alphabet_bits: u8, classes: &[ClassEntry]) -> Result<(), String> {
        if classes.is_empty() {
            return Err("table has no classes".into());
        }
        let alphabet_max = (1u64 << alphabet_bits) - 1;
        let mut expected_v_min = 0u32;
        let mut expected_t_low = 0u16;
        for (i, class) in classes.iter().enumerate() {
            if u64::from(class.v_min) != u64::from(expected_v_min) {
                return Err(format!(
                    "class {i} has v_min {} but expected {expected_v_min}",
                    class.v_min
                ));
            }
            if class.v_min > class.v_max {
                return Err(format!("class {i} has v_min > v_max"));
            }
            if class.t_low != expected_t_low || class.t_low >= class.t_high {
                return Err(format!("class {i} has an invalid t_low/t_high range"));
            }
            expected_t_low = class.t_high;
            expected_v_min = class.v_max + 1;
        }
        if u64::from(expected_v_min - 1) != alphabet_max {
            return Err(format!(
                "classes cover up to {} but the alphabet ends at {alphabet_max}",
                expected_v_min - 1
            ));
        }
        if expected_t_low != PROBABILITY_SCALE as u16 {
            return Err(format!(
                "classes cover up to t_high {expected_t_low} instead of {PROBABILITY_SCALE}"
            ));
        }
        Ok(())
    }

    /// The alphabet width `B` this table was built for.
    pub fn alphabet_bits(&self) -> u8 {
        self.alphabet_bits
    }

    /// The number of classes `P`.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether this table has no classes (never true for a validated table).
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All classes, in ascending `v_min` order.
    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    /// Returns class `i` by index.
    pub fn entry(&self, i: usize) -> &ClassEntry {
        &self.classes[i]
    }

    /// Returns the unique class whose `[v_min, v_max]` contains `s`.
    pub fn class_of_symbol(&self, s: u32) -> Result<usize, ModelError> {
        self.classes
            .iter()
            .position(|c| c.v_min <= s && s <= c.v_max)
            .ok_or(ModelError::SymbolOutOfRange(s))
    }

    /// Returns the unique class whose `[t_low, t_high)` contains `sv`.
    pub fn class_of_scaled_value(&self, sv: u32) -> Result<usize, ModelError> {
        if sv >= PROBABILITY_SCALE {
            return Err(ModelError::RangeLookupFailed(sv));
        }
        self.classes
            .iter()
            .position(|c| u32::from(c.t_low) <= sv && sv < u32::from(c.t_high))
            .ok_or(ModelError::RangeLookupFailed(sv))
    }

    /// Serializes the table to the interop CSV form: one row per class, with
    /// columns `v_min, v_max, OL, t_low, t_high, p`.
    #[cfg(feature = "csv")]
    pub fn to_csv(&self) -> Result<String, TableError> {
        let mut writer = csv_crate::Writer::from_writer(Vec::new());
        for class in &self.classes {
            writer.serialize(CsvRow {
                v_min: class.v_min,
                v_max: class.v_max,
                offset_length: class.offset_length,
                t_low: class.t_low,
                t_high: class.t_high,
                p: class.probability(),
            })?;
        }
        let bytes = writer.into_inner().map_err(|e| TableError::from(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| TableError::MalformedRow(format!("csv writer produced invalid utf8: {e}")))
    }

    /// Parses a table previously produced by [`Table::to_csv`].
    ///
    /// `alphabet_bits` must be supplied by the caller: the CSV form does not
    /// carry `B` explicitly (the sentinel row is implicit), matching the
    /// reference interop format.
    #[cfg(feature = "csv")]
    pub fn from_csv(csv: &str, alphabet_bits: u8) -> Result<Self, TableError> {
        let mut reader = csv_crate::Reader::from_reader(csv.as_bytes());
        let mut classes = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row?;
            classes.push(ClassEntry {
                v_min: row.v_min,
                v_max: row.v_max,
                offset_length: row.offset_length,
                t_low: row.t_low,
                t_high: row.t_high,
            });
        }
        Table::new(alphabet_bits, classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn class_of_symbol_finds_the_right_class() {
        let table = two_class_table();
        assert_eq!(table.class_of_symbol(0).unwrap(), 0);
        assert_eq!(table.class_of_symbol(127).unwrap(), 0);
        assert_eq!(table.class_of_symbol(128).unwrap(), 1);
        assert_eq!(table.class_of_symbol(255).unwrap(), 1);
    }

    #[test]
    fn class_of_symbol_rejects_out_of_range() {
        let table = two_class_table();
        assert_eq!(
            table.class_of_symbol(256),
            Err(ModelError::SymbolOutOfRange(256))
        );
    }

    #[test]
    fn class_of_scaled_value_finds_the_right_class() {
        let table = two_class_table();
        assert_eq!(table.class_of_scaled_value(0).unwrap(), 0);
        assert_eq!(table.class_of_scaled_value(511).unwrap(), 0);
        assert_eq!(table.class_of_scaled_value(512).unwrap(), 1);
        assert_eq!(table.class_of_scaled_value(1023).unwrap(), 1);
    }

    #[test]
    fn class_of_scaled_value_rejects_out_of_range() {
        let table = two_class_table();
        assert_eq!(
            table.class_of_scaled_value(1024),
            Err(ModelError::RangeLookupFailed(1024))
        );
    }

    #[cfg(feature = "csv")]
    #[test]
    fn csv_round_trip_preserves_classes() {
        let table = two_class_table();
        let csv = table.to_csv().unwrap();
        let reloaded = Table::from_csv(&csv, 8).unwrap();
        assert_eq!(reloaded.classes(), table.classes());
    }

    #[cfg(feature = "csv")]
    #[test]
    fn csv_round_trip_table_encodes_identically_to_the_original() {
        let table = two_class_table();
        let csv = table.to_csv().unwrap();
        let reloaded = Table::from_csv(&csv, 8).unwrap();

        let symbols: Vec<u8> = (0..=255u8).collect();
        let original_output = crate::encoder::encode(&symbols, &table).unwrap();
        let reloaded_output = crate::encoder::encode(&symbols, &reloaded).unwrap();
        assert_eq!(original_output, reloaded_output);
    }

    #[cfg(feature = "csv")]
    #[test]
    fn rejects_a_table_with_a_gap() {
        let classes = vec![
            ClassEntry {
                v_min: 0,
                v_max: 100,
                offset_length: 7,
                t_low: 0,
                t_high: 512,
            },
            ClassEntry {
                v_min: 200,
                v_max: 255,
                offset_length: 7,
                t_low: 512,
                t_high: 1024,
            },
        ];
        assert!(Table::new(8, classes).is_err());
    }
}

use thiserror::Error;

/// Failure while coercing raw cells into typed values.
///
/// Row indices are zero-based positions in the input sequence (header
/// excluded).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("column '{column}' is declared in the schema but missing from the header")]
    MissingColumn { column: String },
    #[error("sort column '{column}' is not declared as a number")]
    NonNumericSortColumn { column: String },
    #[error("row {row}: missing value for declared column '{column}'")]
    MissingField { row: usize, column: String },
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    NotANumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}, column '{column}': '{value}' does not match date format '{format}'")]
    BadDate {
        row: usize,
        column: String,
        value: String,
        format: String,
    },
}

/// Failure while assigning a group key to a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupingError {
    #[error("row {row}: no value for key column '{column}'")]
    MissingKey { row: usize, column: String },
    #[error("row {row}: value {value} in key column '{column}' is not an integral key")]
    NonIntegralKey {
        row: usize,
        column: String,
        value: f64,
    },
}

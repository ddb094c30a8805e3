use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by every tabml crate.
#[derive(Debug, Error)]
pub enum MlError {
    // ─── Load ───────────────────────────────────────────────────────────────
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record{}: {message}", line_suffix(.line))]
    Malformed { line: Option<u64>, message: String },

    #[error("Cannot parse {value:?} as {field} (line {line}, column {column})")]
    Parse {
        line: u64,
        column: usize,
        field: String,
        value: String,
    },

    // ─── Schema ─────────────────────────────────────────────────────────────
    #[error("Missing column '{column}' (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} rows, table has {expected}")]
    RowCount {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Feature vector width {found} does not match fitted width {expected}")]
    FeatureWidth { expected: usize, found: usize },

    // ─── Statistical ────────────────────────────────────────────────────────
    #[error("Cannot evaluate on an empty table")]
    EmptyTable,

    #[error("Label column has zero variance; R² is undefined")]
    ZeroVariance,

    #[error("Only one class present in labels; {0} is undefined")]
    SingleClass(&'static str),

    // ─── Prediction ─────────────────────────────────────────────────────────
    #[error("Input row is missing required field '{field}'")]
    MissingField { field: String },

    #[error("{0} used before fit()")]
    NotFitted(&'static str),

    // ─── Numeric ────────────────────────────────────────────────────────────
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Index out of bounds: index {index} for axis {axis} with size {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid axis: {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // ─── Configuration ──────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

fn line_suffix(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
}

pub type MlResult<T> = Result<T, MlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_available() {
        let err = MlError::MissingColumn {
            column: "UseCode".into(),
            available: vec!["Bathrooms".into(), "Label".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing column 'UseCode' (available: Bathrooms, Label)"
        );
    }

    #[test]
    fn test_malformed_line_suffix() {
        let with_line = MlError::Malformed { line: Some(4), message: "short".into() };
        let without = MlError::Malformed { line: None, message: "short".into() };
        assert_eq!(with_line.to_string(), "Malformed record at line 4: short");
        assert_eq!(without.to_string(), "Malformed record: short");
    }
}

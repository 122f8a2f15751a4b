//! Error types for panel cleaning.

use jtmom_primitives::Date;
use jtmom_traits::ProviderError;

/// Errors that can occur while building the canonical panel.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A value that must be integral could not be read as one.
    #[error("non-numeric value {value:?} in column {column} at row {row}")]
    NonNumeric {
        /// Column name.
        column: String,
        /// Row position in the raw input.
        row: usize,
        /// Offending value.
        value: String,
    },

    /// A required identifier is null.
    #[error("missing identifier in column {column} at row {row}")]
    MissingIdentifier {
        /// Column name.
        column: String,
        /// Row position in the raw input.
        row: usize,
    },

    /// A date could not be parsed.
    #[error("invalid date {value:?} at row {row}")]
    InvalidDate {
        /// Row position in the raw input.
        row: usize,
        /// Offending value.
        value: String,
    },

    /// Duplicate `(security_id, date)` under the reject policy.
    #[error("duplicate record for security {security_id} on {date}")]
    DuplicateRecord {
        /// Security identifier.
        security_id: i64,
        /// Month-end date.
        date: Date,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PanelError::NonNumeric {
            column: "security_id".to_string(),
            row: 3,
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "non-numeric value \"abc\" in column security_id at row 3");

        let err = PanelError::MissingColumn("ret".to_string());
        assert!(err.to_string().contains("ret"));
    }
}

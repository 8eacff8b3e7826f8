// ABOUTME: Error taxonomy for the consistency checker
// ABOUTME: Distinguishes connection failures from count and data mismatches

use std::path::PathBuf;

use thiserror::Error;

use crate::mapping::Side;

/// Convenience alias used throughout the library modules.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Everything that can abort a check run.
///
/// Every variant is fatal: the checker never retries and never aggregates
/// partial failures. Connection problems surface before any comparison;
/// `CountMismatch`, `RowMismatch` and `TrailingRows` are the verification
/// verdicts themselves.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Missing or invalid configuration, including unknown table names.
    #[error("configuration error: {0}")]
    Config(String),

    /// The legacy SQLite file could not be opened.
    #[error("cannot open legacy database at {}: {source}", path.display())]
    LegacyConnection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The target PostgreSQL database could not be reached.
    #[error("cannot connect to target database: {hint}")]
    TargetConnection {
        hint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// The TLS connector for the target connection could not be built.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    /// A read against the legacy store failed mid-check.
    #[error("legacy query failed for table '{table}': {source}")]
    LegacyQuery {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A read against the target store failed mid-check.
    #[error("target query failed for table '{table}': {source}")]
    TargetQuery {
        table: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// The target returned a column type the value model does not map.
    #[error("unsupported column type '{type_name}' for {table}.{column}")]
    UnsupportedColumn {
        table: String,
        column: String,
        type_name: String,
    },

    /// The ordered per-table count sequences differ between the stores.
    #[error("row counts diverge: legacy {legacy:?} != target {target:?} (first difference: {table})")]
    CountMismatch {
        legacy: Vec<i64>,
        target: Vec<i64>,
        table: String,
    },

    /// A projected row tuple differs between corresponding positions.
    #[error("data mismatch in table '{table}' at row {row} ({column}): legacy {legacy} != target {target}")]
    RowMismatch {
        table: String,
        row: u64,
        column: String,
        legacy: String,
        target: String,
    },

    /// One row stream kept producing rows after the other was exhausted.
    #[error("row streams diverge in table '{table}': the {side} side returned more rows after {compared} matching rows")]
    TrailingRows {
        table: String,
        side: Side,
        compared: u64,
    },
}

impl CheckError {
    /// True for the mismatch verdicts, false for operational failures.
    ///
    /// Lets callers tell "the data is wrong" apart from "the check could
    /// not run" without matching every variant.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            CheckError::CountMismatch { .. }
                | CheckError::RowMismatch { .. }
                | CheckError::TrailingRows { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mismatch_cites_both_sequences() {
        let err = CheckError::CountMismatch {
            legacy: vec![10, 3],
            target: vec![9, 3],
            table: "film_work".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[10, 3]"));
        assert!(msg.contains("[9, 3]"));
        assert!(msg.contains("film_work"));
    }

    #[test]
    fn test_row_mismatch_cites_offending_pair() {
        let err = CheckError::RowMismatch {
            table: "film_work".to_string(),
            row: 3,
            column: "rating".to_string(),
            legacy: "7.5".to_string(),
            target: "7.50001".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("7.5 != target 7.50001"));
    }

    #[test]
    fn test_trailing_rows_names_longer_side() {
        let err = CheckError::TrailingRows {
            table: "genre".to_string(),
            side: Side::Target,
            compared: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("target side"));
        assert!(msg.contains("42 matching rows"));
    }

    #[test]
    fn test_mismatch_classification() {
        let mismatch = CheckError::CountMismatch {
            legacy: vec![1],
            target: vec![2],
            table: "genre".to_string(),
        };
        assert!(mismatch.is_mismatch());

        let config = CheckError::Config("missing DB_NAME".to_string());
        assert!(!config.is_mismatch());
    }
}

// ABOUTME: The comparison engine: row-count and row-data comparators
// ABOUTME: Operates on TableSource trait objects so tests can inject fakes

use crate::error::{CheckError, Result};
use crate::mapping::TableSpec;
use crate::source::{RowStream, TableSource};

/// Outcome of the row-count phase across all checked tables.
///
/// Holds the two ordered count sequences collected in check order. The
/// pass condition is element-wise equality of the full sequences; a
/// single table's divergence fails the whole check.
#[derive(Debug, Clone)]
pub struct CountReport {
    pub tables: Vec<String>,
    pub legacy: Vec<i64>,
    pub target: Vec<i64>,
}

impl CountReport {
    /// True when the two count sequences are element-wise equal.
    pub fn matches(&self) -> bool {
        self.legacy == self.target
    }

    /// Index of the first diverging table, if any.
    pub fn first_mismatch(&self) -> Option<usize> {
        self.legacy
            .iter()
            .zip(&self.target)
            .position(|(l, t)| l != t)
    }

    /// The count-mismatch error for a diverging report, citing both
    /// full sequences and the first differing table. `None` when the
    /// counts match.
    pub fn mismatch_error(&self) -> Option<CheckError> {
        let idx = self.first_mismatch()?;
        Some(CheckError::CountMismatch {
            table: self.tables[idx].clone(),
            legacy: self.legacy.clone(),
            target: self.target.clone(),
        })
    }
}

/// Collect the ordered per-table `COUNT(*)` sequence from one source.
pub async fn collect_counts(source: &dyn TableSource, tables: &[TableSpec]) -> Result<Vec<i64>> {
    let mut counts = Vec::with_capacity(tables.len());
    for table in tables {
        counts.push(source.count(table).await?);
    }
    Ok(counts)
}

/// Row-count comparator.
///
/// Collects the full legacy sequence first, then the full target
/// sequence, in check order, and reports both. Exact integer equality,
/// no tolerance.
pub async fn compare_counts(
    legacy: &dyn TableSource,
    target: &dyn TableSource,
    tables: &[TableSpec],
) -> Result<CountReport> {
    let legacy_counts = collect_counts(legacy, tables).await?;
    let target_counts = collect_counts(target, tables).await?;
    Ok(CountReport {
        tables: tables.iter().map(|t| t.name.to_string()).collect(),
        legacy: legacy_counts,
        target: target_counts,
    })
}

/// Row-data comparator for one table.
///
/// Streams both ordered projections and compares rows pairwise,
/// element-wise under the value-equivalence rules. Aborts at the first
/// differing tuple. If one stream keeps producing rows after the other
/// is exhausted that is a [`CheckError::TrailingRows`] error naming the
/// longer side. Returns the number of rows compared on success.
pub async fn compare_table_rows(
    legacy: &dyn TableSource,
    target: &dyn TableSource,
    table: &TableSpec,
    batch_size: u64,
) -> Result<u64> {
    let mut legacy_rows = RowStream::new(legacy, table, batch_size);
    let mut target_rows = RowStream::new(target, table, batch_size);
    let mut compared: u64 = 0;

    loop {
        match (legacy_rows.next_row().await?, target_rows.next_row().await?) {
            (None, None) => return Ok(compared),
            (Some(legacy_row), Some(target_row)) => {
                for (idx, (lv, tv)) in legacy_row.iter().zip(target_row.iter()).enumerate() {
                    if !lv.matches(tv) {
                        return Err(CheckError::RowMismatch {
                            table: table.name.to_string(),
                            row: compared + 1,
                            column: table.column_label(idx),
                            legacy: lv.to_string(),
                            target: tv.to_string(),
                        });
                    }
                }
                compared += 1;
            }
            (Some(_), None) => {
                return Err(CheckError::TrailingRows {
                    table: table.name.to_string(),
                    side: legacy.side(),
                    compared,
                })
            }
            (None, Some(_)) => {
                return Err(CheckError::TrailingRows {
                    table: table.name.to_string(),
                    side: target.side(),
                    compared,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(legacy: Vec<i64>, target: Vec<i64>) -> CountReport {
        CountReport {
            tables: vec!["film_work".to_string(), "genre".to_string()],
            legacy,
            target,
        }
    }

    #[test]
    fn test_report_matches_on_equal_sequences() {
        let r = report(vec![10, 3], vec![10, 3]);
        assert!(r.matches());
        assert!(r.first_mismatch().is_none());
        assert!(r.mismatch_error().is_none());
    }

    #[test]
    fn test_report_names_first_diverging_table() {
        let r = report(vec![10, 3], vec![10, 2]);
        assert!(!r.matches());
        assert_eq!(r.first_mismatch(), Some(1));

        let err = r.mismatch_error().unwrap();
        match err {
            CheckError::CountMismatch { table, legacy, target } => {
                assert_eq!(table, "genre");
                assert_eq!(legacy, vec![10, 3]);
                assert_eq!(target, vec![10, 2]);
            }
            other => panic!("expected CountMismatch, got {:?}", other),
        }
    }
}

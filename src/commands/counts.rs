// ABOUTME: Counts command implementation - row-count comparison only
// ABOUTME: Collects and compares the ordered per-table COUNT(*) sequences

use anyhow::Result;

use crate::checker::{self, CountReport};
use crate::config::CheckerConfig;
use crate::mapping::TableSpec;
use crate::source::TableSource;

/// Compare per-table row counts between the two databases.
///
/// Collects the full legacy count sequence, then the full target
/// sequence, in check order, and requires element-wise equality. A
/// single diverging table fails the whole run.
///
/// # Arguments
///
/// * `config` - Resolved checker configuration
/// * `tables` - Tables to check, in check order
///
/// # Errors
///
/// Returns an error if either database cannot be opened, a count query
/// fails, or the sequences diverge (citing both sequences and the first
/// differing table).
///
/// # Examples
///
/// ```no_run
/// # use movies_migration_checker::commands::counts;
/// # use movies_migration_checker::config::CheckerConfig;
/// # use movies_migration_checker::mapping::MOVIES_TABLES;
/// # async fn example() -> anyhow::Result<()> {
/// let config = CheckerConfig::load(None)?;
/// counts(&config, MOVIES_TABLES).await?;
/// # Ok(())
/// # }
/// ```
pub async fn counts(config: &CheckerConfig, tables: &[TableSpec]) -> Result<()> {
    tracing::info!("Starting row-count comparison...");
    tracing::info!("");

    if tables.is_empty() {
        tracing::warn!("⚠ No tables selected to check");
        return Ok(());
    }

    let (legacy, target) = super::connect_pair(config).await?;
    tracing::info!("");

    run_count_phase(&legacy, &target, tables).await?;

    tracing::info!("");
    tracing::info!("✓ Row counts match across {} table(s)", tables.len());
    Ok(())
}

/// The count phase shared by `counts` and `check`.
///
/// Logs one line per table and returns the report on success; a
/// diverging report becomes the count-mismatch error.
pub(crate) async fn run_count_phase(
    legacy: &dyn TableSource,
    target: &dyn TableSource,
    tables: &[TableSpec],
) -> Result<CountReport> {
    tracing::info!("Comparing row counts for {} table(s)...", tables.len());

    let report = checker::compare_counts(legacy, target, tables).await?;

    for (idx, name) in report.tables.iter().enumerate() {
        if report.legacy[idx] == report.target[idx] {
            tracing::info!("  ✓ {}: {} rows", name, report.legacy[idx]);
        } else {
            tracing::error!(
                "  ✗ {}: legacy={}, target={}",
                name,
                report.legacy[idx],
                report.target[idx]
            );
        }
    }

    if let Some(err) = report.mismatch_error() {
        return Err(err.into());
    }
    Ok(report)
}

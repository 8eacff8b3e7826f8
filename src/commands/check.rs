// ABOUTME: Check command implementation - the full consistency check
// ABOUTME: Runs the count phase then the data phase on one pair of connections

use anyhow::Result;

use crate::checker::CountReport;
use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::mapping::TableSpec;
use crate::source::TableSource;

/// Run the full consistency check: counts first, then data.
///
/// This command performs both verification phases on a single pair of
/// connections:
/// 1. Compares the ordered per-table row-count sequences
/// 2. Compares row tuples pairwise in primary-key order for every table
/// 3. Reports a summary
///
/// Phases run strictly in that order and the run aborts at the first
/// failure, so a count divergence is reported before any row data is
/// read.
///
/// # Arguments
///
/// * `config` - Resolved checker configuration
/// * `tables` - Tables to check, in check order
///
/// # Returns
///
/// Returns `Ok(())` when both phases pass for every table.
///
/// # Errors
///
/// Returns an error if either database cannot be opened or either phase
/// fails; the error carries the mismatch taxonomy (count sequences, or
/// table/row/column plus both values).
///
/// # Examples
///
/// ```no_run
/// # use movies_migration_checker::commands::check;
/// # use movies_migration_checker::config::CheckerConfig;
/// # use movies_migration_checker::mapping::MOVIES_TABLES;
/// # async fn example() -> anyhow::Result<()> {
/// let config = CheckerConfig::load(None)?;
/// check(&config, MOVIES_TABLES).await?;
/// # Ok(())
/// # }
/// ```
pub async fn check(config: &CheckerConfig, tables: &[TableSpec]) -> Result<()> {
    tracing::info!("Starting full consistency check...");
    tracing::info!("");

    if tables.is_empty() {
        tracing::warn!("⚠ No tables selected to check");
        return Ok(());
    }

    let (legacy, target) = super::connect_pair(config).await?;
    tracing::info!("");

    let (report, total_rows) =
        match run_phases(&legacy, &target, tables, config.batch_size).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let is_verdict = e
                    .downcast_ref::<CheckError>()
                    .map_or(false, CheckError::is_mismatch);
                if is_verdict {
                    tracing::info!("");
                    tracing::error!("⚠ CONSISTENCY ISSUES DETECTED!");
                    tracing::info!("Possible causes:");
                    tracing::info!("  - The ETL run was interrupted or partially applied");
                    tracing::info!("  - Data was modified in one store after the migration");
                    tracing::info!("  - Type conversion during the migration changed values");
                    tracing::info!("");
                }
                return Err(e);
            }
        };

    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!("Consistency Check Summary");
    tracing::info!("========================================");
    tracing::info!("Tables checked: {}", report.tables.len());
    tracing::info!("Rows compared:  {}", total_rows);
    tracing::info!("✓ Row counts match");
    tracing::info!("✓ Row data matches");
    tracing::info!("========================================");
    tracing::info!("");
    tracing::info!("✓ MIGRATION DATA VERIFIED SUCCESSFULLY!");
    tracing::info!(
        "  All {} table(s) match between legacy and target",
        report.tables.len()
    );

    Ok(())
}

async fn run_phases(
    legacy: &dyn TableSource,
    target: &dyn TableSource,
    tables: &[TableSpec],
    batch_size: u64,
) -> Result<(CountReport, u64)> {
    let report = super::counts::run_count_phase(legacy, target, tables).await?;
    tracing::info!("");
    let total_rows = super::data::run_data_phase(legacy, target, tables, batch_size).await?;
    Ok((report, total_rows))
}

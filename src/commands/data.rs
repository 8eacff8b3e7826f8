// ABOUTME: Data command implementation - row-level tuple comparison
// ABOUTME: Streams both ordered projections per table and compares pairwise

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::checker;
use crate::config::CheckerConfig;
use crate::mapping::TableSpec;
use crate::source::TableSource;

/// Compare row-level data between the two databases.
///
/// For every table, streams both projections in primary-key order and
/// compares row tuples pairwise under the value-equivalence rules. The
/// run aborts at the first differing tuple; no partial-failure
/// aggregation across tables.
///
/// # Arguments
///
/// * `config` - Resolved checker configuration
/// * `tables` - Tables to check, in check order
///
/// # Errors
///
/// Returns an error if either database cannot be opened, a projection
/// query fails, a row tuple differs (citing table, row, column and both
/// values), or one row stream outlives the other.
///
/// # Examples
///
/// ```no_run
/// # use movies_migration_checker::commands::data;
/// # use movies_migration_checker::config::CheckerConfig;
/// # use movies_migration_checker::mapping::MOVIES_TABLES;
/// # async fn example() -> anyhow::Result<()> {
/// let config = CheckerConfig::load(None)?;
/// data(&config, MOVIES_TABLES).await?;
/// # Ok(())
/// # }
/// ```
pub async fn data(config: &CheckerConfig, tables: &[TableSpec]) -> Result<()> {
    tracing::info!("Starting row-data comparison...");
    tracing::info!("");

    if tables.is_empty() {
        tracing::warn!("⚠ No tables selected to check");
        return Ok(());
    }

    let (legacy, target) = super::connect_pair(config).await?;
    tracing::info!("");

    let total_rows = run_data_phase(&legacy, &target, tables, config.batch_size).await?;

    tracing::info!("");
    tracing::info!(
        "✓ Row data matches across {} table(s) ({} rows compared)",
        tables.len(),
        total_rows
    );
    Ok(())
}

/// The data phase shared by `data` and `check`.
///
/// Tables are processed strictly in order, one query in flight at a
/// time. Returns the total number of rows compared.
pub(crate) async fn run_data_phase(
    legacy: &dyn TableSource,
    target: &dyn TableSource,
    tables: &[TableSpec],
    batch_size: u64,
) -> Result<u64> {
    tracing::info!(
        "Comparing row data for {} table(s) (batch size: {})...",
        tables.len(),
        batch_size
    );

    let progress = ProgressBar::new(tables.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut total_rows: u64 = 0;
    for table in tables {
        progress.set_message(format!("Checking {}", table.name));

        match checker::compare_table_rows(legacy, target, table, batch_size).await {
            Ok(compared) => {
                total_rows += compared;
                progress.inc(1);
                tracing::info!("  ✓ {}: {} rows match", table.name, compared);
            }
            Err(e) => {
                progress.abandon_with_message(format!("Mismatch in {}", table.name));
                tracing::error!("  ✗ {}: {}", table.name, e);
                return Err(e.into());
            }
        }
    }

    progress.finish_with_message("Data comparison complete");
    Ok(total_rows)
}

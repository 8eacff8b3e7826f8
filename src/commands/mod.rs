// ABOUTME: Command implementations for each check mode
// ABOUTME: Exports the counts, data, and check commands

pub mod check;
pub mod counts;
pub mod data;

pub use check::check;
pub use counts::counts;
pub use data::data;

use anyhow::{Context, Result};

use crate::config::CheckerConfig;
use crate::source::{PostgresSource, SqliteSource};

/// Open both stores for one check run.
///
/// Both handles live for the duration of the calling command and are
/// released by drop on every exit path.
pub(crate) async fn connect_pair(config: &CheckerConfig) -> Result<(SqliteSource, PostgresSource)> {
    tracing::info!("Opening legacy database...");
    let legacy =
        SqliteSource::open(&config.sqlite_path).context("Failed to open legacy database")?;
    tracing::info!("✓ Legacy database open: {}", config.sqlite_path.display());

    tracing::info!("Connecting to target database...");
    let target = PostgresSource::connect(&config.target)
        .await
        .context("Failed to connect to target database")?;
    tracing::info!(
        "✓ Connected to target: {} at {}:{}",
        config.target.dbname,
        config.target.host,
        config.target.port
    );

    Ok((legacy, target))
}

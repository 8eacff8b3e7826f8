// ABOUTME: Interactive terminal UI for choosing which tables to check
// ABOUTME: Opt-in multi-select over the logical tables with confirmation

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};

use crate::mapping::TableSpec;

/// Interactive table selection.
///
/// Presents a multi-select over the logical tables (all pre-selected)
/// followed by a confirmation prompt. Returns the chosen specs in check
/// order; an empty selection or a declined confirmation returns an
/// empty vector, which callers treat as "nothing to do".
///
/// # Arguments
///
/// * `tables` - The tables available for checking, in check order
///
/// # Errors
///
/// Returns an error if the terminal interaction itself fails (e.g. not
/// a TTY).
pub fn select_tables(tables: &[TableSpec]) -> Result<Vec<TableSpec>> {
    println!("Select tables to check:");
    println!("(Use arrow keys to navigate, Space to toggle, Enter to confirm)");
    println!();

    let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
    let defaults = vec![true; names.len()];

    let selections = MultiSelect::with_theme(&ColorfulTheme::default())
        .items(&names)
        .defaults(&defaults)
        .interact()
        .context("Failed to get table selection")?;

    if selections.is_empty() {
        tracing::warn!("⚠ No tables selected");
        return Ok(Vec::new());
    }

    let selected: Vec<TableSpec> = selections.iter().map(|&idx| tables[idx]).collect();

    tracing::info!("");
    tracing::info!("✓ Selected {} table(s):", selected.len());
    for table in &selected {
        tracing::info!("  - {}", table.name);
    }
    tracing::info!("");

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Run the consistency check against {} table(s)?",
            selected.len()
        ))
        .default(true)
        .interact()
        .context("Failed to get confirmation")?;

    if !confirmed {
        tracing::warn!("⚠ Check cancelled");
        return Ok(Vec::new());
    }

    Ok(selected)
}

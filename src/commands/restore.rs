// ABOUTME: Restore command: insert a cleaned document into a fresh schema
// ABOUTME: Resolves the insertion plan and prints the per-table summary

use crate::config::RunConfig;
use crate::document::store;
use crate::postgres;
use crate::restore as restore_engine;
use crate::restore::plan;
use anyhow::Result;
use std::path::Path;

/// Restore a cleaned document through the configured field policies
///
/// The insertion plan comes from the config when the operator supplied one,
/// otherwise it is computed from the target schema's foreign keys. Each table
/// commits independently; row-level failures are logged and skipped, and the
/// final summary counts them.
pub async fn restore(url: &str, input: &Path, config: &RunConfig) -> Result<()> {
    // Document problems must surface before any database interaction
    let document = store::load_cleaned(input)?;
    tracing::info!(
        "Loaded cleaned document with {} tables from {}",
        document.len(),
        input.display()
    );

    let mut client = postgres::connect(url).await?;

    let insertion_plan = match &config.plan {
        Some(explicit) => {
            tracing::info!("Using explicit insertion plan from config");
            explicit.clone()
        }
        None => {
            let computed = plan::compute_insertion_plan(&client, &config.schema).await?;
            tracing::info!("Computed insertion plan from foreign keys: {:?}", computed);
            computed
        }
    };

    let report = restore_engine::restore_document(
        &mut client,
        &config.schema,
        &document,
        config,
        &insertion_plan,
    )
    .await?;

    println!("\nRestore complete");
    for (table, table_report) in &report.tables {
        println!(
            "  {}: {} inserted, {} skipped, {} failed ({} attempted)",
            table,
            table_report.inserted,
            table_report.skipped,
            table_report.failed,
            table_report.attempted
        );
    }
    println!(
        "  Total: {} of {} rows inserted",
        report.total_inserted(),
        report.total_attempted()
    );
    if report.total_failed() > 0 {
        println!(
            "  {} rows failed; see the log for the offending records",
            report.total_failed()
        );
    }

    Ok(())
}

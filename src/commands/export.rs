// ABOUTME: Export command: snapshot every base table of a schema to JSON
// ABOUTME: Fail-fast; the snapshot file only appears after a complete export

use crate::config::RunConfig;
use crate::document::store;
use crate::postgres;
use crate::snapshot;
use anyhow::Result;

/// Export the configured schema into a timestamped snapshot file
///
/// Read-only against the database. Nothing is written to disk until every
/// table has been read, so a failed run leaves no partial snapshot behind.
pub async fn export(url: &str, config: &RunConfig) -> Result<()> {
    let client = postgres::connect(url).await?;

    let document = snapshot::export_schema(&client, &config.schema).await?;
    let path = store::write_snapshot(&config.snapshot_dir, &config.system, &document)?;

    let total_rows: u64 = document.values().map(|t| t.row_count).sum();
    println!("Snapshot written to {}", path.display());
    println!("  Tables: {}", document.len());
    println!("  Rows:   {}", total_rows);

    Ok(())
}

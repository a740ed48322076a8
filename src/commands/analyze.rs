// ABOUTME: Analyze command: null/completeness report over the latest snapshot
// ABOUTME: Pure report to drive offline authoring of a cleaned document

use crate::config::RunConfig;
use crate::document::store;
use crate::snapshot::analyzer;
use anyhow::Result;

/// Report missing values per table and column of the most recent snapshot
///
/// Selects the latest `backup_<system>_*.json` in the snapshot directory and
/// prints, for every column with at least one NULL (or legacy `"None"`
/// sentinel), the count of affected rows and whether the column was declared
/// nullable. The decisions about defaults belong to the offline cleaning
/// step; this command never modifies anything.
pub async fn analyze(config: &RunConfig) -> Result<()> {
    let path = store::find_latest_snapshot(&config.snapshot_dir, &config.system)?;
    println!("Analyzing {}", path.display());

    let document = store::load_snapshot(&path)?;
    let report = analyzer::analyze_nulls(&document);

    if report.is_empty() {
        println!("No missing values found in any non-empty table.");
        return Ok(());
    }

    for (table, columns) in &report {
        let row_count = document.get(table).map(|t| t.row_count).unwrap_or(0);
        println!("\nTable: {} ({} rows)", table, row_count);
        for (column, stats) in columns {
            println!(
                "  - {}: {} nulls (declared nullable: {})",
                column, stats.null_count, stats.declared_nullable
            );
            if !stats.declared_nullable {
                println!(
                    "    NOT NULL column; the cleaned document must supply a value for every row"
                );
            }
        }
    }

    Ok(())
}

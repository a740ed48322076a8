// ABOUTME: Reset command: drop the schema's tables so it can be reprovisioned
// ABOUTME: Destructive; requires an explicit --yes confirmation

use crate::config::RunConfig;
use crate::postgres;
use crate::restore;
use anyhow::{bail, Result};

/// Drop every base table in the configured schema with CASCADE
///
/// Children are dropped before their parents (reverse insertion-plan order).
/// Schema recreation is external: the operator redeploys the application so
/// its migration tool rebuilds the tables, then runs `restore`.
pub async fn reset(url: &str, config: &RunConfig, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "reset drops every table in schema '{}'. Re-run with --yes to confirm.",
            config.schema
        );
    }

    let client = postgres::connect(url).await?;
    let dropped = restore::drop_schema_tables(&client, &config.schema).await?;

    println!("Dropped {} tables from schema '{}'", dropped.len(), config.schema);
    println!("Next steps:");
    println!("  1. Let your migration tool recreate the schema");
    println!("  2. Run 'restore' with the cleaned document");

    Ok(())
}

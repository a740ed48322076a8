// ABOUTME: Restores a cleaned document into a provisioned schema
// ABOUTME: One transaction per table, one savepoint per row, commit per table

pub mod plan;

use crate::config::RunConfig;
use crate::document::{CellValue, CleanedDocument};
use crate::policy::FieldPolicy;
use crate::postgres::schema;
use crate::utils::quote_ident;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;

/// Outcome of restoring one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    /// Rows read from the document
    pub attempted: u64,
    /// Rows whose INSERT committed
    pub inserted: u64,
    /// Rows skipped because their effective field set was empty
    pub skipped: u64,
    /// Rows whose INSERT failed and was rolled back to its savepoint
    pub failed: u64,
}

/// Outcome of a whole restore run
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub tables: BTreeMap<String, TableReport>,
}

impl RestoreReport {
    pub fn total_inserted(&self) -> u64 {
        self.tables.values().map(|t| t.inserted).sum()
    }

    pub fn total_attempted(&self) -> u64 {
        self.tables.values().map(|t| t.attempted).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.tables.values().map(|t| t.failed).sum()
    }
}

/// Restore a cleaned document, table by table in plan order
///
/// Each table runs inside one transaction committed after its full row loop.
/// Each row gets its own savepoint, so one bad row (constraint violation,
/// type mismatch, unknown column) is rolled back alone and never discards
/// rows already inserted for that table. Failed rows are logged with the
/// offending record and the run continues; there is no retry.
pub async fn restore_document(
    client: &mut Client,
    schema_name: &str,
    document: &CleanedDocument,
    config: &RunConfig,
    insertion_plan: &[String],
) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();

    for table in insertion_plan {
        let rows = match document.get(table) {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                tracing::info!("Skipping '{}' (no data in document)", table);
                continue;
            }
        };

        let columns = schema::get_table_columns(client, schema_name, table).await?;
        if columns.is_empty() {
            tracing::warn!(
                "Target table '{}' does not exist in schema '{}'; skipping {} rows",
                table,
                schema_name,
                rows.len()
            );
            continue;
        }
        let column_types: BTreeMap<String, String> = columns
            .into_iter()
            .map(|c| (c.name, c.type_name))
            .collect();

        let policy = config.policy_for(table);
        let table_report =
            insert_table_rows(client, schema_name, table, rows, &policy, &column_types).await?;

        tracing::info!(
            "Table '{}': {} inserted, {} skipped, {} failed of {} rows",
            table,
            table_report.inserted,
            table_report.skipped,
            table_report.failed,
            table_report.attempted
        );
        report.tables.insert(table.clone(), table_report);
    }

    for table in document.keys() {
        if !insertion_plan.contains(table) {
            tracing::warn!(
                "Document contains table '{}' which is not in the insertion plan; not restored",
                table
            );
        }
    }

    Ok(report)
}

async fn insert_table_rows(
    client: &mut Client,
    schema_name: &str,
    table: &str,
    rows: &[crate::document::Row],
    policy: &FieldPolicy,
    column_types: &BTreeMap<String, String>,
) -> Result<TableReport> {
    let mut report = TableReport {
        attempted: rows.len() as u64,
        ..Default::default()
    };

    let mut tx = client
        .transaction()
        .await
        .with_context(|| format!("Failed to open transaction for table '{}'", table))?;

    for (idx, row) in rows.iter().enumerate() {
        let fields = policy.effective_fields(row);
        if fields.is_empty() {
            report.skipped += 1;
            continue;
        }

        let (sql, params) = build_insert(schema_name, table, &fields, column_types);
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let savepoint = tx
            .savepoint(format!("row_{}", idx))
            .await
            .with_context(|| format!("Failed to create savepoint for table '{}'", table))?;

        match savepoint.execute(&sql, &param_refs).await {
            Ok(_) => {
                savepoint
                    .commit()
                    .await
                    .with_context(|| format!("Failed to release savepoint for '{}'", table))?;
                report.inserted += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to insert row {} into '{}': {}. Record: {}",
                    idx,
                    table,
                    e,
                    serde_json::to_string(row).unwrap_or_else(|_| format!("{:?}", row))
                );
                savepoint
                    .rollback()
                    .await
                    .with_context(|| format!("Failed to roll back savepoint for '{}'", table))?;
                report.failed += 1;
            }
        }
    }

    tx.commit()
        .await
        .with_context(|| format!("Failed to commit transaction for table '{}'", table))?;

    Ok(report)
}

/// Build one parameterized INSERT covering exactly the effective fields
///
/// Every value is bound as text and cast to the target column's introspected
/// type, the way the server coerces untyped literals. Fields whose target
/// column is unknown keep a plain text placeholder; the server then reports
/// the unknown column as a row-level error.
fn build_insert(
    schema_name: &str,
    table: &str,
    fields: &[(String, CellValue)],
    column_types: &BTreeMap<String, String>,
) -> (String, Vec<String>) {
    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());

    for (name, value) in fields {
        // Effective fields are never absent, so the rendering always exists
        let Some(text) = value.to_sql_text() else {
            continue;
        };
        let n = params.len() + 1;
        columns.push(quote_ident(name));
        placeholders.push(match column_types.get(name) {
            Some(type_name) => format!("(${}::text)::{}", n, quote_ident(type_name)),
            None => format!("${}::text", n),
        });
        params.push(text);
    }

    let sql = format!(
        "INSERT INTO {}.{} ({}) VALUES ({})",
        quote_ident(schema_name),
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    );

    (sql, params)
}

/// Drop every base table in the schema with CASCADE, children first
///
/// Used by the `reset` command so an external migration tool can recreate the
/// schema from scratch. Per-table failures are logged and the remaining drops
/// continue, matching the best-effort teardown contract.
pub async fn drop_schema_tables(client: &Client, schema_name: &str) -> Result<Vec<String>> {
    let insertion_plan = plan::compute_insertion_plan(client, schema_name).await?;
    let mut dropped = Vec::new();

    for table in insertion_plan.iter().rev() {
        let sql = format!(
            "DROP TABLE IF EXISTS {}.{} CASCADE",
            quote_ident(schema_name),
            quote_ident(table)
        );
        match client.execute(&sql, &[]).await {
            Ok(_) => {
                tracing::info!("Dropped table '{}'", table);
                dropped.push(table.clone());
            }
            Err(e) => {
                tracing::warn!("Failed to drop table '{}': {}", table, e);
            }
        }
    }

    Ok(dropped)
}

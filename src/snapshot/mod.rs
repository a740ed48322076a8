// ABOUTME: Whole-schema export into a self-describing snapshot document
// ABOUTME: Reads column metadata and all rows, preserving native value types

pub mod analyzer;

use crate::document::{CellValue, ColumnDescriptor, Row, SnapshotDocument, TableSnapshot};
use crate::postgres::schema::{self, ColumnMeta};
use crate::utils::quote_ident;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::BTreeMap;
use tokio_postgres::Client;

/// Export every base table of a schema into a snapshot document
///
/// Read-only against the database. Tables are visited in name order; rows are
/// read in engine-native order, which is not guaranteed stable across runs.
/// Any query failure aborts the whole export; a partial snapshot is never
/// returned.
pub async fn export_schema(client: &Client, schema_name: &str) -> Result<SnapshotDocument> {
    let tables = schema::list_base_tables(client, schema_name).await?;
    tracing::info!(
        "Found {} base tables in schema '{}'",
        tables.len(),
        schema_name
    );

    let mut document = BTreeMap::new();
    let mut total_rows = 0u64;

    for table in &tables {
        let columns = schema::get_table_columns(client, schema_name, table).await?;
        let rows = read_table_rows(client, schema_name, table, &columns).await?;
        total_rows += rows.len() as u64;
        tracing::info!("Exported table '{}': {} rows", table, rows.len());

        let descriptors = columns.into_iter().map(to_descriptor).collect();
        document.insert(table.clone(), TableSnapshot::new(descriptors, rows));
    }

    tracing::info!(
        "Export complete: {} tables, {} rows",
        document.len(),
        total_rows
    );
    Ok(document)
}

fn to_descriptor(meta: ColumnMeta) -> ColumnDescriptor {
    ColumnDescriptor {
        name: meta.name,
        sql_type: meta.type_name,
        nullable: meta.nullable,
        default: meta.default,
    }
}

/// Types the driver reads natively into tagged values; everything else is
/// cast to text in the SELECT list and carried as `Text`.
fn is_native_type(type_name: &str) -> bool {
    matches!(
        type_name,
        "bool"
            | "int2"
            | "int4"
            | "int8"
            | "float4"
            | "float8"
            | "text"
            | "varchar"
            | "bpchar"
            | "name"
            | "timestamp"
            | "timestamptz"
            | "date"
            | "time"
    )
}

fn select_expr(column: &ColumnMeta) -> String {
    let quoted = quote_ident(&column.name);
    if is_native_type(&column.type_name) {
        quoted
    } else {
        format!("{}::text", quoted)
    }
}

async fn read_table_rows(
    client: &Client,
    schema_name: &str,
    table: &str,
    columns: &[ColumnMeta],
) -> Result<Vec<Row>> {
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let select_list: Vec<String> = columns.iter().map(select_expr).collect();
    let query = format!(
        "SELECT {} FROM {}.{}",
        select_list.join(", "),
        quote_ident(schema_name),
        quote_ident(table)
    );

    let db_rows = client
        .query(&query, &[])
        .await
        .with_context(|| format!("Failed to read rows from table '{}'", table))?;

    let mut rows = Vec::with_capacity(db_rows.len());
    for db_row in &db_rows {
        let mut row = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = extract_cell(db_row, idx, &column.type_name).with_context(|| {
                format!("Failed to decode column '{}' of table '{}'", column.name, table)
            })?;
            row.insert(column.name.clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Decode one cell into a tagged value
///
/// Timestamps without a zone, dates, and times are rendered to ISO-8601 text;
/// timestamptz keeps its typed form and serializes as RFC 3339.
fn extract_cell(row: &tokio_postgres::Row, idx: usize, type_name: &str) -> Result<CellValue> {
    let value = match type_name {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(CellValue::Bool),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| CellValue::Integer(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| CellValue::Integer(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(CellValue::Integer),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| CellValue::from_f64(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(CellValue::from_f64),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(CellValue::Timestamp),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|v| CellValue::Text(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|v| CellValue::Text(v.format("%Y-%m-%d").to_string())),
        "time" => row
            .try_get::<_, Option<NaiveTime>>(idx)?
            .map(|v| CellValue::Text(v.format("%H:%M:%S%.f").to_string())),
        // Cast to ::text in the SELECT list
        _ => row.try_get::<_, Option<String>>(idx)?.map(CellValue::Text),
    };

    Ok(value.unwrap_or(CellValue::Null))
}

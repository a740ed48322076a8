// ABOUTME: Catalog introspection for export and restore planning
// ABOUTME: Lists base tables, column metadata, and foreign-key edges

use anyhow::{Context, Result};
use tokio_postgres::Client;

/// Column metadata as read from pg_catalog, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    /// Internal type name (typname), e.g. `int4`, `varchar`, `timestamptz`
    pub type_name: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// List the base tables of a schema, ordered by name
///
/// pg_tables only carries real tables, which matches the export contract:
/// views and foreign tables are never snapshotted. The name ordering keeps
/// successive exports diffable.
pub async fn list_base_tables(client: &Client, schema: &str) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT tablename
             FROM pg_catalog.pg_tables
             WHERE schemaname = $1
             ORDER BY tablename",
            &[&schema],
        )
        .await
        .with_context(|| format!("Failed to list base tables in schema '{}'", schema))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Get the columns of a table in declaration order
///
/// Returns name, internal type name, nullability, and the default expression
/// (rendered with pg_get_expr) for every live column.
pub async fn get_table_columns(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnMeta>> {
    let rows = client
        .query(
            "SELECT
                a.attname,
                t.typname,
                NOT a.attnotnull AS nullable,
                pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS default_expr
             FROM pg_catalog.pg_attribute a
             JOIN pg_catalog.pg_class c ON a.attrelid = c.oid
             JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
             JOIN pg_catalog.pg_type t ON a.atttypid = t.oid
             LEFT JOIN pg_catalog.pg_attrdef d
                ON d.adrelid = c.oid AND d.adnum = a.attnum
             WHERE n.nspname = $1
               AND c.relname = $2
               AND a.attnum > 0
               AND NOT a.attisdropped
             ORDER BY a.attnum",
            &[&schema, &table],
        )
        .await
        .with_context(|| format!("Failed to get columns for table '{}'.'{}'", schema, table))?;

    let columns = rows
        .iter()
        .map(|row| ColumnMeta {
            name: row.get(0),
            type_name: row.get(1),
            nullable: row.get(2),
            default: row.get(3),
        })
        .collect();

    Ok(columns)
}

/// List foreign-key edges within a schema as (child table, parent table) pairs
///
/// Self-references are reported as-is; the planner skips them. Only
/// constraints whose child lives in the given schema are considered.
pub async fn foreign_key_edges(client: &Client, schema: &str) -> Result<Vec<(String, String)>> {
    let rows = client
        .query(
            "SELECT DISTINCT child.relname, parent.relname
             FROM pg_catalog.pg_constraint con
             JOIN pg_catalog.pg_class child ON con.conrelid = child.oid
             JOIN pg_catalog.pg_class parent ON con.confrelid = parent.oid
             JOIN pg_catalog.pg_namespace n ON child.relnamespace = n.oid
             WHERE con.contype = 'f'
               AND n.nspname = $1
             ORDER BY 1, 2",
            &[&schema],
        )
        .await
        .with_context(|| format!("Failed to list foreign keys in schema '{}'", schema))?;

    Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
}

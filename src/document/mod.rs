// ABOUTME: Snapshot document model with typed cell values
// ABOUTME: Defines column metadata, rows, and per-table snapshots

pub mod store;

use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scalar value carried through the pipeline
///
/// Values keep their native type from export to restore and are only rendered
/// to text at the insert boundary. The JSON encoding is untagged: null, bool,
/// number, or string. Timestamps serialize as RFC 3339 strings and any string
/// that parses as RFC 3339 deserializes back into `Timestamp`, so a snapshot
/// round-trips losslessly.
///
/// The legacy exports stringified nulls as the literal `"None"`; that sentinel
/// is still treated as absent everywhere, see [`CellValue::is_absent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

/// The text literal PostgreSQL's float input accepts for a non-finite value
fn non_finite_literal(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

impl CellValue {
    /// Tag a float value, downgrading non-finite values to text
    ///
    /// JSON has no encoding for NaN or the infinities; serde_json writes them
    /// as `null`, which would turn a present value into an absent one. The
    /// text literals round-trip through the snapshot and are accepted by
    /// PostgreSQL's float input on restore.
    pub fn from_f64(value: f64) -> CellValue {
        if value.is_finite() {
            CellValue::Float(value)
        } else {
            CellValue::Text(non_finite_literal(value).to_string())
        }
    }

    /// True when the value must be treated as missing: SQL NULL or the legacy
    /// `"None"` sentinel string.
    pub fn is_absent(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s == "None",
            _ => false,
        }
    }

    /// Render the value in the text form PostgreSQL's input functions accept.
    ///
    /// Returns `None` for `Null`; absent values never reach an INSERT, so the
    /// restore path only ever binds `Some` renderings.
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(f) if !f.is_finite() => Some(non_finite_literal(*f).to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

/// One row of one table: column name to value
pub type Row = BTreeMap<String, CellValue>;

/// Metadata for one column of one table, captured at export time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Full contents of one table: column metadata plus every row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<ColumnDescriptor>,
    pub row_count: u64,
    pub rows: Vec<Row>,
}

impl TableSnapshot {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            row_count: rows.len() as u64,
            rows,
        }
    }

    /// Check the `row_count == rows.len()` invariant
    ///
    /// Enforced when a document is loaded from disk; a mismatch means the file
    /// was edited or truncated and the run must not proceed on it.
    pub fn validate(&self, table: &str) -> Result<()> {
        if self.row_count != self.rows.len() as u64 {
            bail!(
                "Snapshot for table '{}' is inconsistent: row_count says {} but {} rows are present",
                table,
                self.row_count,
                self.rows.len()
            );
        }
        Ok(())
    }
}

/// A whole-schema export: table name to its snapshot
pub type SnapshotDocument = BTreeMap<String, TableSnapshot>;

/// A cleaned document ready for restore: table name to row list, metadata dropped
pub type CleanedDocument = BTreeMap<String, Vec<Row>>;

// ABOUTME: Null/completeness report over a snapshot document
// ABOUTME: Counts absent values per column to drive offline cleaning

use crate::document::SnapshotDocument;
use std::collections::BTreeMap;

/// Absent-value statistics for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullColumnStats {
    /// Rows where the value is NULL or the legacy "None" sentinel
    pub null_count: u64,
    /// Whether the column was declared nullable at export time
    pub declared_nullable: bool,
}

/// Per-table, per-column absent-value report
pub type NullReport = BTreeMap<String, BTreeMap<String, NullColumnStats>>;

/// Analyze a snapshot for columns with missing values
///
/// Empty tables are skipped; only columns with at least one absent value
/// appear in the report. The report never mutates the snapshot; what to do
/// about the gaps (defaults, placeholders, generated identifiers) is a
/// business decision taken during the offline cleaning step.
pub fn analyze_nulls(document: &SnapshotDocument) -> NullReport {
    let mut report = NullReport::new();

    for (table_name, snapshot) in document {
        if snapshot.rows.is_empty() {
            continue;
        }

        let mut null_counts: BTreeMap<String, u64> = BTreeMap::new();
        for row in &snapshot.rows {
            for (column, value) in row {
                if value.is_absent() {
                    *null_counts.entry(column.clone()).or_default() += 1;
                }
            }
        }

        if null_counts.is_empty() {
            continue;
        }

        let columns = null_counts
            .into_iter()
            .map(|(column, null_count)| {
                let declared_nullable = snapshot
                    .columns
                    .iter()
                    .find(|c| c.name == column)
                    .map(|c| c.nullable)
                    // Unknown columns are reported as nullable rather than dropped
                    .unwrap_or(true);
                (
                    column,
                    NullColumnStats {
                        null_count,
                        declared_nullable,
                    },
                )
            })
            .collect();

        report.insert(table_name.clone(), columns);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellValue, ColumnDescriptor, Row, TableSnapshot};

    fn column(name: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            sql_type: "text".to_string(),
            nullable,
            default: None,
        }
    }

    fn row(fields: &[(&str, CellValue)]) -> Row {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn counts_nulls_and_none_sentinels() {
        let snapshot = TableSnapshot::new(
            vec![column("ci", false), column("nombre", true)],
            vec![
                row(&[("ci", CellValue::Null), ("nombre", CellValue::Text("Ana".into()))]),
                row(&[
                    ("ci", CellValue::Text("None".into())),
                    ("nombre", CellValue::Null),
                ]),
                row(&[
                    ("ci", CellValue::Text("41234567".into())),
                    ("nombre", CellValue::Text("Juan".into())),
                ]),
            ],
        );
        let mut document = SnapshotDocument::new();
        document.insert("usuario_salud".to_string(), snapshot);

        let report = analyze_nulls(&document);
        let table = &report["usuario_salud"];
        assert_eq!(table["ci"].null_count, 2);
        assert!(!table["ci"].declared_nullable);
        assert_eq!(table["nombre"].null_count, 1);
        assert!(table["nombre"].declared_nullable);
    }

    #[test]
    fn complete_columns_are_not_reported() {
        let snapshot = TableSnapshot::new(
            vec![column("id", false)],
            vec![row(&[("id", CellValue::Integer(1))])],
        );
        let mut document = SnapshotDocument::new();
        document.insert("clinica".to_string(), snapshot);

        let report = analyze_nulls(&document);
        assert!(report.is_empty());
    }

    #[test]
    fn empty_tables_are_skipped() {
        let snapshot = TableSnapshot::new(vec![column("id", false)], vec![]);
        let mut document = SnapshotDocument::new();
        document.insert("notificacion".to_string(), snapshot);

        assert!(analyze_nulls(&document).is_empty());
    }
}

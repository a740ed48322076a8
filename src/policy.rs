// ABOUTME: Per-table field policies applied during restore
// ABOUTME: Ignore-lists, rename-maps, and null-skip for incoming rows

use crate::document::{CellValue, Row};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Restore-time rules for one table
///
/// - `ignore`: source columns dropped outright. Ignore wins over rename: an
///   ignored column never reaches the insert under either its old or new name.
/// - `rename`: source column to target column. Columns in neither set pass
///   through under their original name.
///
/// Absent values (NULL or the legacy `"None"` sentinel) are always dropped,
/// so the database applies its own defaults for omitted columns instead of
/// receiving explicit nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldPolicy {
    #[serde(default)]
    pub ignore: BTreeSet<String>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl FieldPolicy {
    /// The identity policy: every present field passes through unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build the effective field set for one row
    ///
    /// Returns target column name and value pairs, in deterministic source
    /// column order. An empty result means the row has nothing to insert and
    /// must be skipped.
    pub fn effective_fields(&self, row: &Row) -> Vec<(String, CellValue)> {
        row.iter()
            .filter(|(column, _)| !self.ignore.contains(*column))
            .filter(|(_, value)| !value.is_absent())
            .map(|(column, value)| {
                let target = self
                    .rename
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| column.clone());
                (target, value.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, CellValue)]) -> Row {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identity_policy_passes_fields_through() {
        let policy = FieldPolicy::identity();
        let fields = policy.effective_fields(&row(&[
            ("id", CellValue::Integer(1)),
            ("name", CellValue::Text("Ana".into())),
        ]));
        assert_eq!(
            fields,
            vec![
                ("id".to_string(), CellValue::Integer(1)),
                ("name".to_string(), CellValue::Text("Ana".into())),
            ]
        );
    }

    #[test]
    fn null_and_none_never_reach_effective_fields() {
        let policy = FieldPolicy::identity();
        let fields = policy.effective_fields(&row(&[
            ("a", CellValue::Null),
            ("b", CellValue::Text("None".into())),
            ("c", CellValue::Text("kept".into())),
        ]));
        assert_eq!(
            fields,
            vec![("c".to_string(), CellValue::Text("kept".into()))]
        );
    }

    #[test]
    fn rename_replaces_source_name() {
        let policy = FieldPolicy {
            rename: BTreeMap::from([("cedula".to_string(), "ci".to_string())]),
            ..Default::default()
        };
        let fields =
            policy.effective_fields(&row(&[("cedula", CellValue::Text("12345".into()))]));
        assert_eq!(
            fields,
            vec![("ci".to_string(), CellValue::Text("12345".into()))]
        );
        assert!(!fields.iter().any(|(name, _)| name == "cedula"));
    }

    #[test]
    fn ignore_takes_precedence_over_rename() {
        let policy = FieldPolicy {
            ignore: BTreeSet::from(["tenant_id".to_string()]),
            rename: BTreeMap::from([("tenant_id".to_string(), "tid".to_string())]),
        };
        let fields = policy.effective_fields(&row(&[
            ("tenant_id", CellValue::Integer(7)),
            ("nombre", CellValue::Text("Clinica Norte".into())),
        ]));
        assert!(!fields.iter().any(|(name, _)| name == "tenant_id"));
        assert!(!fields.iter().any(|(name, _)| name == "tid"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn all_fields_absent_yields_empty_set() {
        let policy = FieldPolicy::identity();
        let fields = policy.effective_fields(&row(&[
            ("a", CellValue::Null),
            ("b", CellValue::Text("None".into())),
        ]));
        assert!(fields.is_empty());
    }
}

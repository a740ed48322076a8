// ABOUTME: End-to-end document pipeline tests without a database
// ABOUTME: Snapshot files, latest selection, analysis, and policy application

use postgres_snapshot_restore::document::store;
use postgres_snapshot_restore::document::{
    CellValue, CleanedDocument, ColumnDescriptor, Row, SnapshotDocument, TableSnapshot,
};
use postgres_snapshot_restore::policy::FieldPolicy;
use postgres_snapshot_restore::snapshot::analyzer;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tempfile::tempdir;

fn make_row(fields: &[(&str, CellValue)]) -> Row {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn sample_snapshot() -> SnapshotDocument {
    let columns = vec![
        ColumnDescriptor {
            name: "ci".to_string(),
            sql_type: "varchar".to_string(),
            nullable: false,
            default: None,
        },
        ColumnDescriptor {
            name: "nombre".to_string(),
            sql_type: "text".to_string(),
            nullable: true,
            default: None,
        },
    ];
    let rows = vec![
        make_row(&[
            ("ci", CellValue::Text("41234567".into())),
            ("nombre", CellValue::Text("Ana".into())),
        ]),
        make_row(&[("ci", CellValue::Null), ("nombre", CellValue::Text("None".into()))]),
    ];
    let mut document = SnapshotDocument::new();
    document.insert(
        "usuario_salud".to_string(),
        TableSnapshot::new(columns, rows),
    );
    document
}

#[test]
fn snapshot_file_round_trip_preserves_values_and_metadata() {
    let dir = tempdir().unwrap();
    let document = sample_snapshot();

    let path = store::write_snapshot(dir.path(), "hcen", &document).unwrap();
    let loaded = store::load_snapshot(&path).unwrap();

    assert_eq!(loaded["usuario_salud"].row_count, 2);
    assert_eq!(loaded["usuario_salud"].columns, document["usuario_salud"].columns);
    assert_eq!(loaded["usuario_salud"].rows, document["usuario_salud"].rows);
}

#[test]
fn latest_snapshot_then_analysis() {
    let dir = tempdir().unwrap();

    // An older snapshot with different content must not be selected
    fs::write(
        dir.path().join("backup_hcen_20200101_000000.json"),
        "{}",
    )
    .unwrap();
    store::write_snapshot(dir.path(), "hcen", &sample_snapshot()).unwrap();

    let latest = store::find_latest_snapshot(dir.path(), "hcen").unwrap();
    let document = store::load_snapshot(&latest).unwrap();
    let report = analyzer::analyze_nulls(&document);

    let table = &report["usuario_salud"];
    assert_eq!(table["ci"].null_count, 1);
    assert!(!table["ci"].declared_nullable);
    assert_eq!(table["nombre"].null_count, 1);
    assert!(table["nombre"].declared_nullable);
}

#[test]
fn cleaned_document_loads_and_policies_apply() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(store::CLEANED_DOCUMENT_FILENAME);
    fs::write(
        &path,
        r#"{
            "usuario_salud": [
                {"cedula": "12345", "tenant_id": 7, "apellidos": null, "activo": true}
            ]
        }"#,
    )
    .unwrap();

    let cleaned: CleanedDocument = store::load_cleaned(&path).unwrap();
    let policy = FieldPolicy {
        ignore: BTreeSet::from(["tenant_id".to_string()]),
        rename: BTreeMap::from([("cedula".to_string(), "ci".to_string())]),
    };

    let fields = policy.effective_fields(&cleaned["usuario_salud"][0]);
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();

    assert_eq!(names, vec!["activo", "ci"]);
    assert!(fields
        .iter()
        .any(|(n, v)| n == "ci" && *v == CellValue::Text("12345".into())));
}

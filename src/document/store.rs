// ABOUTME: Reads and writes snapshot and cleaned documents on disk
// ABOUTME: Handles timestamped filenames and latest-snapshot selection

use crate::document::{CleanedDocument, SnapshotDocument};
use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Default filename for a cleaned document awaiting restore
pub const CLEANED_DOCUMENT_FILENAME: &str = "clean_data_to_insert.json";

/// Build the filename for a new snapshot: `backup_<system>_<YYYYMMDD_HHMMSS>.json`
///
/// The timestamp format sorts lexicographically in chronological order, which
/// is what makes [`find_latest_snapshot`] a plain string max.
pub fn snapshot_filename(system: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("backup_{}_{}.json", system, timestamp)
}

/// Persist a snapshot document, pretty-printed, under a timestamped name
///
/// The write goes through a temp file in the same directory and an atomic
/// rename, so a crashed run never leaves a truncated snapshot behind.
///
/// # Returns
///
/// The path of the written snapshot file.
pub fn write_snapshot(dir: &Path, system: &str, document: &SnapshotDocument) -> Result<PathBuf> {
    let path = dir.join(snapshot_filename(system));
    write_pretty_json(&path, document)?;
    tracing::info!("Snapshot written to {}", path.display());
    Ok(path)
}

/// True when `s` has the exact `YYYYMMDD_HHMMSS` shape
///
/// The prefix check alone is not enough to attribute a file to a system: with
/// systems `hcen` and `hcen_periferico` side by side, the latter's files also
/// start with `backup_hcen_`. Requiring the remainder to be a bare timestamp
/// pins each file to exactly one system label.
fn is_snapshot_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'_'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

/// Find the most recent snapshot for a system in a directory
///
/// Selects the lexicographic maximum over filenames of the form
/// `backup_<system>_<YYYYMMDD_HHMMSS>.json` for exactly this system.
///
/// # Errors
///
/// Fails with a clear diagnostic when no matching file exists; there is no
/// fallback snapshot.
pub fn find_latest_snapshot(dir: &Path, system: &str) -> Result<PathBuf> {
    let prefix = format!("backup_{}_", system);

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read snapshot directory {}", dir.display()))?;

    let latest = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .map(is_snapshot_timestamp)
                .unwrap_or(false)
        })
        .max();

    match latest {
        Some(name) => Ok(dir.join(name)),
        None => bail!(
            "No snapshot file matching '{}*.json' found in {}. Run 'export' first.",
            prefix,
            dir.display()
        ),
    }
}

/// Load and validate a snapshot document
///
/// Every table is checked against the `row_count == rows.len()` invariant; a
/// malformed or inconsistent file aborts before any database interaction.
pub fn load_snapshot(path: &Path) -> Result<SnapshotDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    let document: SnapshotDocument = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot JSON at {}", path.display()))?;

    for (table, snapshot) in &document {
        snapshot
            .validate(table)
            .with_context(|| format!("Invalid snapshot at {}", path.display()))?;
    }

    Ok(document)
}

/// Load a cleaned document produced by the offline cleaning step
pub fn load_cleaned(path: &Path) -> Result<CleanedDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cleaned document {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse cleaned document JSON at {}", path.display()))
}

fn write_pretty_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create output directory {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    serde_json::to_writer_pretty(tmp.as_file_mut(), value)
        .with_context(|| format!("Failed to serialize document for {}", path.display()))?;

    tmp.persist(path)
        .with_context(|| format!("Failed to persist document at {}", path.display()))?;

    Ok(())
}

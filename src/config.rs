// ABOUTME: Parses run configuration from TOML into an injected RunConfig
// ABOUTME: Holds snapshot settings, field policies, and the insertion plan

use crate::policy::FieldPolicy;
use crate::utils;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    snapshot: RawSnapshotConfig,
    #[serde(default)]
    restore: RawRestoreConfig,
}

#[derive(Debug, Deserialize, Default)]
struct RawSnapshotConfig {
    system: Option<String>,
    schema: Option<String>,
    directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawRestoreConfig {
    /// Explicit insertion order; omit to compute one from foreign keys
    plan: Option<Vec<String>>,
    #[serde(default)]
    tables: BTreeMap<String, FieldPolicy>,
}

/// Everything one run needs, constructed once and passed explicitly
///
/// Nothing in the pipeline reads configuration from global state; commands
/// receive this struct (plus the connection URL from the CLI) and hand the
/// relevant parts to the exporter, analyzer, or importer.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Label used in snapshot filenames (`backup_<system>_<timestamp>.json`)
    pub system: String,
    /// Schema whose base tables are exported and restored
    pub schema: String,
    /// Directory where snapshots are written and looked up
    pub snapshot_dir: PathBuf,
    /// Per-table restore policies; tables without an entry get the identity policy
    pub policies: BTreeMap<String, FieldPolicy>,
    /// Operator-supplied insertion order, overriding the computed one
    pub plan: Option<Vec<String>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            system: "database".to_string(),
            schema: "public".to_string(),
            snapshot_dir: PathBuf::from("."),
            policies: BTreeMap::new(),
            plan: None,
        }
    }
}

impl RunConfig {
    /// The field policy for a table, or the identity policy if none is configured
    pub fn policy_for(&self, table: &str) -> FieldPolicy {
        self.policies
            .get(table)
            .cloned()
            .unwrap_or_else(FieldPolicy::identity)
    }
}

/// Load a `RunConfig` from a TOML file, or the defaults when no path is given
pub fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    let raw = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            toml::from_str::<RawConfig>(&contents)
                .with_context(|| format!("Failed to parse TOML config at {}", path.display()))?
        }
        None => RawConfig::default(),
    };

    let defaults = RunConfig::default();
    let config = RunConfig {
        system: raw.snapshot.system.unwrap_or(defaults.system),
        schema: raw.snapshot.schema.unwrap_or(defaults.schema),
        snapshot_dir: raw.snapshot.directory.unwrap_or(defaults.snapshot_dir),
        policies: raw.restore.tables,
        plan: raw.restore.plan,
    };

    utils::validate_postgres_identifier(&config.system)
        .context("Invalid snapshot system label")?;
    utils::validate_postgres_identifier(&config.schema).context("Invalid schema name")?;
    for table in config.policies.keys() {
        utils::validate_postgres_identifier(table)
            .with_context(|| format!("Invalid table name '{}' in [restore.tables]", table))?;
    }
    if let Some(ref plan) = config.plan {
        for table in plan {
            utils::validate_postgres_identifier(table)
                .with_context(|| format!("Invalid table name '{}' in restore plan", table))?;
        }
    }

    Ok(config)
}

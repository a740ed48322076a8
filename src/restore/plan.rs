// ABOUTME: Insertion-order planning from foreign-key dependencies
// ABOUTME: Deterministic topological sort with name-order tie breaking

use crate::postgres::schema;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use tokio_postgres::Client;

/// Compute an insertion plan for a schema from its foreign keys
///
/// Introspects the target schema and orders tables so that every parent
/// precedes its children. The operator can still override this with an
/// explicit `plan` in the config, but the computed order keeps the restore
/// correct as the schema evolves.
pub async fn compute_insertion_plan(client: &Client, schema_name: &str) -> Result<Vec<String>> {
    let tables = schema::list_base_tables(client, schema_name).await?;
    let edges = schema::foreign_key_edges(client, schema_name).await?;
    Ok(topo_order(&tables, &edges))
}

/// Order tables so parents come before children
///
/// Kahn's algorithm with name-ordered tie breaking, so the same schema always
/// produces the same plan. Self-references are ignored; edges naming unknown
/// tables are ignored. If a dependency cycle remains (deferrable FK loops),
/// the leftover tables are appended in name order with a warning; their rows
/// may fail and be skipped, which matches the row-level recovery contract.
pub fn topo_order(tables: &[String], edges: &[(String, String)]) -> Vec<String> {
    let known: BTreeSet<&str> = tables.iter().map(String::as_str).collect();

    // child -> set of parents still unresolved
    let mut pending_parents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut children_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (child, parent) in edges {
        if child == parent {
            continue;
        }
        if !known.contains(child.as_str()) || !known.contains(parent.as_str()) {
            continue;
        }
        pending_parents
            .entry(child.as_str())
            .or_default()
            .insert(parent.as_str());
        children_of
            .entry(parent.as_str())
            .or_default()
            .insert(child.as_str());
    }

    let mut ready: BTreeSet<&str> = tables
        .iter()
        .map(String::as_str)
        .filter(|t| !pending_parents.contains_key(t))
        .collect();
    let mut ordered = Vec::with_capacity(tables.len());

    while let Some(&next) = ready.iter().next() {
        ready.remove(next);
        ordered.push(next.to_string());

        if let Some(children) = children_of.get(next) {
            for &child in children {
                if let Some(parents) = pending_parents.get_mut(child) {
                    parents.remove(next);
                    if parents.is_empty() {
                        pending_parents.remove(child);
                        ready.insert(child);
                    }
                }
            }
        }
    }

    if !pending_parents.is_empty() {
        let leftover: Vec<&str> = pending_parents.keys().copied().collect();
        tracing::warn!(
            "Foreign-key cycle among tables {:?}; appending them in name order",
            leftover
        );
        for table in leftover {
            ordered.push(table.to_string());
        }
    }

    ordered
}

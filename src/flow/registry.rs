//! Per-scope flow catalogs using ArcSwap
//!
//! A `FlowCatalog` is the ordered list of flow ids belonging to one zone/region. It
//! holds ids only; the flows themselves live in the persistence collaborator. The
//! registry keeps one entry per scope behind an atomic pointer, so lookups never
//! block and every update swaps in a complete new map.
//!
//! A scope's catalog is loaded from storage on first request, and creations keep it
//! current afterwards. Creations in a scope that has not been loaded yet are
//! remembered as pending ids and merged in by `install`, so a creation racing the
//! first load is never lost.

use crate::flow::types::FlowId;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

/// Ordered, non-owning references to the flows of one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCatalog {
    pub scope: String,
    pub flow_ids: Vec<FlowId>,
}

impl FlowCatalog {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            flow_ids: Vec::new(),
        }
    }

    pub fn contains(&self, id: FlowId) -> bool {
        self.flow_ids.contains(&id)
    }

    /// Add an id at the end unless it is already listed.
    fn push(&mut self, id: FlowId) {
        if !self.contains(id) {
            self.flow_ids.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.flow_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flow_ids.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ScopeEntry {
    catalog: FlowCatalog,
    /// False while only creations have been seen for this scope
    loaded: bool,
}

/// Lock-free map of scope -> catalog
#[derive(Debug)]
pub struct FlowRegistry {
    entries: ArcSwap<HashMap<String, ScopeEntry>>,
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// The catalog of a scope, if it has been loaded.
    pub fn get(&self, scope: &str) -> Option<FlowCatalog> {
        self.entries
            .load()
            .get(scope)
            .filter(|entry| entry.loaded)
            .map(|entry| entry.catalog.clone())
    }

    /// Install a catalog read from storage.
    ///
    /// An already loaded catalog wins and is returned unchanged. Otherwise ids
    /// appended while the catalog was being read are merged in after the stored
    /// ones.
    pub fn install(&self, catalog: FlowCatalog) -> FlowCatalog {
        let scope = catalog.scope.clone();
        self.entries.rcu(|current| {
            let mut merged = catalog.clone();
            match current.get(&scope) {
                Some(entry) if entry.loaded => return Arc::clone(current),
                Some(pending) => {
                    for id in &pending.catalog.flow_ids {
                        merged.push(*id);
                    }
                }
                None => {}
            }

            let mut next = HashMap::clone(current);
            next.insert(
                scope.clone(),
                ScopeEntry {
                    catalog: merged,
                    loaded: true,
                },
            );
            Arc::new(next)
        });

        self.get(&scope).unwrap_or(catalog)
    }

    /// Record a newly created flow at the end of its scope's catalog.
    ///
    /// For a scope that is not loaded yet the id is kept pending until `install`.
    pub fn append(&self, scope: &str, id: FlowId) {
        self.entries.rcu(|current| {
            if current
                .get(scope)
                .is_some_and(|entry| entry.catalog.contains(id))
            {
                return Arc::clone(current);
            }

            let mut next = HashMap::clone(current);
            next.entry(scope.to_string())
                .or_insert_with(|| ScopeEntry {
                    catalog: FlowCatalog::new(scope),
                    loaded: false,
                })
                .catalog
                .push(id);
            Arc::new(next)
        });
    }
}

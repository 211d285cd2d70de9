//! In-memory flow storage using ArcSwap
//!
//! Readers load the current map snapshot without locking. Every write builds a new
//! map and swaps the pointer atomically, so a reader sees either the old record or
//! the new one, never a partial write. Used by tests and by servers started with
//! `ZONEFLOW_IN_MEMORY=true`.

use crate::error::PersistenceError;
use crate::flow::storage::FlowPersistence;
use crate::flow::types::{AutomationFlow, FlowId};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct MemoryFlowStorage {
    /// Insertion-ordered records; key order is creation order
    flows: ArcSwap<IndexMap<FlowId, AutomationFlow>>,
}

impl MemoryFlowStorage {
    pub fn new() -> Self {
        Self {
            flows: ArcSwap::new(Arc::new(IndexMap::new())),
        }
    }
}

#[async_trait]
impl FlowPersistence for MemoryFlowStorage {
    async fn get(&self, id: FlowId) -> Result<Option<AutomationFlow>, PersistenceError> {
        Ok(self.flows.load().get(&id).cloned())
    }

    async fn put(&self, id: FlowId, flow: &AutomationFlow) -> Result<(), PersistenceError> {
        // Clone current map, replace one record, swap the pointer
        self.flows.rcu(|current| {
            let mut next = IndexMap::clone(current);
            next.insert(id, flow.clone());
            next
        });

        tracing::debug!("Stored flow {} (version {}) in memory", id, flow.version);
        Ok(())
    }

    async fn list(&self, scope: &str) -> Result<Vec<AutomationFlow>, PersistenceError> {
        Ok(self
            .flows
            .load()
            .values()
            .filter(|flow| flow.scope == scope)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::OwnerContext;

    #[tokio::test]
    async fn put_then_get_and_list_by_scope() {
        let storage = MemoryFlowStorage::new();
        let zone_a = OwnerContext::new("zone-a", "ops");
        let zone_b = OwnerContext::new("zone-b", "ops");

        let first = AutomationFlow::draft("first", "", &zone_a);
        let second = AutomationFlow::draft("second", "", &zone_b);
        let third = AutomationFlow::draft("third", "", &zone_a);
        for flow in [&first, &second, &third] {
            storage.put(flow.id, flow).await.unwrap();
        }

        assert_eq!(storage.get(second.id).await.unwrap(), Some(second.clone()));
        assert_eq!(storage.get(FlowId::new()).await.unwrap(), None);

        let names: Vec<_> = storage
            .list("zone-a")
            .await
            .unwrap()
            .into_iter()
            .map(|flow| flow.name)
            .collect();
        assert_eq!(names, vec!["first", "third"]);
        assert_eq!(storage.list("zone-b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replacing_keeps_creation_order() {
        let storage = MemoryFlowStorage::new();
        let owner = OwnerContext::new("zone-a", "ops");
        let mut first = AutomationFlow::draft("first", "", &owner);
        let second = AutomationFlow::draft("second", "", &owner);
        storage.put(first.id, &first).await.unwrap();
        storage.put(second.id, &second).await.unwrap();

        first.name = "renamed".to_string();
        storage.put(first.id, &first).await.unwrap();

        let listed = storage.list("zone-a").await.unwrap();
        assert_eq!(listed[0].name, "renamed");
        assert_eq!(listed[1].id, second.id);
    }
}

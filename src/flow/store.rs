//! Versioned flow lifecycle
//!
//! `FlowStore` creates, loads, saves and transitions `AutomationFlow` records on top
//! of a `FlowPersistence` collaborator. It owns the versioning rule (one increment per
//! graph-changing save) and the status machine (Draft -> Active -> Archived, plus
//! Draft -> Archived). Concurrent saves of one flow are last-writer-wins; there is no
//! optimistic concurrency check.

use crate::error::FlowError;
use crate::flow::registry::{FlowCatalog, FlowRegistry};
use crate::flow::storage::FlowPersistence;
use crate::flow::types::{AutomationFlow, FlowId, FlowStatus, FlowSummary, OwnerContext};
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;

pub struct FlowStore {
    persistence: Arc<dyn FlowPersistence>,
    registry: FlowRegistry,
}

impl FlowStore {
    pub fn new(persistence: Arc<dyn FlowPersistence>) -> Self {
        Self {
            persistence,
            registry: FlowRegistry::new(),
        }
    }

    /// Create and persist a new Draft flow at version 1 with an empty graph.
    pub async fn create_flow(
        &self,
        name: &str,
        description: &str,
        owner: &OwnerContext,
    ) -> Result<AutomationFlow, FlowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FlowError::EmptyName);
        }

        let flow = AutomationFlow::draft(name, description, owner);
        self.persistence.put(flow.id, &flow).await?;
        self.registry.append(&flow.scope, flow.id);

        tracing::info!("Created flow {} ({}) in scope {}", flow.id, flow.name, flow.scope);
        Ok(flow)
    }

    /// The exact last-saved state of a flow.
    pub async fn load_flow(&self, id: FlowId) -> Result<AutomationFlow, FlowError> {
        self.persistence
            .get(id)
            .await?
            .ok_or(FlowError::FlowNotFound(id))
    }

    /// Persist name, description and graph of `flow`.
    ///
    /// Identity, ownership, creation time and status always come from the stored
    /// record; status only changes through `activate_flow`/`archive_flow`. The version
    /// grows by one iff the graph differs from the stored graph. `last_modified` is
    /// refreshed either way.
    pub async fn save_flow(&self, flow: &AutomationFlow) -> Result<AutomationFlow, FlowError> {
        let stored = self.load_flow(flow.id).await?;
        if !stored.status.is_editable() {
            tracing::warn!("Rejected save of archived flow {}", flow.id);
            return Err(FlowError::FlowImmutable(flow.id));
        }

        let name = flow.name.trim();
        if name.is_empty() {
            return Err(FlowError::EmptyName);
        }

        let graph_changed = stored.graph != flow.graph;
        let saved = AutomationFlow {
            name: name.to_string(),
            description: flow.description.clone(),
            graph: flow.graph.clone(),
            last_modified: Utc::now(),
            version: if graph_changed {
                stored.version + 1
            } else {
                stored.version
            },
            ..stored
        };

        let report = saved.graph.validate();
        if report.has_cycles() {
            tracing::warn!(
                "Flow {} saved with cyclic actions: {:?}",
                saved.id,
                saved.graph.detect_cycles()
            );
        }

        self.persistence.put(saved.id, &saved).await?;

        if graph_changed {
            tracing::info!("Saved flow {} as version {}", saved.id, saved.version);
        } else {
            tracing::debug!("Saved flow {} without graph changes (version {})", saved.id, saved.version);
        }
        Ok(saved)
    }

    /// Lazy, restartable listing of the flows in a scope.
    pub fn list_flows(&self, scope: &str) -> FlowListing {
        FlowListing {
            persistence: Arc::clone(&self.persistence),
            scope: scope.to_string(),
        }
    }

    /// Draft -> Active. Cyclic graphs may be activated; the editing layer does not
    /// decide how an execution engine would treat them.
    pub async fn activate_flow(&self, id: FlowId) -> Result<AutomationFlow, FlowError> {
        self.transition(id, FlowStatus::Active).await
    }

    /// Draft or Active -> Archived. Archived flows reject every later save.
    pub async fn archive_flow(&self, id: FlowId) -> Result<AutomationFlow, FlowError> {
        self.transition(id, FlowStatus::Archived).await
    }

    /// Ordered flow ids of a scope.
    ///
    /// Loaded from storage on first request, then kept current by `create_flow`.
    /// Flows created while the first load is in flight are merged into it.
    pub async fn flow_catalog(&self, scope: &str) -> Result<FlowCatalog, FlowError> {
        if let Some(catalog) = self.registry.get(scope) {
            return Ok(catalog);
        }

        let flows = self.persistence.list(scope).await?;
        let catalog = FlowCatalog {
            scope: scope.to_string(),
            flow_ids: flows.iter().map(|flow| flow.id).collect(),
        };

        tracing::debug!("Loaded catalog for scope {} with {} flows", scope, catalog.len());
        Ok(self.registry.install(catalog))
    }

    async fn transition(&self, id: FlowId, to: FlowStatus) -> Result<AutomationFlow, FlowError> {
        let mut flow = self.load_flow(id).await?;
        let from = flow.status;

        if !from.can_transition_to(to) {
            tracing::warn!("Rejected transition of flow {} from {} to {}", id, from, to);
            return Err(FlowError::InvalidTransition { id, from, to });
        }

        flow.status = to;
        flow.last_modified = Utc::now();
        self.persistence.put(id, &flow).await?;

        tracing::info!("Flow {} moved from {} to {}", id, from, to);
        Ok(flow)
    }
}

/// Deferred listing of one scope's flows
///
/// Holding a listing costs nothing; storage is read only when a stream returned by
/// `stream` is polled, and each call to `stream` starts over.
pub struct FlowListing {
    persistence: Arc<dyn FlowPersistence>,
    scope: String,
}

impl FlowListing {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Summaries in storage order (creation order).
    pub fn stream(&self) -> BoxStream<'static, Result<FlowSummary, FlowError>> {
        let persistence = Arc::clone(&self.persistence);
        let scope = self.scope.clone();

        stream::once(async move { persistence.list(&scope).await })
            .map_err(FlowError::from)
            .map_ok(|flows| stream::iter(flows.into_iter().map(|flow| Ok::<_, FlowError>(flow.summary()))))
            .try_flatten()
            .boxed()
    }

    /// Drain a fresh stream into a vector.
    pub async fn collect(&self) -> Result<Vec<FlowSummary>, FlowError> {
        self.stream().try_collect().await
    }
}

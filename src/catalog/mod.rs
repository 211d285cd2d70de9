//! Node template catalog
//!
//! Read-only registry of the node templates a flow can be built from, grouped by
//! node kind. The built-in catalog is initialised once per process on first use and
//! never mutated afterwards; embedders and tests may build their own with
//! [`NodeCatalog::new`].

use crate::flow::types::NodeKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A selectable node template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub kind: NodeKind,
    /// Stable template key stored on nodes (e.g. "restart_service")
    pub subtype: String,
    pub label: String,
    pub description: String,
}

impl NodeTemplate {
    pub fn new(kind: NodeKind, subtype: &str, label: &str, description: &str) -> Self {
        Self {
            kind,
            subtype: subtype.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// Ordered templates per node kind
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    triggers: Vec<NodeTemplate>,
    actions: Vec<NodeTemplate>,
    outcomes: Vec<NodeTemplate>,
}

static BUILTIN: Lazy<NodeCatalog> = Lazy::new(|| NodeCatalog::new(builtin_templates()));

impl NodeCatalog {
    /// Build a catalog from templates, keeping input order per kind.
    ///
    /// A repeated (kind, subtype) pair keeps the first template.
    pub fn new(templates: impl IntoIterator<Item = NodeTemplate>) -> Self {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for template in templates {
            if !seen.insert((template.kind, template.subtype.clone())) {
                tracing::warn!(
                    "Ignoring duplicate {} template '{}'",
                    template.kind,
                    template.subtype
                );
                continue;
            }
            catalog.bucket_mut(template.kind).push(template);
        }

        catalog
    }

    /// The process-wide built-in catalog.
    pub fn builtin() -> &'static NodeCatalog {
        &BUILTIN
    }

    /// Templates for `kind`, in catalog order.
    pub fn list_templates(&self, kind: NodeKind) -> &[NodeTemplate] {
        match kind {
            NodeKind::Trigger => &self.triggers,
            NodeKind::Action => &self.actions,
            NodeKind::Outcome => &self.outcomes,
        }
    }

    pub fn template(&self, kind: NodeKind, subtype: &str) -> Option<&NodeTemplate> {
        self.list_templates(kind)
            .iter()
            .find(|template| template.subtype == subtype)
    }

    pub fn template_exists(&self, kind: NodeKind, subtype: &str) -> bool {
        self.template(kind, subtype).is_some()
    }

    /// Total number of templates across all kinds.
    pub fn len(&self) -> usize {
        self.triggers.len() + self.actions.len() + self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, kind: NodeKind) -> &mut Vec<NodeTemplate> {
        match kind {
            NodeKind::Trigger => &mut self.triggers,
            NodeKind::Action => &mut self.actions,
            NodeKind::Outcome => &mut self.outcomes,
        }
    }
}

/// Templates shipped with the builder for zone/region operations
fn builtin_templates() -> Vec<NodeTemplate> {
    use NodeKind::*;

    vec![
        // Triggers
        NodeTemplate::new(Trigger, "schedule", "Scheduled Time", "Start the flow on a recurring schedule"),
        NodeTemplate::new(Trigger, "alert", "Monitoring Alert", "Start when a zone health alert fires"),
        NodeTemplate::new(Trigger, "webhook", "Webhook", "Start when an external system calls the flow endpoint"),
        NodeTemplate::new(Trigger, "manual", "Manual Run", "Start on demand from the dashboard"),
        // Actions
        NodeTemplate::new(Action, "patch_rollout", "Patch Rollout", "Roll a patch out across the zone in batches"),
        NodeTemplate::new(Action, "restart_service", "Restart Service", "Restart a service on the affected hosts"),
        NodeTemplate::new(Action, "snapshot_volume", "Snapshot Volume", "Take a snapshot of attached storage volumes"),
        NodeTemplate::new(Action, "scale_capacity", "Scale Capacity", "Add or remove capacity in the region"),
        NodeTemplate::new(Action, "run_script", "Run Script", "Execute a maintenance script on target hosts"),
        NodeTemplate::new(Action, "request_approval", "Request Approval", "Pause until an operator approves"),
        NodeTemplate::new(Action, "notify", "Notify", "Send a notification to the on-call channel"),
        // Outcomes
        NodeTemplate::new(Outcome, "succeeded", "Succeeded", "Mark the run as successful"),
        NodeTemplate::new(Outcome, "failed", "Failed", "Mark the run as failed"),
        NodeTemplate::new(Outcome, "rolled_back", "Rolled Back", "Record that changes were reverted"),
        NodeTemplate::new(Outcome, "open_ticket", "Open Ticket", "Open a support ticket with the run details"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_kind() {
        let catalog = NodeCatalog::builtin();
        for kind in NodeKind::ALL {
            let templates = catalog.list_templates(kind);
            assert!(!templates.is_empty(), "no templates for {kind}");
            assert!(templates.iter().all(|t| t.kind == kind));
        }
    }

    #[test]
    fn listing_is_deterministic() {
        let first: Vec<_> = NodeCatalog::builtin()
            .list_templates(NodeKind::Action)
            .iter()
            .map(|t| t.subtype.as_str())
            .collect();
        let again: Vec<_> = NodeCatalog::new(builtin_templates())
            .list_templates(NodeKind::Action)
            .iter()
            .map(|t| t.subtype.clone())
            .collect();

        assert_eq!(first, again);
        assert_eq!(first[0], "patch_rollout");
    }

    #[test]
    fn existence_is_scoped_by_kind() {
        let catalog = NodeCatalog::builtin();
        assert!(catalog.template_exists(NodeKind::Trigger, "schedule"));
        assert!(!catalog.template_exists(NodeKind::Action, "schedule"));
        assert!(!catalog.template_exists(NodeKind::Outcome, "does_not_exist"));
    }

    #[test]
    fn duplicates_keep_first_template() {
        let catalog = NodeCatalog::new([
            NodeTemplate::new(NodeKind::Action, "notify", "Notify", "first"),
            NodeTemplate::new(NodeKind::Action, "notify", "Notify again", "second"),
            NodeTemplate::new(NodeKind::Outcome, "notify", "Notified", "different kind"),
        ]);

        assert_eq!(catalog.len(), 2);
        let template = catalog.template(NodeKind::Action, "notify").unwrap();
        assert_eq!(template.description, "first");
    }
}

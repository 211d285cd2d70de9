//! End-to-end lifecycle scenarios against both storage collaborators.

use std::collections::BTreeSet;
use std::sync::Arc;

use zoneflow::flow::{
    AutomationFlow, FlowPersistence, FlowStatus, FlowStore, GraphEditor, MemoryFlowStorage, NodeId,
    NodeKind, OwnerContext, Position, SqliteFlowStorage,
};
use zoneflow::{EditError, FlowError};

fn ctx() -> OwnerContext {
    OwnerContext::new("ap-south/zone-1", "netops@example.com")
}

async fn sqlite_store() -> FlowStore {
    let storage = SqliteFlowStorage::in_memory().await.unwrap();
    FlowStore::new(Arc::new(storage))
}

fn memory_store() -> FlowStore {
    FlowStore::new(Arc::new(MemoryFlowStorage::new()))
}

async fn stores() -> Vec<FlowStore> {
    vec![memory_store(), sqlite_store().await]
}

fn add(flow: &AutomationFlow, kind: NodeKind, subtype: &str) -> (AutomationFlow, NodeId) {
    let (graph, id) = GraphEditor::default()
        .add_node(&flow.graph, kind, subtype, Position::default())
        .unwrap();
    (AutomationFlow { graph, ..flow.clone() }, id)
}

fn connect(flow: &AutomationFlow, source: NodeId, target: NodeId) -> AutomationFlow {
    let (graph, _) = GraphEditor::default().connect(&flow.graph, source, target).unwrap();
    AutomationFlow { graph, ..flow.clone() }
}

#[tokio::test]
async fn scenario_a_new_flow_is_empty_draft() {
    for store in stores().await {
        let flow = store.create_flow("Patch Rollout", "", &ctx()).await.unwrap();
        assert_eq!(flow.version, 1);
        assert_eq!(flow.status, FlowStatus::Draft);
        assert_eq!(flow.graph.node_count(), 0);
    }
}

#[tokio::test]
async fn load_returns_last_saved_flow_exactly() {
    for store in stores().await {
        let flow = store.create_flow("Restart on alert", "restart web tier", &ctx()).await.unwrap();
        let (flow, trigger) = add(&flow, NodeKind::Trigger, "alert");
        let (flow, action) = add(&flow, NodeKind::Action, "restart_service");
        let (flow, outcome) = add(&flow, NodeKind::Outcome, "succeeded");
        let flow = connect(&flow, trigger, action);
        let flow = connect(&flow, action, outcome);

        let saved = store.save_flow(&flow).await.unwrap();
        let loaded = store.load_flow(saved.id).await.unwrap();

        assert_eq!(loaded, saved);
        let ids: BTreeSet<_> = loaded.graph.nodes().map(|n| n.id).collect();
        assert_eq!(ids, BTreeSet::from([trigger, action, outcome]));
        assert_eq!(loaded.graph.edge_count(), 2);
    }
}

#[tokio::test]
async fn version_counts_distinct_graph_saves() {
    for store in stores().await {
        let mut flow = store.create_flow("Scale out", "", &ctx()).await.unwrap();
        let saves = 5;

        for _ in 0..saves {
            let (next, _) = add(&flow, NodeKind::Action, "scale_capacity");
            flow = store.save_flow(&next).await.unwrap();
            // an identical resubmission never counts
            flow = store.save_flow(&flow).await.unwrap();
        }

        assert_eq!(flow.version, 1 + saves);
        assert_eq!(store.load_flow(flow.id).await.unwrap().version, 1 + saves);
    }
}

#[tokio::test]
async fn moving_a_node_is_a_graph_change() {
    for store in stores().await {
        let flow = store.create_flow("Snapshots", "", &ctx()).await.unwrap();
        let (flow, id) = add(&flow, NodeKind::Action, "snapshot_volume");
        let flow = store.save_flow(&flow).await.unwrap();
        assert_eq!(flow.version, 2);

        let graph = GraphEditor::default()
            .move_node(&flow.graph, id, Position::new(300.0, 80.0))
            .unwrap();
        let moved = store
            .save_flow(&AutomationFlow { graph, ..flow })
            .await
            .unwrap();
        assert_eq!(moved.version, 3);
    }
}

#[tokio::test]
async fn archived_flows_reject_saves() {
    for store in stores().await {
        let flow = store.create_flow("Old rollout", "", &ctx()).await.unwrap();
        store.activate_flow(flow.id).await.unwrap();
        store.archive_flow(flow.id).await.unwrap();

        let (changed, _) = add(&flow, NodeKind::Action, "notify");
        for attempt in [&flow, &changed] {
            let err = store.save_flow(attempt).await.unwrap_err();
            assert!(matches!(err, FlowError::FlowImmutable(id) if id == flow.id));
        }

        let err = store.archive_flow(flow.id).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
        assert_eq!(store.load_flow(flow.id).await.unwrap().status, FlowStatus::Archived);
    }
}

#[tokio::test]
async fn scenario_b_kind_rules_surface_as_edit_errors() {
    let flow = AutomationFlow::draft("Rules", "", &ctx());
    let (flow, trigger) = add(&flow, NodeKind::Trigger, "manual");
    let (flow, action) = add(&flow, NodeKind::Action, "notify");
    let (flow, outcome) = add(&flow, NodeKind::Outcome, "failed");
    let editor = GraphEditor::default();

    assert!(matches!(
        editor.connect(&flow.graph, outcome, action),
        Err(EditError::IllegalOutgoingEdge { .. })
    ));
    assert!(matches!(
        editor.connect(&flow.graph, action, trigger),
        Err(EditError::IllegalIncomingEdge { .. })
    ));
}

#[tokio::test]
async fn scenario_e_cyclic_flow_saves_and_activates() {
    for store in stores().await {
        let flow = store.create_flow("Retry loop", "", &ctx()).await.unwrap();
        let (flow, a) = add(&flow, NodeKind::Action, "run_script");
        let (flow, b) = add(&flow, NodeKind::Action, "request_approval");
        let (flow, c) = add(&flow, NodeKind::Action, "notify");
        let flow = connect(&flow, a, b);
        let flow = connect(&flow, b, c);
        let flow = connect(&flow, c, a);

        let saved = store.save_flow(&flow).await.unwrap();
        assert_eq!(saved.graph.detect_cycles(), BTreeSet::from([a, b, c]));
        assert!(saved.graph.validate().has_cycles());

        let active = store.activate_flow(saved.id).await.unwrap();
        assert_eq!(active.status, FlowStatus::Active);
    }
}

#[tokio::test]
async fn listing_is_scoped_and_ordered() {
    for store in stores().await {
        let other = OwnerContext::new("eu-central/zone-9", "someone");
        let first = store.create_flow("first", "", &ctx()).await.unwrap();
        store.create_flow("elsewhere", "", &other).await.unwrap();
        let second = store.create_flow("second", "", &ctx()).await.unwrap();
        store.activate_flow(second.id).await.unwrap();

        let listing = store.list_flows("ap-south/zone-1");
        let summaries = listing.collect().await.unwrap();
        let ids: Vec<_> = summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(summaries[1].status, FlowStatus::Active);

        // restartable
        assert_eq!(listing.collect().await.unwrap(), summaries);

        let catalog = store.flow_catalog("ap-south/zone-1").await.unwrap();
        assert_eq!(catalog.flow_ids, ids);
    }
}

#[tokio::test]
async fn sqlite_records_survive_reopening_the_store() {
    let storage = Arc::new(SqliteFlowStorage::in_memory().await.unwrap());

    let created = {
        let store = FlowStore::new(storage.clone());
        let flow = store.create_flow("Durable", "", &ctx()).await.unwrap();
        let (flow, _) = add(&flow, NodeKind::Trigger, "schedule");
        store.save_flow(&flow).await.unwrap()
    };

    let store = FlowStore::new(storage.clone());
    let loaded = store.load_flow(created.id).await.unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.version, 2);
    assert_eq!(storage.list("ap-south/zone-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_file_database_is_created_on_connect() {
    let dir = std::env::temp_dir().join(format!("zoneflow-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("flows.db");

    let storage = SqliteFlowStorage::connect(&path).await.unwrap();
    let store = FlowStore::new(Arc::new(storage));
    let flow = store.create_flow("On disk", "", &ctx()).await.unwrap();
    assert!(path.exists());
    assert_eq!(store.load_flow(flow.id).await.unwrap().name, "On disk");

    drop(store);
    let _ = std::fs::remove_dir_all(&dir);
}

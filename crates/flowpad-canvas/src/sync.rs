use flowpad_config::{WorkflowEdge, WorkflowNode};
use flowpad_store::Store;
use tracing::debug;

use crate::canvas::Canvas;

/// What a [`SyncBridge::reconcile`] pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  /// The store held a new document and the canvas was replaced.
  pub replaced_canvas: bool,
  pub pushed_nodes: bool,
  pub pushed_edges: bool,
}

/// Keeps a [`Canvas`] and the store's document in step.
///
/// A new document identity in the store (template load, import, reset)
/// replaces the canvas wholesale. Otherwise the canvas is the editing
/// surface and its content is pushed to the store when it differs.
/// Execution status always flows from the store to the canvas.
#[derive(Debug, Clone, Default)]
pub struct SyncBridge {
  seen_id: Option<String>,
}

impl SyncBridge {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reconcile(&mut self, canvas: &mut Canvas, store: &Store) -> SyncReport {
    let (id, stored_nodes, stored_edges) = store.read(|state| {
      let doc = &state.current_workflow;
      (doc.id.clone(), doc.nodes.clone(), doc.edges.clone())
    });

    if self.seen_id.as_deref() != Some(id.as_str()) {
      debug!(workflow_id = %id, "replacing canvas from store");
      canvas.replace(stored_nodes, stored_edges);
      self.seen_id = Some(id);
      return SyncReport {
        replaced_canvas: true,
        ..SyncReport::default()
      };
    }

    for node in canvas.nodes_mut() {
      if let Some(stored) = stored_nodes.iter().find(|s| s.id == node.id) {
        node.data.status = stored.data.status;
      }
    }

    let mut report = SyncReport::default();
    if nodes_differ(canvas.nodes(), &stored_nodes) {
      store.set_nodes(canvas.nodes().to_vec());
      report.pushed_nodes = true;
    }
    if edge_key(canvas.edges()) != edge_key(&stored_edges) {
      store.set_edges(canvas.edges().to_vec());
      report.pushed_edges = true;
    }
    report
  }
}

/// Content comparison by index. Position and status are ignored.
fn nodes_differ(local: &[WorkflowNode], stored: &[WorkflowNode]) -> bool {
  local.len() != stored.len()
    || local.iter().zip(stored).any(|(l, s)| {
      l.node_type() != s.node_type() || !l.data.same_content(&s.data)
    })
}

/// Order-independent key over edge endpoints.
fn edge_key(edges: &[WorkflowEdge]) -> String {
  let mut keys: Vec<String> = edges.iter().map(WorkflowEdge::pair_key).collect();
  keys.sort();
  keys.join(",")
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowpad_config::{NodeData, NodeStatus, NodeType, Position};
  use flowpad_store::{AppState, MemoryBackend};
  use std::sync::Arc;

  fn store() -> Store {
    Store::new(AppState::default(), Arc::new(MemoryBackend::new()))
  }

  #[test]
  fn first_pass_adopts_the_store() {
    let store = store();
    store.set_nodes(vec![WorkflowNode::new("a", NodeType::Agent, NodeData::named("a"))]);

    let mut canvas = Canvas::default();
    let mut bridge = SyncBridge::new();
    let report = bridge.reconcile(&mut canvas, &store);
    assert!(report.replaced_canvas);
    assert_eq!(canvas.nodes().len(), 1);

    assert_eq!(bridge.reconcile(&mut canvas, &store), SyncReport::default());
  }

  #[test]
  fn moves_are_not_pushed_but_edits_are() {
    let store = store();
    let mut canvas = Canvas::default();
    let mut bridge = SyncBridge::new();
    bridge.reconcile(&mut canvas, &store);

    let id = canvas.add_node(&store, NodeType::Agent, NodeData::named("a"), Position::default());
    assert!(bridge.reconcile(&mut canvas, &store).pushed_nodes);
    let revision = store.read(|s| s.current_workflow.revision);

    canvas.move_node(&id, Position::new(300.0, 300.0));
    assert_eq!(bridge.reconcile(&mut canvas, &store), SyncReport::default());
    assert_eq!(store.read(|s| s.current_workflow.revision), revision);
  }

  #[test]
  fn statuses_flow_from_store_to_canvas() {
    let store = store();
    store.set_nodes(vec![WorkflowNode::new("a", NodeType::Agent, NodeData::named("a"))]);
    let mut canvas = Canvas::default();
    let mut bridge = SyncBridge::new();
    bridge.reconcile(&mut canvas, &store);

    store.dispatch(flowpad_store::Action::SetNodeStatuses(NodeStatus::Running));
    let report = bridge.reconcile(&mut canvas, &store);
    assert!(!report.pushed_nodes);
    assert_eq!(canvas.nodes()[0].status(), NodeStatus::Running);
  }

  #[test]
  fn edge_order_does_not_matter() {
    assert_eq!(
      edge_key(&[WorkflowEdge::between("a", "b"), WorkflowEdge::between("b", "c")]),
      edge_key(&[WorkflowEdge::between("b", "c"), WorkflowEdge::between("a", "b")]),
    );
  }
}

use flowpad_config::{LogLevel, NodeData, NodeStatus, NodeType, Position, WorkflowEdge, WorkflowNode};
use flowpad_store::Store;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CanvasError;

/// The editor's local copy of the graph.
///
/// Edits land here first and reach the store through the
/// [`SyncBridge`](crate::SyncBridge). Layout and selection never leave the
/// canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
  nodes: Vec<WorkflowNode>,
  edges: Vec<WorkflowEdge>,
  selected: Option<String>,
}

impl Canvas {
  pub fn nodes(&self) -> &[WorkflowNode] {
    &self.nodes
  }

  pub fn edges(&self) -> &[WorkflowEdge] {
    &self.edges
  }

  pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  pub fn selected(&self) -> Option<&WorkflowNode> {
    self.selected.as_deref().and_then(|id| self.node(id))
  }

  pub(crate) fn nodes_mut(&mut self) -> &mut Vec<WorkflowNode> {
    &mut self.nodes
  }

  /// Replace the whole graph and drop the selection.
  pub(crate) fn replace(&mut self, nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) {
    self.nodes = nodes;
    self.edges = edges;
    self.selected = None;
  }

  /// Drop a new node onto the canvas. Returns its id.
  pub fn add_node(
    &mut self,
    store: &Store,
    node_type: NodeType,
    mut data: NodeData,
    position: Position,
  ) -> String {
    let id = format!("{}-{}", node_type, uuid::Uuid::new_v4());
    data.status = NodeStatus::Idle;

    let name = if data.name.is_empty() {
      data.label.clone()
    } else {
      data.name.clone()
    };
    self
      .nodes
      .push(WorkflowNode::new(id.clone(), node_type, data).with_position(position));

    debug!(node_id = %id, node_type = %node_type, "node added");
    store.add_log(LogLevel::Info, format!("Added {} to workflow", name));
    id
  }

  /// Connect two nodes. Unknown endpoints and repeated connections are
  /// ignored; a node cannot be connected to itself.
  pub fn connect(
    &mut self,
    store: &Store,
    source: &str,
    target: &str,
    source_handle: Option<&str>,
  ) -> Option<String> {
    let (from, to) = match (self.node(source), self.node(target)) {
      (Some(from), Some(to)) => (from.display_name().to_string(), to.display_name().to_string()),
      _ => return None,
    };

    if source == target {
      store.add_log(LogLevel::Error, "Cannot connect a node to itself");
      return None;
    }

    let exists = self.edges.iter().any(|e| {
      e.source == source && e.target == target && e.source_handle.as_deref() == source_handle
    });
    if exists {
      return None;
    }

    let edge = match source_handle {
      Some(handle) => WorkflowEdge::between(source, target).with_handle(handle),
      None => WorkflowEdge::between(source, target),
    };
    let edge_id = edge.id.clone();
    self.edges.push(edge);

    store.add_log(LogLevel::Info, format!("Connected {} to {}", from, to));
    Some(edge_id)
  }

  /// Merge a JSON object into a node's data. `status` cannot be set this way.
  pub fn update_node_data(
    &mut self,
    node_id: &str,
    patch: Map<String, Value>,
  ) -> Result<(), CanvasError> {
    let node = self
      .nodes
      .iter_mut()
      .find(|n| n.id == node_id)
      .ok_or_else(|| CanvasError::NodeNotFound(node_id.to_string()))?;

    let invalid = |source| CanvasError::InvalidData {
      node_id: node_id.to_string(),
      source,
    };

    let mut merged = match serde_json::to_value(&node.data).map_err(invalid)? {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    for (key, value) in patch {
      if key != "status" {
        merged.insert(key, value);
      }
    }

    let status = node.data.status;
    node.data = serde_json::from_value(Value::Object(merged)).map_err(invalid)?;
    node.data.status = status;
    Ok(())
  }

  pub fn move_node(&mut self, node_id: &str, position: Position) -> bool {
    match self.nodes.iter_mut().find(|n| n.id == node_id) {
      Some(node) => {
        node.position = position;
        true
      }
      None => false,
    }
  }

  /// Select a node, or clear the selection with `None`.
  pub fn select(&mut self, node_id: Option<&str>) {
    self.selected = node_id
      .filter(|id| self.node(id).is_some())
      .map(str::to_string);
  }

  /// Remove a node and every edge touching it.
  pub fn remove_node(&mut self, node_id: &str) -> Option<WorkflowNode> {
    let index = self.nodes.iter().position(|n| n.id == node_id)?;
    self.edges.retain(|e| !e.touches(node_id));
    if self.selected.as_deref() == Some(node_id) {
      self.selected = None;
    }
    Some(self.nodes.remove(index))
  }

  pub fn remove_edge(&mut self, edge_id: &str) -> Option<WorkflowEdge> {
    let index = self.edges.iter().position(|e| e.id == edge_id)?;
    Some(self.edges.remove(index))
  }
}

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use flowpad_config::{NodeStatus, WorkflowEdge, WorkflowExport, WorkflowNode, WorkflowStatus};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::validation::{ValidationReport, validate};

/// Name given to new documents.
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// The single live workflow being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
  /// Identity. Changes only when the document is replaced wholesale.
  pub id: String,
  pub name: String,
  pub description: String,
  pub nodes: Vec<WorkflowNode>,
  pub edges: Vec<WorkflowEdge>,
  pub status: WorkflowStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub is_auto_saving: bool,
  pub has_unsaved_changes: bool,
  /// Bumped by every content mutation.
  pub revision: u64,
}

impl Default for WorkflowDocument {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkflowDocument {
  /// An empty document with a fresh identity.
  pub fn new() -> Self {
    let now = Utc::now();
    Self {
      id: Self::fresh_id(),
      name: DEFAULT_WORKFLOW_NAME.to_string(),
      description: String::new(),
      nodes: Vec::new(),
      edges: Vec::new(),
      status: WorkflowStatus::Idle,
      created_at: now,
      updated_at: now,
      is_auto_saving: false,
      has_unsaved_changes: false,
      revision: 0,
    }
  }

  /// A document with a fresh identity holding the given graph.
  pub fn from_graph(
    name: impl Into<String>,
    description: impl Into<String>,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
  ) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      nodes,
      edges,
      ..Self::new()
    }
  }

  pub fn fresh_id() -> String {
    format!("workflow-{}", uuid::Uuid::new_v4())
  }

  /// Record a content mutation.
  pub fn touch(&mut self) {
    self.updated_at = Utc::now();
    self.has_unsaved_changes = true;
    self.revision += 1;
  }

  /// Set every node's execution status.
  pub fn set_node_statuses(&mut self, status: NodeStatus) {
    for node in &mut self.nodes {
      node.data.status = status;
    }
  }

  pub fn validate(&self) -> ValidationReport {
    validate(&self.nodes, &self.edges)
  }

  pub fn export(&self) -> WorkflowExport {
    WorkflowExport::new(self.name.clone(), &self.nodes, &self.edges)
  }

  /// Check the node/edge invariants a document must hold.
  pub fn check_integrity(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
  ) -> Result<(), WorkflowError> {
    let mut ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
      if !ids.insert(node.id.as_str()) {
        return Err(WorkflowError::DuplicateNode(node.id.clone()));
      }
    }

    for edge in edges {
      if edge.source == edge.target {
        return Err(WorkflowError::SelfLoop {
          edge_id: edge.id.clone(),
          node_id: edge.source.clone(),
        });
      }
      for endpoint in [&edge.source, &edge.target] {
        if !ids.contains(endpoint.as_str()) {
          return Err(WorkflowError::DanglingEdge {
            edge_id: edge.id.clone(),
            node_id: endpoint.clone(),
          });
        }
      }
    }

    Ok(())
  }
}

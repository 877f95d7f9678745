//! Structural validation of a workflow document.
//!
//! Every rule is checked independently; problems accumulate rather than
//! short-circuit. Validation blocks a run but never blocks editing.

use std::fmt;

use flowpad_config::{WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};

use crate::graph::Graph;

/// A single structural problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
  /// The document has no nodes.
  EmptyWorkflow,
  /// Nodes that no edge references (only counted when there are 2+ nodes).
  DisconnectedNodes { count: usize },
  /// Every node is the target of some edge (only checked with 2+ nodes).
  MissingStartNode,
}

impl fmt::Display for ValidationIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::EmptyWorkflow => write!(f, "Workflow must contain at least one node"),
      Self::DisconnectedNodes { count } => write!(f, "{} disconnected node(s)", count),
      Self::MissingStartNode => write!(f, "Workflow must have a start node"),
    }
  }
}

/// Result of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
  pub is_valid: bool,
  pub errors: Vec<String>,
}

impl ValidationReport {
  fn from_issues(issues: &[ValidationIssue]) -> Self {
    Self {
      is_valid: issues.is_empty(),
      errors: issues.iter().map(ToString::to_string).collect(),
    }
  }
}

/// Collect every structural issue of the given graph.
pub fn check(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();

  if nodes.is_empty() {
    issues.push(ValidationIssue::EmptyWorkflow);
  }

  // Single-node documents are exempt from the connectivity rules.
  if nodes.len() > 1 {
    let graph = Graph::new(nodes, edges);

    let count = graph.disconnected().len();
    if count > 0 {
      issues.push(ValidationIssue::DisconnectedNodes { count });
    }

    if graph.start_nodes().is_empty() {
      issues.push(ValidationIssue::MissingStartNode);
    }
  }

  issues
}

/// Validate a document. Pure; safe to call on every render.
pub fn validate(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> ValidationReport {
  ValidationReport::from_issues(&check(nodes, edges))
}

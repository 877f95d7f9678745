use std::collections::{HashMap, HashSet};

use flowpad_config::{WorkflowEdge, WorkflowNode};

/// Graph structure for traversal and analysis.
///
/// Cycles are allowed; nothing here assumes a DAG.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes no edge targets, in document order.
  start_nodes: Vec<String>,
  /// Nodes no edge touches, in document order.
  disconnected: Vec<String>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  pub fn new(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut touched: HashSet<&str> = HashSet::with_capacity(edges.len() * 2);

    for node in nodes {
      adjacency.entry(node.id.clone()).or_default();
      reverse_adjacency.entry(node.id.clone()).or_default();
    }

    for edge in edges {
      adjacency
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
      reverse_adjacency
        .entry(edge.target.clone())
        .or_default()
        .push(edge.source.clone());
      touched.insert(&edge.source);
      touched.insert(&edge.target);
    }

    let start_nodes = nodes
      .iter()
      .filter(|n| reverse_adjacency.get(&n.id).is_none_or(|v| v.is_empty()))
      .map(|n| n.id.clone())
      .collect();

    let disconnected = nodes
      .iter()
      .filter(|n| !touched.contains(n.id.as_str()))
      .map(|n| n.id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      start_nodes,
      disconnected,
    }
  }

  /// Nodes with no incoming edges.
  pub fn start_nodes(&self) -> &[String] {
    &self.start_nodes
  }

  /// Nodes that appear in no edge at all.
  pub fn disconnected(&self) -> &[String] {
    &self.disconnected
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}

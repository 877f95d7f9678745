use thiserror::Error;

/// Integrity violations of a node/edge set.
///
/// These are rejected before a graph from outside the editor (an imported
/// file, a generated workflow) replaces the live document. They are distinct
/// from validation issues, which only block a run.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("edge {edge_id} references unknown node {node_id}")]
  DanglingEdge { edge_id: String, node_id: String },

  #[error("edge {edge_id} connects node {node_id} to itself")]
  SelfLoop { edge_id: String, node_id: String },
}

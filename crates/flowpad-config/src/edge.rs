use serde::{Deserialize, Serialize};

use crate::enums::EdgeType;

/// A directed connection between two nodes of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
  #[serde(default)]
  pub id: String,
  pub source: String,
  pub target: String,
  /// Output port on the source node (`true`/`false` for conditionals).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<String>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub edge_type: Option<EdgeType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub animated: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

impl WorkflowEdge {
  /// Plain edge with the conventional `e{source}-{target}` id.
  pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
    let source = source.into();
    let target = target.into();
    Self {
      id: format!("e{}-{}", source, target),
      source,
      target,
      source_handle: None,
      edge_type: None,
      animated: None,
      label: None,
    }
  }

  pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
    let handle = handle.into();
    self.id = format!("e{}-{}-{}", self.source, handle, self.target);
    self.source_handle = Some(handle);
    self
  }

  /// `source-target` key used for order-independent structure comparison.
  pub fn pair_key(&self) -> String {
    format!("{}-{}", self.source, self.target)
  }

  pub fn touches(&self, node_id: &str) -> bool {
    self.source == node_id || self.target == node_id
  }
}

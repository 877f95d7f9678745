use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::{ConditionType, NodeStatus, NodeType, ParameterType, ThinkingStrategy};

/// Canvas coordinates. Layout only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Declaration of a configurable tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameter {
  #[serde(rename = "type")]
  pub parameter_type: ParameterType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<Value>,
  /// Palette keys such as `default`, `min`, `max` or `multiple`.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Node payload.
///
/// Common fields are always present. Type-specific fields are optional, and
/// anything the model does not name (e.g. `searchEngine` on a web-search
/// tool) is kept in `extra` so nothing is lost on a round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status: NodeStatus,

  // agent
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_prompt: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub capabilities: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,

  // tool
  /// Palette identifier of the tool, e.g. `web-search`.
  #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
  pub tool_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parameters: Option<BTreeMap<String, ToolParameter>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parameter_values: Option<Map<String, Value>>,

  // thinker
  #[serde(
    default,
    deserialize_with = "empty_as_none",
    skip_serializing_if = "Option::is_none"
  )]
  pub strategy: Option<ThinkingStrategy>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub processing_time: Option<f64>,

  // conditional
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
  #[serde(
    default,
    deserialize_with = "empty_as_none",
    skip_serializing_if = "Option::is_none"
  )]
  pub condition_type: Option<ConditionType>,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl NodeData {
  /// Shorthand for a payload with matching name and label.
  pub fn named(name: impl Into<String>) -> Self {
    let name = name.into();
    Self {
      label: name.clone(),
      name,
      ..Self::default()
    }
  }

  /// Name shown in logs: the label, or the name when the label is empty.
  pub fn display_name(&self) -> &str {
    if self.label.is_empty() {
      &self.name
    } else {
      &self.label
    }
  }

  /// Equality over everything except the volatile execution status.
  pub fn same_content(&self, other: &NodeData) -> bool {
    if self.status == other.status {
      return self == other;
    }
    let mut lhs = self.clone();
    lhs.status = other.status;
    &lhs == other
  }
}

/// A typed node of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
  pub id: String,
  #[serde(rename = "type")]
  node_type: NodeType,
  #[serde(default)]
  pub position: Position,
  #[serde(default)]
  pub data: NodeData,
}

impl WorkflowNode {
  pub fn new(id: impl Into<String>, node_type: NodeType, data: NodeData) -> Self {
    Self {
      id: id.into(),
      node_type,
      position: Position::default(),
      data,
    }
  }

  pub fn with_position(mut self, position: Position) -> Self {
    self.position = position;
    self
  }

  pub fn node_type(&self) -> NodeType {
    self.node_type
  }

  pub fn status(&self) -> NodeStatus {
    self.data.status
  }

  pub fn display_name(&self) -> &str {
    self.data.display_name()
  }
}

/// Treats a missing value, `null`, or `""` as `None`.
///
/// Files written by older editors carry `"strategy": ""` on every node.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) if s.is_empty() => Ok(None),
    Some(value) => T::deserialize(value).map(Some).map_err(D::Error::custom),
  }
}

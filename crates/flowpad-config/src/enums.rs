use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a workflow node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
  Agent,
  Tool,
  Thinker,
  Conditional,
}

impl NodeType {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeType::Agent => "agent",
      NodeType::Tool => "tool",
      NodeType::Thinker => "thinker",
      NodeType::Conditional => "conditional",
    }
  }
}

impl fmt::Display for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Per-node execution state. Only the execution engine and reset actions write it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  Idle,
  Running,
  Completed,
  Error,
}

/// Document-level execution state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
  #[default]
  Idle,
  Running,
  Completed,
  Error,
}

impl From<WorkflowStatus> for NodeStatus {
  fn from(status: WorkflowStatus) -> Self {
    match status {
      WorkflowStatus::Idle => NodeStatus::Idle,
      WorkflowStatus::Running => NodeStatus::Running,
      WorkflowStatus::Completed => NodeStatus::Completed,
      WorkflowStatus::Error => NodeStatus::Error,
    }
  }
}

/// Severity of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
  Info,
  Error,
  Success,
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      LogLevel::Info => "info",
      LogLevel::Error => "error",
      LogLevel::Success => "success",
    };
    f.write_str(s)
  }
}

/// Diagnostic verbosity selected in the settings dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
  Debug,
  #[default]
  Info,
  Warn,
  Error,
}

impl Verbosity {
  /// Directive usable as a tracing filter.
  pub fn as_filter(&self) -> &'static str {
    match self {
      Verbosity::Debug => "debug",
      Verbosity::Info => "info",
      Verbosity::Warn => "warn",
      Verbosity::Error => "error",
    }
  }
}

/// Visibility requested when saving a workflow or publishing a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareLevel {
  #[default]
  Private,
  Link,
  Public,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
  #[default]
  Javascript,
  Python,
  Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingStrategy {
  Analytical,
  Creative,
  Logical,
  Intuitive,
}

/// Rendering hint for edges. Carries no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
  Default,
  Smoothstep,
  Straight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
  Text,
  Textarea,
  Select,
  Boolean,
  Number,
  File,
  Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
  Simple,
  Medium,
  Complex,
}

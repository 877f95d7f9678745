use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use flowpad_config::{LogLevel, Settings};
use flowpad_templates::Template;
use flowpad_workflow::WorkflowDocument;
use serde::{Deserialize, Serialize};

/// Most log entries the store keeps. Older entries are evicted first.
pub const MAX_EXECUTION_LOGS: usize = 100;

/// A single line of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
  pub id: String,
  pub timestamp: DateTime<Utc>,
  pub level: LogLevel,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_id: Option<String>,
}

impl ExecutionLogEntry {
  pub fn new(level: LogLevel, message: impl Into<String>, node_id: Option<String>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      timestamp: Utc::now(),
      level,
      message: message.into(),
      node_id,
    }
  }
}

/// Everything the editor shows, owned by the [`Store`](crate::Store).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
  pub current_workflow: WorkflowDocument,
  /// Catalog snapshot the template browser lists.
  pub templates: Vec<Template>,
  /// Templates created by the user.
  pub my_templates: Vec<Template>,
  /// Oldest first.
  pub execution_logs: VecDeque<ExecutionLogEntry>,
  pub is_loading: bool,
  pub error: Option<String>,
  pub settings: Settings,
}

impl AppState {
  pub fn new(settings: Settings) -> Self {
    Self {
      settings,
      ..Self::default()
    }
  }

  pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
    self.templates = templates;
    self
  }

  /// Append a log entry, evicting the oldest beyond the cap.
  pub(crate) fn push_log(&mut self, entry: ExecutionLogEntry) {
    self.execution_logs.push_back(entry);
    while self.execution_logs.len() > MAX_EXECUTION_LOGS {
      self.execution_logs.pop_front();
    }
  }

  /// Find a template by id in the catalog or the user's own list.
  pub fn template(&self, id: &str) -> Option<&Template> {
    self
      .templates
      .iter()
      .chain(self.my_templates.iter())
      .find(|t| t.id == id)
  }

  /// Messages of the current log, oldest first.
  pub fn log_messages(&self) -> Vec<String> {
    self
      .execution_logs
      .iter()
      .map(|entry| entry.message.clone())
      .collect()
  }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowpad_config::{ShareLevel, WorkflowExport};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::BackendError;

/// Simulated round-trip of the in-memory backend.
pub const DEFAULT_SAVE_LATENCY: Duration = Duration::from_secs(1);

/// Options chosen in the save dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
  /// New name for the workflow. Empty keeps the current name.
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub share_level: ShareLevel,
  #[serde(default)]
  pub allow_editing: bool,
}

/// Record of a stored workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkflow {
  pub id: String,
  pub name: String,
  pub share_level: ShareLevel,
  pub saved_at: DateTime<Utc>,
}

/// Where saved workflows go.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
  /// Store a workflow snapshot under the document id.
  async fn save(
    &self,
    id: &str,
    workflow: &WorkflowExport,
    options: &SaveOptions,
  ) -> Result<SavedWorkflow, BackendError>;

  /// Fetch a stored snapshot.
  async fn load(&self, id: &str) -> Result<WorkflowExport, BackendError>;

  /// List stored workflows, most recently saved first.
  async fn list(&self) -> Result<Vec<SavedWorkflow>, BackendError>;
}

/// Backend that keeps snapshots in memory after a simulated delay.
#[derive(Debug)]
pub struct MemoryBackend {
  latency: Duration,
  failing: AtomicBool,
  workflows: RwLock<HashMap<String, (SavedWorkflow, WorkflowExport)>>,
}

impl Default for MemoryBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::with_latency(DEFAULT_SAVE_LATENCY)
  }

  pub fn with_latency(latency: Duration) -> Self {
    Self {
      latency,
      failing: AtomicBool::new(false),
      workflows: RwLock::new(HashMap::new()),
    }
  }

  /// Make every following call fail until reset.
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  async fn round_trip(&self) -> Result<(), BackendError> {
    tokio::time::sleep(self.latency).await;
    if self.failing.load(Ordering::SeqCst) {
      return Err(BackendError::Unavailable("simulated failure".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl WorkflowBackend for MemoryBackend {
  async fn save(
    &self,
    id: &str,
    workflow: &WorkflowExport,
    options: &SaveOptions,
  ) -> Result<SavedWorkflow, BackendError> {
    self.round_trip().await?;

    let record = SavedWorkflow {
      id: id.to_string(),
      name: workflow.name.clone(),
      share_level: options.share_level,
      saved_at: Utc::now(),
    };
    self
      .workflows
      .write()
      .await
      .insert(id.to_string(), (record.clone(), workflow.clone()));
    Ok(record)
  }

  async fn load(&self, id: &str) -> Result<WorkflowExport, BackendError> {
    self.round_trip().await?;
    self
      .workflows
      .read()
      .await
      .get(id)
      .map(|(_, workflow)| workflow.clone())
      .ok_or_else(|| BackendError::NotFound(id.to_string()))
  }

  async fn list(&self) -> Result<Vec<SavedWorkflow>, BackendError> {
    self.round_trip().await?;
    let mut records: Vec<_> = self
      .workflows
      .read()
      .await
      .values()
      .map(|(record, _)| record.clone())
      .collect();
    records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    Ok(records)
  }
}

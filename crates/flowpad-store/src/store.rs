use std::sync::Arc;

use flowpad_config::{
  LogLevel, SettingsPatch, ShareLevel, WorkflowEdge, WorkflowExport, WorkflowNode, WorkflowStatus,
  import_workflow,
};
use flowpad_templates::{Template, TemplateMeta, TemplatePatch};
use flowpad_workflow::{ValidationReport, WorkflowDocument};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::action::{Action, reduce};
use crate::backend::{SaveOptions, SavedWorkflow, WorkflowBackend};
use crate::error::StoreError;
use crate::state::AppState;

const SAVE_FAILED: &str = "Failed to save workflow";
const LOAD_FAILED: &str = "Failed to load workflow";

/// Result of [`Store::save`]. Failures are also recorded in the state.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
  Saved(SavedWorkflow),
  Failed(String),
}

impl SaveOutcome {
  pub fn is_saved(&self) -> bool {
    matches!(self, SaveOutcome::Saved(_))
  }
}

/// Shared handle to the application state.
///
/// Cloning is cheap and every clone sees the same state. All mutations go
/// through the watch channel's lock, so they are applied one at a time and
/// every subscriber observes them in order.
#[derive(Clone)]
pub struct Store {
  inner: Arc<StoreInner>,
}

struct StoreInner {
  state: watch::Sender<AppState>,
  backend: Arc<dyn WorkflowBackend>,
}

impl Store {
  pub fn new(state: AppState, backend: Arc<dyn WorkflowBackend>) -> Self {
    let (state, _) = watch::channel(state);
    Self {
      inner: Arc::new(StoreInner { state, backend }),
    }
  }

  pub fn backend(&self) -> &Arc<dyn WorkflowBackend> {
    &self.inner.backend
  }

  /// Receive a notification on every state change.
  pub fn subscribe(&self) -> watch::Receiver<AppState> {
    self.inner.state.subscribe()
  }

  /// Clone of the current state.
  pub fn snapshot(&self) -> AppState {
    self.inner.state.borrow().clone()
  }

  /// Read from the current state without cloning it.
  pub fn read<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
    f(&self.inner.state.borrow())
  }

  pub fn dispatch(&self, action: Action) {
    self.inner.state.send_modify(|state| reduce(state, action));
  }

  /// Apply the action unless `cancel` has fired. Returns whether it was applied.
  ///
  /// The token is checked while holding the state lock, so a writer that
  /// cancels and then dispatches never sees a write land after its own.
  pub fn dispatch_unless(&self, cancel: &CancellationToken, action: Action) -> bool {
    self.dispatch_if(cancel, |_| true, [action])
  }

  /// Apply the actions as one change if `cancel` has not fired and `guard`
  /// accepts the current state. Returns whether they were applied.
  pub fn dispatch_if(
    &self,
    cancel: &CancellationToken,
    guard: impl FnOnce(&AppState) -> bool,
    actions: impl IntoIterator<Item = Action>,
  ) -> bool {
    self.inner.state.send_if_modified(|state| {
      if cancel.is_cancelled() || !guard(state) {
        return false;
      }
      for action in actions {
        reduce(state, action);
      }
      true
    })
  }

  /// Apply several actions as one change.
  pub fn dispatch_all(&self, actions: impl IntoIterator<Item = Action>) {
    self.inner.state.send_modify(|state| {
      for action in actions {
        reduce(state, action);
      }
    });
  }

  pub fn set_name(&self, name: impl Into<String>) {
    self.dispatch(Action::SetWorkflowName(name.into()));
  }

  pub fn set_description(&self, description: impl Into<String>) {
    self.dispatch(Action::SetWorkflowDescription(description.into()));
  }

  pub fn set_nodes(&self, nodes: Vec<WorkflowNode>) {
    self.dispatch(Action::SetNodes(nodes));
  }

  pub fn set_edges(&self, edges: Vec<WorkflowEdge>) {
    self.dispatch(Action::SetEdges(edges));
  }

  pub fn set_status(&self, status: WorkflowStatus) {
    self.dispatch(Action::SetWorkflowStatus(status));
  }

  pub fn add_log(&self, level: LogLevel, message: impl Into<String>) {
    self.dispatch(log(level, message, None));
  }

  pub fn clear_logs(&self) {
    self.dispatch(Action::ClearExecutionLogs);
  }

  pub fn update_settings(&self, patch: SettingsPatch) {
    self.dispatch(Action::UpdateSettings(patch));
  }

  pub fn validate(&self) -> ValidationReport {
    self.read(|state| state.current_workflow.validate())
  }

  /// Replace the document with a template's graph.
  pub fn load_template(&self, template: &Template) {
    info!(template_id = %template.id, "loading template");
    self.dispatch_all([
      Action::LoadTemplate(template.clone()),
      log(
        LogLevel::Info,
        format!("Loaded template: {}", template.name),
        None,
      ),
    ]);
  }

  /// Load a template from the catalog or the user's own list.
  pub fn load_template_by_id(&self, id: &str) -> Result<(), StoreError> {
    let template = self
      .read(|state| state.template(id).cloned())
      .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?;
    self.load_template(&template);
    Ok(())
  }

  /// Replace the document content from an external source. The graph must
  /// be consistent; nothing is applied otherwise.
  pub fn replace_graph(
    &self,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
  ) -> Result<(), StoreError> {
    WorkflowDocument::check_integrity(&nodes, &edges)?;
    self.dispatch(Action::ReplaceGraph { nodes, edges });
    Ok(())
  }

  /// Start over with an empty document.
  pub fn reset(&self) {
    self.dispatch_all([
      Action::ResetWorkflow,
      log(LogLevel::Info, "Workflow reset", None),
    ]);
  }

  pub fn add_template(&self, template: Template) {
    self.dispatch(Action::AddTemplate(template));
  }

  pub fn update_template(&self, id: impl Into<String>, patch: TemplatePatch) {
    self.dispatch(Action::UpdateTemplate {
      id: id.into(),
      patch,
    });
  }

  pub fn delete_template(&self, id: impl Into<String>) {
    self.dispatch(Action::DeleteTemplate(id.into()));
  }

  /// Capture the current graph as one of the user's templates.
  pub fn create_template_from_current(&self, meta: TemplateMeta) -> Template {
    let template = self.read(|state| {
      let doc = &state.current_workflow;
      Template::from_graph(meta, &doc.nodes, &doc.edges)
    });
    self.add_template(template.clone());
    template
  }

  /// Snapshot of the current document in the file format.
  pub fn export(&self) -> WorkflowExport {
    self.read(|state| state.current_workflow.export())
  }

  pub fn export_json(&self) -> Result<String, serde_json::Error> {
    self.export().to_json_pretty()
  }

  /// Replace the document with the contents of a workflow file.
  pub fn import_json(&self, json: &str) -> Result<(), StoreError> {
    let imported = import_workflow(json)?;
    WorkflowDocument::check_integrity(&imported.nodes, &imported.edges)?;

    let mut actions = Vec::with_capacity(2);
    if !imported.name.is_empty() {
      actions.push(Action::SetWorkflowName(imported.name));
    }
    actions.push(Action::ReplaceGraph {
      nodes: imported.nodes,
      edges: imported.edges,
    });
    self.dispatch_all(actions);
    Ok(())
  }

  /// Save the current document through the backend.
  ///
  /// A non-empty `options.name` different from the current name renames the
  /// document. The outcome is reported through the log and the state; the
  /// caller only gets a summary.
  pub async fn save(&self, options: Option<SaveOptions>) -> SaveOutcome {
    let options = options.unwrap_or_default();
    self.dispatch(Action::SetLoading(true));

    let (id, mut revision, mut export) = self.read(|state| {
      let doc = &state.current_workflow;
      (doc.id.clone(), doc.revision, doc.export())
    });
    let rename = Some(options.name.clone()).filter(|n| !n.is_empty() && *n != export.name);
    if let Some(name) = &rename {
      export.name = name.clone();
    }

    let outcome = match self.inner.backend.save(&id, &export, &options).await {
      Ok(record) => {
        info!(workflow_id = %id, name = %record.name, "workflow saved");
        let message = format!(
          "Workflow \"{}\" saved successfully{}",
          export.name,
          share_suffix(options.share_level)
        );
        self.inner.state.send_modify(|state| {
          if let Some(name) = rename {
            if state.current_workflow.id == id {
              reduce(state, Action::SetWorkflowName(name));
              revision += 1;
            }
          }
          reduce(state, Action::MarkSaved { id, revision });
          reduce(state, log(LogLevel::Success, message, None));
        });
        SaveOutcome::Saved(record)
      }
      Err(e) => {
        error!(workflow_id = %id, error = %e, "workflow save failed");
        self.dispatch_all([
          Action::SetError(Some(SAVE_FAILED.to_string())),
          Action::SetAutoSaving(false),
          log(LogLevel::Error, SAVE_FAILED, None),
        ]);
        SaveOutcome::Failed(e.to_string())
      }
    };

    self.dispatch(Action::SetLoading(false));
    outcome
  }

  /// Replace the document with a previously saved workflow.
  pub async fn open(&self, id: &str) -> Result<(), StoreError> {
    self.dispatch(Action::SetLoading(true));

    let loaded = match self.inner.backend.load(id).await {
      Ok(workflow) => WorkflowDocument::check_integrity(&workflow.nodes, &workflow.edges)
        .map(|_| workflow)
        .map_err(StoreError::from),
      Err(e) => Err(StoreError::from(e)),
    };

    let result = match loaded {
      Ok(workflow) => {
        info!(workflow_id = %id, "workflow opened");
        let message = format!("Loaded workflow: {}", workflow.name);
        self.dispatch_all([
          Action::OpenWorkflow {
            id: id.to_string(),
            workflow,
          },
          log(LogLevel::Info, message, None),
        ]);
        Ok(())
      }
      Err(e) => {
        error!(workflow_id = %id, error = %e, "workflow open failed");
        self.dispatch_all([
          Action::SetError(Some(LOAD_FAILED.to_string())),
          log(LogLevel::Error, LOAD_FAILED, None),
        ]);
        Err(e)
      }
    };

    self.dispatch(Action::SetLoading(false));
    result
  }
}

impl std::fmt::Debug for Store {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Store")
      .field("state", &*self.inner.state.borrow())
      .finish_non_exhaustive()
  }
}

/// Build a log action.
pub fn log(level: LogLevel, message: impl Into<String>, node_id: Option<String>) -> Action {
  Action::AddExecutionLog {
    level,
    message: message.into(),
    node_id,
  }
}

fn share_suffix(level: ShareLevel) -> &'static str {
  match level {
    ShareLevel::Private => "",
    ShareLevel::Link => " with shareable link",
    ShareLevel::Public => " and made public",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::MemoryBackend;
  use flowpad_config::{NodeData, NodeType};
  use std::time::Duration;

  fn store_with(backend: Arc<MemoryBackend>) -> Store {
    Store::new(AppState::default(), backend)
  }

  fn agent(id: &str) -> WorkflowNode {
    WorkflowNode::new(id, NodeType::Agent, NodeData::named(id))
  }

  #[test]
  fn dispatch_unless_respects_cancellation() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let cancel = CancellationToken::new();

    assert!(store.dispatch_unless(&cancel, log(LogLevel::Info, "first", None)));
    cancel.cancel();
    assert!(!store.dispatch_unless(&cancel, log(LogLevel::Info, "second", None)));

    assert_eq!(store.read(|s| s.log_messages().len()), 1);
  }

  #[test]
  fn dispatch_if_checks_the_guard() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let cancel = CancellationToken::new();
    let idle = |s: &AppState| s.current_workflow.status != WorkflowStatus::Running;

    assert!(store.dispatch_if(&cancel, idle, [Action::SetWorkflowStatus(WorkflowStatus::Running)]));
    assert!(!store.dispatch_if(&cancel, idle, [log(LogLevel::Info, "again", None)]));
    assert!(store.read(|s| s.execution_logs.is_empty()));
  }

  #[test]
  fn subscribers_see_changes() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let mut rx = store.subscribe();
    assert!(!rx.has_changed().unwrap());

    store.set_name("Watched");
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().current_workflow.name, "Watched");
  }

  #[tokio::test(start_paused = true)]
  async fn save_renames_and_logs_share_level() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    store.set_nodes(vec![agent("a")]);

    let outcome = store
      .save(Some(SaveOptions {
        name: "Shared".to_string(),
        share_level: ShareLevel::Link,
        ..SaveOptions::default()
      }))
      .await;
    assert!(outcome.is_saved());

    let state = store.snapshot();
    assert_eq!(state.current_workflow.name, "Shared");
    assert!(!state.current_workflow.has_unsaved_changes);
    assert!(!state.is_loading);
    assert_eq!(
      state.log_messages(),
      vec!["Workflow \"Shared\" saved successfully with shareable link"]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn save_failure_keeps_unsaved_changes() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_failing(true);
    let store = store_with(backend);
    store.set_nodes(vec![agent("a")]);
    store.dispatch(Action::SetAutoSaving(true));

    let outcome = store.save(None).await;
    assert!(matches!(outcome, SaveOutcome::Failed(_)));

    let state = store.snapshot();
    assert!(state.current_workflow.has_unsaved_changes);
    assert!(!state.current_workflow.is_auto_saving);
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("Failed to save workflow"));
    assert_eq!(state.log_messages(), vec!["Failed to save workflow"]);
  }

  #[tokio::test(start_paused = true)]
  async fn save_is_loading_while_in_flight() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let saving = tokio::spawn({
      let store = store.clone();
      async move { store.save(None).await }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(store.read(|s| s.is_loading));

    assert!(saving.await.unwrap().is_saved());
    assert!(!store.read(|s| s.is_loading));
  }

  #[tokio::test(start_paused = true)]
  async fn open_restores_a_saved_workflow() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    store.set_name("Keep");
    store.set_nodes(vec![agent("a")]);
    store.save(None).await;
    let id = store.read(|s| s.current_workflow.id.clone());

    store.reset();
    assert!(store.read(|s| s.current_workflow.nodes.is_empty()));

    store.open(&id).await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.current_workflow.id, id);
    assert_eq!(state.current_workflow.name, "Keep");
    assert_eq!(state.current_workflow.nodes.len(), 1);
    assert!(!state.current_workflow.has_unsaved_changes);

    assert!(store.open("workflow-missing").await.is_err());
    assert_eq!(store.read(|s| s.error.clone()).as_deref(), Some("Failed to load workflow"));
  }

  #[test]
  fn import_applies_name_and_graph() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let before = store.read(|s| s.current_workflow.id.clone());

    store
      .import_json(
        r#"{
          "name": "Imported",
          "nodes": [
            { "id": "1", "type": "agent", "data": { "name": "A" } },
            { "id": "2", "type": "tool", "data": { "id": "web-search" } }
          ],
          "edges": [ { "source": "1", "target": "2" } ]
        }"#,
      )
      .unwrap();

    let doc = store.read(|s| s.current_workflow.clone());
    assert_ne!(doc.id, before);
    assert_eq!(doc.name, "Imported");
    assert_eq!(doc.nodes.len(), 2);
    assert!(doc.validate().is_valid);
  }

  #[test]
  fn import_failure_applies_nothing() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    store.set_nodes(vec![agent("a")]);
    let before = store.snapshot();

    assert!(matches!(
      store.import_json(r#"{ "nodes": [] }"#),
      Err(StoreError::Import(_))
    ));
    assert!(matches!(
      store.import_json(
        r#"{ "nodes": [ { "id": "1", "type": "agent" } ],
             "edges": [ { "source": "1", "target": "9" } ] }"#
      ),
      Err(StoreError::Integrity(_))
    ));
    assert_eq!(store.snapshot(), before);
  }

  #[test]
  fn load_template_logs_and_replaces() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    let template = store.create_template_from_current(TemplateMeta {
      name: "Empty".to_string(),
      ..TemplateMeta::default()
    });
    assert_eq!(store.read(|s| s.my_templates.len()), 1);

    store.load_template_by_id(&template.id).unwrap();
    assert_eq!(store.read(|s| s.log_messages()), vec!["Loaded template: Empty"]);
    assert!(matches!(
      store.load_template_by_id("nope"),
      Err(StoreError::TemplateNotFound(_))
    ));
  }

  #[test]
  fn reset_logs_after_clearing() {
    let store = store_with(Arc::new(MemoryBackend::new()));
    store.add_log(LogLevel::Info, "old");
    store.reset();
    assert_eq!(store.read(|s| s.log_messages()), vec!["Workflow reset"]);
  }
}

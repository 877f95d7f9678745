use std::sync::{Arc, Mutex};

use flowpad_config::{LogLevel, NodeStatus, WorkflowStatus};
use flowpad_store::{Action, Store, log};
use rand::Rng;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::simulator::{RunOutcome, Simulator};

/// Starts, stops and resets simulated runs against a store.
///
/// Runs are spawned onto the tokio runtime. Each run gets a child of the
/// current generation token; `stop` and `reset` cancel the whole generation,
/// so every run started before them is stopped.
pub struct ExecutionController<R = StdRng> {
  simulator: Arc<Simulator<R>>,
  root: CancellationToken,
  generation: Mutex<CancellationToken>,
}

impl<R: Rng + Send + 'static> ExecutionController<R> {
  pub fn new(simulator: Simulator<R>) -> Self {
    let root = CancellationToken::new();
    Self {
      simulator: Arc::new(simulator),
      generation: Mutex::new(root.child_token()),
      root,
    }
  }

  pub fn simulator(&self) -> &Simulator<R> {
    &self.simulator
  }

  fn generation(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
    self
      .generation
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Spawn a run of the store's current document.
  pub fn start(&self, store: &Store) -> JoinHandle<RunOutcome> {
    let cancel = self.generation().child_token();
    let simulator = self.simulator.clone();
    let store = store.clone();
    tokio::spawn(async move { simulator.run(&store, &cancel).await })
  }

  /// Cancel in-flight runs, then return the document to idle.
  pub fn stop(&self, store: &Store) {
    self.cancel_runs();
    info!("workflow execution stopped");
    store.dispatch_all([
      Action::SetWorkflowStatus(WorkflowStatus::Idle),
      log(LogLevel::Info, "Workflow execution stopped", None),
      Action::SetNodeStatuses(NodeStatus::Idle),
    ]);
  }

  /// Cancel in-flight runs and clear the execution log.
  pub fn reset(&self, store: &Store) {
    self.cancel_runs();
    store.dispatch_all([
      Action::SetWorkflowStatus(WorkflowStatus::Idle),
      Action::ClearExecutionLogs,
      log(LogLevel::Info, "Workflow reset", None),
      Action::SetNodeStatuses(NodeStatus::Idle),
    ]);
  }

  fn cancel_runs(&self) {
    let mut generation = self.generation();
    generation.cancel();
    *generation = self.root.child_token();
  }
}

impl<R> Drop for ExecutionController<R> {
  fn drop(&mut self) {
    self.root.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::simulator::SimulatorConfig;
  use flowpad_config::{NodeData, NodeType, WorkflowEdge, WorkflowNode};
  use flowpad_store::{AppState, MemoryBackend};
  use std::time::Duration;

  fn store() -> Store {
    let store = Store::new(AppState::default(), Arc::new(MemoryBackend::new()));
    store.set_nodes(vec![
      WorkflowNode::new("1", NodeType::Agent, NodeData::named("Planner")),
      WorkflowNode::new("2", NodeType::Tool, NodeData::named("Search")),
    ]);
    store.set_edges(vec![WorkflowEdge::between("1", "2")]);
    store
  }

  fn controller() -> ExecutionController {
    ExecutionController::new(Simulator::seeded(
      SimulatorConfig {
        failure_rate: 0.0,
        ..SimulatorConfig::default()
      },
      3,
    ))
  }

  #[tokio::test(start_paused = true)]
  async fn reset_clears_logs_and_statuses() {
    let store = store();
    let controller = controller();

    let run = controller.start(&store);
    tokio::time::sleep(Duration::from_millis(500)).await;
    controller.reset(&store);

    assert_eq!(run.await.unwrap(), RunOutcome::Stopped);
    let state = store.snapshot();
    assert_eq!(state.log_messages(), vec!["Workflow reset"]);
    assert_eq!(state.current_workflow.status, WorkflowStatus::Idle);
    assert!(
      state
        .current_workflow
        .nodes
        .iter()
        .all(|n| n.status() == NodeStatus::Idle)
    );
  }

  #[tokio::test(start_paused = true)]
  async fn runs_after_stop_are_not_cancelled() {
    let store = store();
    let controller = controller();

    controller.stop(&store);
    let outcome = controller.start(&store).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);
  }
}

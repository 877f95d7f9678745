//! Simulated execution of the current workflow.
//!
//! Nothing is actually executed: each node takes a random delay and fails
//! with a fixed probability. The random source is injected so runs can be
//! replayed from a seed.

use std::sync::Mutex;
use std::time::Duration;

use flowpad_config::{LogLevel, NodeStatus, WorkflowNode, WorkflowStatus};
use flowpad_store::{Action, Store, log};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Timing and failure knobs of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
  /// Shortest simulated node run.
  pub min_delay: Duration,
  /// Upper bound (exclusive) of a simulated node run.
  pub max_delay: Duration,
  /// Probability in `[0, 1]` that a node fails.
  pub failure_rate: f64,
}

impl Default for SimulatorConfig {
  fn default() -> Self {
    Self {
      min_delay: Duration::from_millis(1000),
      max_delay: Duration::from_millis(3000),
      failure_rate: 0.10,
    }
  }
}

impl SimulatorConfig {
  /// The failure rate as a usable probability. Out-of-range values are
  /// clamped and NaN means no failures.
  pub fn effective_failure_rate(&self) -> f64 {
    if self.failure_rate.is_nan() {
      0.0
    } else {
      self.failure_rate.clamp(0.0, 1.0)
    }
  }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
  /// The document did not validate. Nothing ran.
  Invalid(Vec<String>),
  /// Another run already owns the document.
  AlreadyRunning,
  Completed,
  Failed { node_id: String },
  TimedOut,
  /// Cancelled before it could finish.
  Stopped,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
  #[error("{message}")]
  Node { node_id: String, message: String },

  #[error("timed out after {0}s")]
  TimedOut(u64),
}

/// One node's predetermined fate.
#[derive(Debug)]
struct Step {
  node_id: String,
  display: String,
  delay: Duration,
  fails: bool,
}

impl Step {
  fn executing(&self) -> Action {
    log(
      LogLevel::Info,
      format!("Executing {}...", self.display),
      Some(self.node_id.clone()),
    )
  }

  fn finish(&self, store: &Store, cancel: &CancellationToken) -> Result<(), RunError> {
    if self.fails {
      return Err(RunError::Node {
        node_id: self.node_id.clone(),
        message: format!("Failed to execute {}", self.display),
      });
    }
    store.dispatch_unless(
      cancel,
      log(
        LogLevel::Success,
        format!("Completed {}", self.display),
        Some(self.node_id.clone()),
      ),
    );
    Ok(())
  }
}

/// Drives the simulated execution of the store's current document.
///
/// Every write a run makes is conditional on its cancellation token, so a
/// stopped run leaves nothing behind in the log.
pub struct Simulator<R = StdRng> {
  config: SimulatorConfig,
  rng: Mutex<R>,
}

impl Simulator<StdRng> {
  /// Simulator seeded from the OS.
  pub fn from_entropy(config: SimulatorConfig) -> Self {
    Self::new(config, StdRng::from_entropy())
  }

  /// Simulator whose delays and failures are fixed by `seed`.
  pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
    Self::new(config, StdRng::seed_from_u64(seed))
  }
}

impl<R: Rng + Send> Simulator<R> {
  pub fn new(config: SimulatorConfig, rng: R) -> Self {
    Self {
      config,
      rng: Mutex::new(rng),
    }
  }

  pub fn config(&self) -> &SimulatorConfig {
    &self.config
  }

  /// Draw every node's delay and failure up front, in document order.
  fn plan(&self, nodes: &[WorkflowNode]) -> Vec<Step> {
    let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let failure_rate = self.config.effective_failure_rate();

    nodes
      .iter()
      .map(|node| {
        let delay = if self.config.max_delay > self.config.min_delay {
          rng.gen_range(self.config.min_delay..self.config.max_delay)
        } else {
          self.config.min_delay
        };
        Step {
          node_id: node.id.clone(),
          display: node.display_name().to_string(),
          delay,
          fails: rng.gen_bool(failure_rate),
        }
      })
      .collect()
  }

  /// Run the current document to completion, failure, timeout or cancellation.
  #[instrument(
    name = "workflow_run",
    skip_all,
    fields(workflow_id = tracing::field::Empty)
  )]
  pub async fn run(&self, store: &Store, cancel: &CancellationToken) -> RunOutcome {
    let (workflow_id, report, nodes, settings) = store.read(|state| {
      let doc = &state.current_workflow;
      (
        doc.id.clone(),
        doc.validate(),
        doc.nodes.clone(),
        state.settings.clone(),
      )
    });
    tracing::Span::current().record("workflow_id", workflow_id.as_str());

    if !report.is_valid {
      warn!(errors = ?report.errors, "workflow failed validation");
      store.dispatch_unless(
        cancel,
        log(
          LogLevel::Error,
          format!("Validation failed: {}", report.errors.join(", ")),
          None,
        ),
      );
      return RunOutcome::Invalid(report.errors);
    }

    let started = store.dispatch_if(
      cancel,
      |state| state.current_workflow.status != WorkflowStatus::Running,
      [
        Action::SetWorkflowStatus(WorkflowStatus::Running),
        log(LogLevel::Info, "Starting workflow execution...", None),
        Action::SetNodeStatuses(NodeStatus::Running),
      ],
    );
    if !started {
      return if cancel.is_cancelled() {
        RunOutcome::Stopped
      } else {
        RunOutcome::AlreadyRunning
      };
    }

    let plan = self.plan(&nodes);
    info!(
      nodes = plan.len(),
      parallel = settings.parallel_execution,
      "workflow run started"
    );

    let walk = async {
      if settings.parallel_execution {
        walk_parallel(store, cancel, &plan).await
      } else {
        walk_sequential(store, cancel, &plan).await
      }
    };

    let result = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        info!("workflow run stopped");
        return RunOutcome::Stopped;
      }
      result = tokio::time::timeout(settings.execution_timeout(), walk) => {
        result.unwrap_or(Err(RunError::TimedOut(settings.execution_timeout)))
      }
    };

    let (status, level, message, outcome) = match result {
      Ok(()) => {
        info!("workflow run completed");
        (
          WorkflowStatus::Completed,
          LogLevel::Success,
          "Workflow completed successfully".to_string(),
          RunOutcome::Completed,
        )
      }
      Err(e) => {
        error!(error = %e, "workflow run failed");
        let outcome = match &e {
          RunError::Node { node_id, .. } => RunOutcome::Failed {
            node_id: node_id.clone(),
          },
          RunError::TimedOut(_) => RunOutcome::TimedOut,
        };
        (
          WorkflowStatus::Error,
          LogLevel::Error,
          format!("Execution failed: {}", e),
          outcome,
        )
      }
    };

    let finished = store.dispatch_if(
      cancel,
      |_| true,
      [
        Action::SetWorkflowStatus(status),
        log(level, message, None),
        Action::SetNodeStatuses(status.into()),
      ],
    );
    if finished { outcome } else { RunOutcome::Stopped }
  }
}

/// Nodes one after another in document order.
async fn walk_sequential(
  store: &Store,
  cancel: &CancellationToken,
  plan: &[Step],
) -> Result<(), RunError> {
  for step in plan {
    store.dispatch_unless(cancel, step.executing());
    tokio::time::sleep(step.delay).await;
    step.finish(store, cancel)?;
  }
  Ok(())
}

/// All nodes at once. Completions are logged as they land and the first
/// failure abandons the rest.
async fn walk_parallel(
  store: &Store,
  cancel: &CancellationToken,
  plan: &[Step],
) -> Result<(), RunError> {
  store.dispatch_if(cancel, |_| true, plan.iter().map(Step::executing));

  let mut pending: FuturesUnordered<_> = plan
    .iter()
    .map(|step| async move {
      tokio::time::sleep(step.delay).await;
      step
    })
    .collect();

  while let Some(step) = pending.next().await {
    step.finish(store, cancel)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowpad_config::{NodeData, NodeType, WorkflowEdge};
  use flowpad_store::{AppState, MemoryBackend};
  use std::sync::Arc;

  fn store_with_chain(names: &[&str]) -> Store {
    let store = Store::new(AppState::default(), Arc::new(MemoryBackend::new()));
    store.set_nodes(
      names
        .iter()
        .map(|n| WorkflowNode::new(*n, NodeType::Agent, NodeData::named(*n)))
        .collect(),
    );
    store.set_edges(
      names
        .windows(2)
        .map(|w| WorkflowEdge::between(w[0], w[1]))
        .collect(),
    );
    store
  }

  fn config(failure_rate: f64) -> SimulatorConfig {
    SimulatorConfig {
      failure_rate,
      ..SimulatorConfig::default()
    }
  }

  #[test]
  fn plan_respects_bounds_and_seed() {
    let nodes: Vec<_> = (0..20)
      .map(|i| WorkflowNode::new(i.to_string(), NodeType::Tool, NodeData::named("t")))
      .collect();

    let a = Simulator::seeded(config(0.5), 7).plan(&nodes);
    let b = Simulator::seeded(config(0.5), 7).plan(&nodes);
    for (x, y) in a.iter().zip(&b) {
      assert!(x.delay >= Duration::from_millis(1000) && x.delay < Duration::from_millis(3000));
      assert_eq!(x.delay, y.delay);
      assert_eq!(x.fails, y.fails);
    }
  }

  #[test]
  fn failure_rate_extremes_are_deterministic() {
    let nodes = vec![WorkflowNode::new("a", NodeType::Agent, NodeData::named("a")); 10];
    assert!(Simulator::seeded(config(0.0), 1).plan(&nodes).iter().all(|s| !s.fails));
    assert!(Simulator::seeded(config(1.0), 1).plan(&nodes).iter().all(|s| s.fails));
  }

  #[test]
  fn unusable_failure_rates_do_not_panic() {
    let nodes = vec![WorkflowNode::new("a", NodeType::Agent, NodeData::named("a")); 10];
    assert!(Simulator::seeded(config(f64::NAN), 1).plan(&nodes).iter().all(|s| !s.fails));
    assert!(Simulator::seeded(config(-3.0), 1).plan(&nodes).iter().all(|s| !s.fails));
    assert!(Simulator::seeded(config(f64::INFINITY), 1).plan(&nodes).iter().all(|s| s.fails));
  }

  #[tokio::test(start_paused = true)]
  async fn invalid_documents_do_not_start() {
    let store = Store::new(AppState::default(), Arc::new(MemoryBackend::new()));
    let outcome = Simulator::seeded(config(0.0), 1)
      .run(&store, &CancellationToken::new())
      .await;

    assert_eq!(
      outcome,
      RunOutcome::Invalid(vec!["Workflow must contain at least one node".to_string()])
    );
    let state = store.snapshot();
    assert_eq!(state.current_workflow.status, WorkflowStatus::Idle);
    assert_eq!(
      state.log_messages(),
      vec!["Validation failed: Workflow must contain at least one node"]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn a_second_run_is_refused() {
    let store = store_with_chain(&["a"]);
    store.set_status(WorkflowStatus::Running);

    let outcome = Simulator::seeded(config(0.0), 1)
      .run(&store, &CancellationToken::new())
      .await;
    assert_eq!(outcome, RunOutcome::AlreadyRunning);
    assert!(store.read(|s| s.execution_logs.is_empty()));
  }

  #[tokio::test(start_paused = true)]
  async fn timeout_fails_the_run() {
    let store = store_with_chain(&["a", "b", "c"]);
    store.update_settings(flowpad_config::SettingsPatch {
      execution_timeout: Some(2),
      ..Default::default()
    });
    let simulator = Simulator::seeded(
      SimulatorConfig {
        min_delay: Duration::from_millis(1500),
        max_delay: Duration::from_millis(1500),
        failure_rate: 0.0,
      },
      1,
    );

    let outcome = simulator.run(&store, &CancellationToken::new()).await;
    assert_eq!(outcome, RunOutcome::TimedOut);

    let state = store.snapshot();
    assert_eq!(state.current_workflow.status, WorkflowStatus::Error);
    assert_eq!(
      state.log_messages().last().map(String::as_str),
      Some("Execution failed: timed out after 2s")
    );
    assert!(
      state
        .current_workflow
        .nodes
        .iter()
        .all(|n| n.status() == NodeStatus::Error)
    );
  }
}

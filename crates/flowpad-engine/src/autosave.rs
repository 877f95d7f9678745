use std::time::Duration;

use flowpad_store::{Action, AppState, Store};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Idle time after the last edit before an automatic save.
pub const DEFAULT_AUTO_SAVE_DELAY: Duration = Duration::from_secs(2);

/// Identity of the content an auto-save would write.
type ContentKey = (String, u64);

/// Debounced background saver.
///
/// Watches the store and saves once the document has had unsaved changes
/// for the debounce period without being edited again. Only edits restart
/// the timer; log or status updates do not. A failed save is not retried
/// until the document changes again.
pub struct AutoSaver {
  store: Store,
  debounce: Duration,
}

impl AutoSaver {
  pub fn new(store: Store) -> Self {
    Self {
      store,
      debounce: DEFAULT_AUTO_SAVE_DELAY,
    }
  }

  pub fn with_debounce(mut self, debounce: Duration) -> Self {
    self.debounce = debounce;
    self
  }

  /// Start watching. The task stops when the handle is shut down or dropped.
  pub fn spawn(self) -> AutoSaveHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(self.watch(cancel.clone()));
    AutoSaveHandle {
      cancel,
      task: Some(task),
    }
  }

  async fn watch(self, cancel: CancellationToken) {
    let mut changes = self.store.subscribe();
    let mut armed: Option<(ContentKey, Instant)> = None;
    let mut attempted: Option<ContentKey> = None;

    loop {
      let key = pending_key(&changes.borrow_and_update());
      match key {
        Some(key) if attempted.as_ref() == Some(&key) => armed = None,
        Some(key) => {
          if armed.as_ref().map(|(armed_key, _)| armed_key) != Some(&key) {
            debug!(workflow_id = %key.0, revision = key.1, "auto-save armed");
            armed = Some((key, Instant::now() + self.debounce));
          }
        }
        None => armed = None,
      }

      let deadline = armed.as_ref().map(|(_, at)| *at);
      let expired = async {
        match deadline {
          Some(at) => tokio::time::sleep_until(at).await,
          None => std::future::pending().await,
        }
      };

      tokio::select! {
        biased;
        _ = cancel.cancelled() => break,
        changed = changes.changed() => {
          if changed.is_err() {
            break;
          }
        }
        _ = expired => {
          if let Some((key, _)) = armed.take() {
            info!(workflow_id = %key.0, "auto-saving workflow");
            attempted = Some(key);
            self.store.dispatch(Action::SetAutoSaving(true));
            self.store.save(None).await;
          }
        }
      }
    }

    debug!("auto-save stopped");
  }
}

fn pending_key(state: &AppState) -> Option<ContentKey> {
  let doc = &state.current_workflow;
  (state.settings.auto_save && doc.has_unsaved_changes).then(|| (doc.id.clone(), doc.revision))
}

/// Owner of a running [`AutoSaver`].
pub struct AutoSaveHandle {
  cancel: CancellationToken,
  task: Option<JoinHandle<()>>,
}

impl AutoSaveHandle {
  /// Stop the saver and wait for it. An in-flight save completes first.
  pub async fn shutdown(mut self) {
    self.cancel.cancel();
    if let Some(task) = self.task.take() {
      let _ = task.await;
    }
  }
}

impl Drop for AutoSaveHandle {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

use flowpad_config::ImportError;
use flowpad_workflow::WorkflowError;

/// Error type for save backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
  /// No workflow is stored under the id.
  #[error("workflow not found: {0}")]
  NotFound(String),

  /// The backend could not be reached or refused the request.
  #[error("backend unavailable: {0}")]
  Unavailable(String),
}

/// Error type for store operations that replace the document from outside.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("invalid workflow file: {0}")]
  Import(#[from] ImportError),

  #[error("inconsistent workflow graph: {0}")]
  Integrity(#[from] WorkflowError),

  #[error(transparent)]
  Backend(#[from] BackendError),

  #[error("template not found: {0}")]
  TemplateNotFound(String),
}

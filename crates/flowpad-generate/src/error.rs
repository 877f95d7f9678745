use flowpad_store::StoreError;

/// Errors from workflow generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
  /// Nothing to generate from. Rejected before any request is made.
  #[error("description is required")]
  EmptyDescription,

  #[error("invalid endpoint: {0}")]
  InvalidEndpoint(#[from] url::ParseError),

  /// The request could not be sent or the response could not be read.
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  /// The endpoint answered with a non-success status.
  #[error("{message} (status {status})")]
  Endpoint { status: u16, message: String },

  /// The generated graph cannot be loaded.
  #[error("generated workflow is invalid: {0}")]
  InvalidWorkflow(#[from] StoreError),
}

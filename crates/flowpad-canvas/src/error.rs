/// Errors raised by canvas edits.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
  #[error("node '{0}' not found on canvas")]
  NodeNotFound(String),

  #[error("invalid data for node '{node_id}'")]
  InvalidData {
    node_id: String,
    #[source]
    source: serde_json::Error,
  },
}

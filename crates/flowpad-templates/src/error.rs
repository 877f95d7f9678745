use thiserror::Error;

/// Errors that can occur while loading a template catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// IO error when reading template files.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A template file or catalog array failed to parse.
  #[error("invalid template {source_name}: {error}")]
  InvalidTemplate {
    source_name: String,
    #[source]
    error: serde_json::Error,
  },

  /// Two templates share an id.
  #[error("template already exists: {id}")]
  AlreadyExists { id: String },
}

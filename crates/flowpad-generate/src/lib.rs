//! flowpad Generate
//!
//! Text-to-workflow generation. The endpoint is an opaque collaborator
//! behind [`WorkflowGenerator`]; [`generate_into`] loads its answer into
//! the store the same way a template load would.

mod error;
mod generator;

pub use error::GenerateError;
pub use generator::{
  GenerateOptions, GenerateRequest, GeneratedWorkflow, GenerationMetadata, HttpGenerator, Layout,
  WorkflowGenerator,
};

use flowpad_config::LogLevel;
use flowpad_store::Store;
use tracing::{error, info, instrument};

/// Characters of the description echoed into the log.
const LOG_PREVIEW_CHARS: usize = 100;

/// Generate a workflow and replace the store's document with it.
///
/// Failures are logged to the store and returned to the caller.
#[instrument(name = "generate_workflow", skip_all)]
pub async fn generate_into(
  store: &Store,
  generator: &dyn WorkflowGenerator,
  request: &GenerateRequest,
) -> Result<GeneratedWorkflow, GenerateError> {
  if request.description.trim().is_empty() {
    return Err(GenerateError::EmptyDescription);
  }

  let preview: String = request.description.chars().take(LOG_PREVIEW_CHARS).collect();
  store.add_log(
    LogLevel::Info,
    format!("Generating workflow from description: {}...", preview),
  );

  let result = match generator.generate(request).await {
    Ok(workflow) => store
      .replace_graph(workflow.nodes.clone(), workflow.edges.clone())
      .map(|_| workflow)
      .map_err(GenerateError::from),
    Err(e) => Err(e),
  };

  match &result {
    Ok(workflow) => {
      info!(
        nodes = workflow.nodes.len(),
        edges = workflow.edges.len(),
        "workflow generated"
      );
      store.add_log(
        LogLevel::Success,
        "Workflow generated successfully from text description",
      );
    }
    Err(e) => {
      error!(error = %e, "workflow generation failed");
      store.add_log(LogLevel::Error, format!("Failed to generate workflow: {}", e));
    }
  }

  result
}

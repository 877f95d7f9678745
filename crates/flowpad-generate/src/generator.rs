use async_trait::async_trait;
use flowpad_config::{Complexity, WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GenerateError;

/// Body of a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
  pub fn new(description: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      options: None,
    }
  }

  pub fn with_options(mut self, options: GenerateOptions) -> Self {
    self.options = Some(options);
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
  Horizontal,
  Vertical,
  Hierarchical,
}

/// Hints passed through to the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_nodes: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_layout: Option<Layout>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub include_validation: Option<bool>,
}

/// Statistics some endpoints attach to a generated graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
  /// Milliseconds spent generating.
  #[serde(default)]
  pub generation_time: f64,
  #[serde(default)]
  pub node_count: usize,
  #[serde(default)]
  pub edge_count: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub complexity: Option<Complexity>,
}

/// A graph returned by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedWorkflow {
  pub nodes: Vec<WorkflowNode>,
  pub edges: Vec<WorkflowEdge>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata: Option<GenerationMetadata>,
}

impl GeneratedWorkflow {
  /// Give id-less edges the conventional `e{source}-{target}` id.
  pub(crate) fn fill_edge_ids(&mut self) {
    for edge in &mut self.edges {
      if edge.id.is_empty() {
        edge.id = format!("e{}-{}", edge.source, edge.target);
      }
    }
  }
}

/// Turns a natural-language description into a workflow graph.
#[async_trait]
pub trait WorkflowGenerator: Send + Sync {
  async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedWorkflow, GenerateError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
  error: String,
}

/// Generator backed by an HTTP endpoint.
///
/// POSTs the request as JSON. A 2xx answer carries `{nodes, edges,
/// metadata?}`; anything else is expected to carry `{error}`.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
  client: reqwest::Client,
  endpoint: Url,
}

impl HttpGenerator {
  pub fn new(endpoint: &str) -> Result<Self, GenerateError> {
    Ok(Self::with_client(reqwest::Client::new(), Url::parse(endpoint)?))
  }

  pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
    Self { client, endpoint }
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }
}

#[async_trait]
impl WorkflowGenerator for HttpGenerator {
  async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedWorkflow, GenerateError> {
    let response = self
      .client
      .post(self.endpoint.clone())
      .json(request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error)
        .unwrap_or(body);
      return Err(GenerateError::Endpoint {
        status: status.as_u16(),
        message,
      });
    }

    let mut workflow: GeneratedWorkflow = response.json().await?;
    workflow.fill_edge_ids();
    Ok(workflow)
  }
}

use chrono::{DateTime, Utc};
use flowpad_config::{Complexity, ShareLevel, WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};

/// Node/edge snapshot embedded in a template. Carries no run state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateGraph {
  #[serde(default)]
  pub nodes: Vec<WorkflowNode>,
  #[serde(default)]
  pub edges: Vec<WorkflowEdge>,
}

/// A named, read-only workflow snapshot used to seed a new document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub author: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub downloads: u64,
  #[serde(default)]
  pub rating: f32,
  #[serde(default)]
  pub is_public: bool,
  #[serde(default)]
  pub share_level: ShareLevel,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub complexity: Option<Complexity>,
  pub workflow: TemplateGraph,
}

impl Template {
  /// Capture a graph as a new user template.
  pub fn from_graph(meta: TemplateMeta, nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
    let now = Utc::now();
    let mut nodes = nodes.to_vec();
    for node in &mut nodes {
      node.data.status = Default::default();
    }

    let complexity = Some(match nodes.len() {
      0..=3 => Complexity::Simple,
      4..=7 => Complexity::Medium,
      _ => Complexity::Complex,
    });

    Self {
      id: format!("template-{}", uuid::Uuid::new_v4()),
      name: meta.name,
      description: meta.description,
      category: meta.category,
      tags: meta.tags,
      author: meta.author,
      created_at: now,
      updated_at: now,
      downloads: 0,
      rating: 0.0,
      is_public: meta.share_level == ShareLevel::Public,
      share_level: meta.share_level,
      complexity,
      workflow: TemplateGraph {
        nodes,
        edges: edges.to_vec(),
      },
    }
  }

  pub fn node_count(&self) -> usize {
    self.workflow.nodes.len()
  }

  /// Apply a partial update and refresh `updated_at`.
  pub fn apply(&mut self, patch: TemplatePatch) {
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(description) = patch.description {
      self.description = description;
    }
    if let Some(category) = patch.category {
      self.category = category;
    }
    if let Some(tags) = patch.tags {
      self.tags = tags;
    }
    if let Some(share_level) = patch.share_level {
      self.share_level = share_level;
      self.is_public = share_level == ShareLevel::Public;
    }
    self.updated_at = Utc::now();
  }

  pub(crate) fn matches(&self, needle: &str) -> bool {
    self.name.to_lowercase().contains(needle)
      || self.description.to_lowercase().contains(needle)
      || self.category.to_lowercase().contains(needle)
      || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
  }
}

/// Descriptive fields for a template created from the current document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMeta {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub author: String,
  #[serde(default)]
  pub share_level: ShareLevel,
}

/// Partial template update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tags: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub share_level: Option<ShareLevel>,
}

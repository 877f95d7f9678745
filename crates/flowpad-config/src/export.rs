//! The portable workflow file format.
//!
//! ```json
//! {
//!   "name": "Support triage",
//!   "nodes": [ { "id": "1", "type": "agent", "position": {...}, "data": {...} } ],
//!   "edges": [ { "id": "e1-2", "source": "1", "target": "2" } ],
//!   "version": "1.0"
//! }
//! ```
//!
//! Export always writes a `status` on every node. Import accepts files with
//! missing fields and fills the type-specific defaults the editor expects,
//! but rejects anything without top-level `nodes` and `edges` arrays.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::edge::WorkflowEdge;
use crate::node::WorkflowNode;

/// Current file format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Errors raised while reading a workflow file. Nothing is applied on error.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid workflow JSON format: expected an object")]
  NotAnObject,

  #[error("invalid workflow JSON format: missing `{0}` array")]
  MissingArray(&'static str),

  #[error("invalid node at index {index}: {message}")]
  InvalidNode { index: usize, message: String },

  #[error("invalid edge at index {index}: {message}")]
  InvalidEdge { index: usize, message: String },
}

/// A workflow as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExport {
  #[serde(default)]
  pub name: String,
  pub nodes: Vec<WorkflowNode>,
  pub edges: Vec<WorkflowEdge>,
  #[serde(default = "default_version")]
  pub version: String,
}

fn default_version() -> String {
  FORMAT_VERSION.to_string()
}

impl WorkflowExport {
  /// Snapshot a document for export.
  pub fn new(name: impl Into<String>, nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
    Self {
      name: name.into(),
      nodes: nodes.to_vec(),
      edges: edges.to_vec(),
      version: default_version(),
    }
  }

  pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }

  /// Suggested download name: lowercased, whitespace runs replaced by `-`.
  pub fn file_name(&self) -> String {
    let slug = self
      .name
      .split_whitespace()
      .collect::<Vec<_>>()
      .join("-")
      .to_lowercase();
    format!("{}.json", slug)
  }
}

/// Parse a workflow file, filling defaults for fields the file omits.
pub fn import_workflow(json: &str) -> Result<WorkflowExport, ImportError> {
  let value: Value = serde_json::from_str(json)?;
  let Value::Object(mut root) = value else {
    return Err(ImportError::NotAnObject);
  };

  let Some(Value::Array(raw_nodes)) = root.remove("nodes") else {
    return Err(ImportError::MissingArray("nodes"));
  };
  let Some(Value::Array(raw_edges)) = root.remove("edges") else {
    return Err(ImportError::MissingArray("edges"));
  };

  let nodes = raw_nodes
    .into_iter()
    .enumerate()
    .map(|(index, raw)| parse_node(index, raw))
    .collect::<Result<Vec<_>, _>>()?;

  let edges = raw_edges
    .into_iter()
    .enumerate()
    .map(|(index, raw)| parse_edge(index, raw))
    .collect::<Result<Vec<_>, _>>()?;

  let name = match root.remove("name") {
    Some(Value::String(name)) => name,
    _ => String::new(),
  };
  let version = match root.remove("version") {
    Some(Value::String(version)) => version,
    _ => default_version(),
  };

  Ok(WorkflowExport {
    name,
    nodes,
    edges,
    version,
  })
}

fn parse_node(index: usize, raw: Value) -> Result<WorkflowNode, ImportError> {
  let invalid = |message: String| ImportError::InvalidNode { index, message };

  let Value::Object(mut node) = raw else {
    return Err(invalid("expected an object".to_string()));
  };

  let node_type = node
    .get("type")
    .and_then(Value::as_str)
    .map(str::to_string)
    .ok_or_else(|| invalid("missing `type`".to_string()))?;

  let mut data = match node.remove("data") {
    Some(Value::Object(data)) => data,
    _ => Map::new(),
  };
  fill_common_defaults(&mut data);
  fill_type_defaults(&node_type, &mut data);
  node.insert("data".to_string(), Value::Object(data));

  serde_json::from_value(Value::Object(node)).map_err(|e| invalid(e.to_string()))
}

fn parse_edge(index: usize, raw: Value) -> Result<WorkflowEdge, ImportError> {
  let mut edge: WorkflowEdge =
    serde_json::from_value(raw).map_err(|e| ImportError::InvalidEdge {
      index,
      message: e.to_string(),
    })?;
  if edge.id.is_empty() {
    edge.id = format!("e{}-{}", edge.source, edge.target);
  }
  Ok(edge)
}

fn set_default(data: &mut Map<String, Value>, key: &str, default: Value) {
  let missing = match data.get(key) {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.is_empty() && !default.as_str().is_some_and(str::is_empty),
    _ => false,
  };
  if missing {
    data.insert(key.to_string(), default);
  }
}

fn fill_common_defaults(data: &mut Map<String, Value>) {
  for key in ["name", "label", "description", "systemPrompt", "model"] {
    set_default(data, key, json!(""));
  }
  if !data.get("capabilities").is_some_and(Value::is_array) {
    data.insert("capabilities".to_string(), json!([]));
  }
  set_default(data, "parameters", json!({}));
  set_default(data, "status", json!("idle"));
}

fn fill_type_defaults(node_type: &str, data: &mut Map<String, Value>) {
  match node_type {
    "tool" => {
      let tool_id = data.get("id").and_then(Value::as_str).unwrap_or_default();
      for (key, default) in tool_defaults(tool_id) {
        set_default(data, key, default);
      }
    }
    "conditional" => {
      set_default(data, "condition", json!(""));
      set_default(data, "conditionType", json!("javascript"));
    }
    _ => {}
  }
}

/// Defaults for the palette tools that carry their own settings.
fn tool_defaults(tool_id: &str) -> Vec<(&'static str, Value)> {
  match tool_id {
    "web-search" => vec![
      ("searchEngine", json!("google")),
      ("safeSearch", json!(true)),
      ("maxResults", json!(10)),
    ],
    "send-mail" => vec![
      ("recipients", json!([])),
      ("subject", json!("")),
      ("template", json!("")),
      ("attachments", json!([])),
    ],
    "deep-search" => vec![
      ("depth", json!(3)),
      ("breadth", json!(5)),
      ("filters", json!([])),
    ],
    "scraping" => vec![("selectors", json!([])), ("format", json!("json"))],
    "rag" => vec![
      ("vectorDb", json!("pinecone")),
      ("embeddingModel", json!("text-embedding-ada-002")),
      ("chunkSize", json!(1000)),
      ("topK", json!(5)),
    ],
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::enums::{ConditionType, NodeStatus, NodeType};
  use crate::node::NodeData;

  #[test]
  fn rejects_missing_arrays() {
    let err = import_workflow(r#"{ "name": "x", "edges": [] }"#).unwrap_err();
    assert!(matches!(err, ImportError::MissingArray("nodes")));

    let err = import_workflow(r#"{ "name": "x", "nodes": [] }"#).unwrap_err();
    assert!(matches!(err, ImportError::MissingArray("edges")));

    let err = import_workflow(r#"{ "nodes": {}, "edges": [] }"#).unwrap_err();
    assert!(matches!(err, ImportError::MissingArray("nodes")));
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(
      import_workflow("not json").unwrap_err(),
      ImportError::Json(_)
    ));
    assert!(matches!(
      import_workflow("[1, 2]").unwrap_err(),
      ImportError::NotAnObject
    ));
  }

  #[test]
  fn rejects_unknown_node_type() {
    let err = import_workflow(
      r#"{ "nodes": [ { "id": "1", "type": "rocket", "data": {} } ], "edges": [] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::InvalidNode { index: 0, .. }));
  }

  #[test]
  fn fills_tool_and_conditional_defaults() {
    let export = import_workflow(
      r#"{
        "name": "Imported",
        "nodes": [
          { "id": "t", "type": "tool", "position": { "x": 0, "y": 0 },
            "data": { "name": "Search", "id": "web-search" } },
          { "id": "r", "type": "tool", "data": { "name": "Docs", "id": "rag", "chunkSize": 500 } },
          { "id": "c", "type": "conditional", "data": { "name": "Check" } }
        ],
        "edges": [ { "source": "t", "target": "c" } ]
      }"#,
    )
    .unwrap();

    assert_eq!(export.name, "Imported");
    assert_eq!(export.version, FORMAT_VERSION);

    let search = &export.nodes[0];
    assert_eq!(search.node_type(), NodeType::Tool);
    assert_eq!(search.data.extra["searchEngine"], "google");
    assert_eq!(search.data.extra["safeSearch"], true);
    assert_eq!(search.data.extra["maxResults"], 10);
    assert_eq!(search.data.status, NodeStatus::Idle);
    assert_eq!(search.data.capabilities.as_deref(), Some(&[][..]));

    let rag = &export.nodes[1];
    assert_eq!(rag.data.extra["chunkSize"], 500);
    assert_eq!(rag.data.extra["topK"], 5);

    let check = &export.nodes[2];
    assert_eq!(check.data.condition.as_deref(), Some(""));
    assert_eq!(check.data.condition_type, Some(ConditionType::Javascript));

    assert_eq!(export.edges[0].id, "et-c");
  }

  #[test]
  fn imports_palette_shaped_tools() {
    let json = r#"{
      "name": "Notify",
      "nodes": [
        { "id": "mail", "type": "tool", "position": { "x": 0, "y": 0 },
          "data": { "name": "Send Mail", "id": "send-mail",
            "parameters": {
              "recipient": { "type": "text", "placeholder": "recipient@example.com" },
              "bodyTemplate": { "type": "textarea", "placeholder": "Email body template" },
              "attachments": { "type": "file", "multiple": true }
            } } },
        { "id": "docs", "type": "tool", "position": { "x": 200, "y": 0 },
          "data": { "name": "RAG Tool", "id": "rag",
            "parameters": {
              "chunkSize": { "type": "number", "default": 1000, "min": 100, "max": 4000 },
              "filters": { "type": "json", "placeholder": "{}" }
            } } }
      ],
      "edges": [ { "source": "mail", "target": "docs" } ]
    }"#;

    let export = import_workflow(json).unwrap();
    let reexported = serde_json::to_value(&export).unwrap();

    let mail = &reexported["nodes"][0]["data"]["parameters"];
    assert_eq!(mail["attachments"]["type"], "file");
    assert_eq!(mail["attachments"]["multiple"], true);
    assert_eq!(mail["bodyTemplate"]["type"], "textarea");

    let chunk = &reexported["nodes"][1]["data"]["parameters"]["chunkSize"];
    assert_eq!(chunk["default"], 1000);
    assert_eq!(chunk["min"], 100);
    assert_eq!(chunk["max"], 4000);

    assert_eq!(import_workflow(&export.to_json_pretty().unwrap()).unwrap(), export);
  }

  #[test]
  fn export_then_import_preserves_content() {
    let mut agent = NodeData::named("Planner");
    agent.system_prompt = Some("Plan the work".to_string());
    agent.capabilities = Some(vec!["planning".to_string()]);
    agent.model = Some("gpt-4".to_string());
    agent.status = NodeStatus::Completed;

    let nodes = vec![
      WorkflowNode::new("1", NodeType::Agent, agent),
      WorkflowNode::new("2", NodeType::Thinker, NodeData::named("Reflect")),
    ];
    let edges = vec![WorkflowEdge::between("1", "2")];

    let export = WorkflowExport::new("Plan and reflect", &nodes, &edges);
    let json = export.to_json_pretty().unwrap();
    let imported = import_workflow(&json).unwrap();

    assert_eq!(imported.name, "Plan and reflect");
    assert_eq!(imported.edges, edges);
    assert_eq!(imported.nodes.len(), 2);
    for (before, after) in nodes.iter().zip(&imported.nodes) {
      assert_eq!(before.id, after.id);
      assert_eq!(before.node_type(), after.node_type());
      assert_eq!(before.data.name, after.data.name);
    }
    assert_eq!(
      imported.nodes[0].data.system_prompt.as_deref(),
      Some("Plan the work")
    );
    assert_eq!(imported.nodes[0].data.model.as_deref(), Some("gpt-4"));
    assert_eq!(imported.nodes[0].data.status, NodeStatus::Completed);
  }

  #[test]
  fn file_name_is_slugged() {
    let export = WorkflowExport::new("Customer  Support\tFlow", &[], &[]);
    assert_eq!(export.file_name(), "customer-support-flow.json");
  }
}

//! Store behaviour observed through its public handle.

use std::sync::Arc;

use flowpad_config::{LogLevel, NodeData, NodeType, ShareLevel, WorkflowEdge, WorkflowNode};
use flowpad_store::{AppState, MAX_EXECUTION_LOGS, MemoryBackend, SaveOptions, Store};
use flowpad_templates::{Catalog, TemplateCatalog};

fn store() -> Store {
  let catalog = Catalog::builtin().unwrap();
  let state = AppState::default().with_templates(catalog.into_templates());
  Store::new(state, Arc::new(MemoryBackend::new()))
}

#[test]
fn log_keeps_the_newest_hundred() {
  let store = store();
  for i in 0..150 {
    store.add_log(LogLevel::Info, format!("line {}", i));
  }
  let messages = store.snapshot().log_messages();
  assert_eq!(messages.len(), MAX_EXECUTION_LOGS);
  assert_eq!(messages[0], "line 50");
  assert_eq!(messages[MAX_EXECUTION_LOGS - 1], "line 149");
}

#[test]
fn builtin_templates_load_into_a_valid_document() {
  let store = store();
  let ids: Vec<String> = store.read(|s| s.templates.iter().map(|t| t.id.clone()).collect());
  assert!(!ids.is_empty());

  for id in ids {
    store.load_template_by_id(&id).unwrap();
    assert!(store.validate().is_valid, "{} should validate", id);
  }
}

#[test]
fn exported_json_imports_back() {
  let store = store();
  store.set_name("Round Trip");
  store.set_nodes(vec![
    WorkflowNode::new("a", NodeType::Agent, NodeData::named("Writer")),
    WorkflowNode::new("b", NodeType::Tool, NodeData::named("Search")),
  ]);
  store.set_edges(vec![WorkflowEdge::between("a", "b")]);

  let json = store.export_json().unwrap();
  store.reset();
  store.import_json(&json).unwrap();

  let doc = store.read(|s| s.current_workflow.clone());
  assert_eq!(doc.name, "Round Trip");
  assert_eq!(doc.nodes.len(), 2);
  assert_eq!(doc.edges.len(), 1);
  assert_eq!(doc.nodes[0].display_name(), "Writer");
}

#[tokio::test(start_paused = true)]
async fn public_save_message() {
  let store = store();
  let catalog = Catalog::builtin().unwrap();
  store.load_template(catalog.get("content-creation-pipeline").unwrap());
  store.clear_logs();

  let outcome = store
    .save(Some(SaveOptions {
      share_level: ShareLevel::Public,
      ..SaveOptions::default()
    }))
    .await;
  assert!(outcome.is_saved());
  assert_eq!(
    store.snapshot().log_messages(),
    vec!["Workflow \"Content Creation Pipeline\" saved successfully and made public"]
  );
  assert_eq!(store.backend().list().await.unwrap().len(), 1);
}

//! Validation properties over whole documents.

use flowpad_config::{NodeData, NodeType, WorkflowEdge, WorkflowNode};
use flowpad_workflow::{ValidationReport, WorkflowDocument, validate};

fn node(id: &str, node_type: NodeType) -> WorkflowNode {
  WorkflowNode::new(id, node_type, NodeData::named(format!("{} {}", node_type, id)))
}

fn chain(len: usize) -> (Vec<WorkflowNode>, Vec<WorkflowEdge>) {
  let nodes: Vec<_> = (0..len)
    .map(|i| node(&i.to_string(), NodeType::Agent))
    .collect();
  let edges = (1..len)
    .map(|i| WorkflowEdge::between((i - 1).to_string(), i.to_string()))
    .collect();
  (nodes, edges)
}

#[test]
fn scenario_single_agent() {
  let doc = WorkflowDocument::from_graph("A", "", vec![node("1", NodeType::Agent)], vec![]);
  assert_eq!(
    doc.validate(),
    ValidationReport {
      is_valid: true,
      errors: vec![],
    }
  );
}

#[test]
fn scenario_agent_and_tool_without_edges() {
  let nodes = vec![node("1", NodeType::Agent), node("2", NodeType::Tool)];
  let report = validate(&nodes, &[]);
  assert!(!report.is_valid);
  assert_eq!(report.errors, vec!["2 disconnected node(s)".to_string()]);
}

#[test]
fn fully_connected_graphs_with_a_root_are_valid() {
  for len in 2..8 {
    let (nodes, edges) = chain(len);
    let report = validate(&nodes, &edges);
    assert!(report.is_valid, "chain of {} should be valid: {:?}", len, report);
  }
}

#[test]
fn cycles_with_an_entry_are_valid() {
  let (nodes, mut edges) = chain(4);
  edges.push(WorkflowEdge::between("3", "1"));
  assert!(validate(&nodes, &edges).is_valid);
}

#[test]
fn conditional_branches_are_valid() {
  let nodes = vec![
    node("in", NodeType::Agent),
    node("check", NodeType::Conditional),
    node("yes", NodeType::Tool),
    node("no", NodeType::Thinker),
  ];
  let edges = vec![
    WorkflowEdge::between("in", "check"),
    WorkflowEdge::between("check", "yes").with_handle("true"),
    WorkflowEdge::between("check", "no").with_handle("false"),
  ];
  assert!(validate(&nodes, &edges).is_valid);
}

#[test]
fn repeated_validation_is_stable() {
  let (nodes, edges) = chain(3);
  let first = validate(&nodes, &edges);
  for _ in 0..5 {
    assert_eq!(validate(&nodes, &edges), first);
  }
}

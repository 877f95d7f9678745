use flowpad_config::{
  LogLevel, NodeStatus, SettingsPatch, WorkflowEdge, WorkflowExport, WorkflowNode, WorkflowStatus,
};
use flowpad_templates::{Template, TemplatePatch};
use flowpad_workflow::WorkflowDocument;

use crate::state::{AppState, ExecutionLogEntry};

/// Every mutation of [`AppState`]. Applied by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  SetWorkflowName(String),
  SetWorkflowDescription(String),
  SetNodes(Vec<WorkflowNode>),
  SetEdges(Vec<WorkflowEdge>),
  SetWorkflowStatus(WorkflowStatus),
  /// Execution state of every node. Not a content change.
  SetNodeStatuses(NodeStatus),
  AddExecutionLog {
    level: LogLevel,
    message: String,
    node_id: Option<String>,
  },
  ClearExecutionLogs,
  SetLoading(bool),
  SetError(Option<String>),
  /// Replace the document content with a template's graph.
  LoadTemplate(Template),
  /// Replace the document content from an external source.
  ReplaceGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
  },
  /// Replace the document with a previously saved one.
  OpenWorkflow {
    id: String,
    workflow: WorkflowExport,
  },
  AddTemplate(Template),
  UpdateTemplate {
    id: String,
    patch: TemplatePatch,
  },
  DeleteTemplate(String),
  SetTemplates(Vec<Template>),
  SetMyTemplates(Vec<Template>),
  UpdateSettings(SettingsPatch),
  /// Clears `isAutoSaving`, and `hasUnsavedChanges` when the document is
  /// still the one that was saved.
  MarkSaved {
    id: String,
    revision: u64,
  },
  MarkUnsaved,
  SetAutoSaving(bool),
  ResetWorkflow,
}

/// Apply an action to the state.
pub fn reduce(state: &mut AppState, action: Action) {
  let doc = &mut state.current_workflow;

  match action {
    Action::SetWorkflowName(name) => {
      doc.name = name;
      doc.touch();
    }
    Action::SetWorkflowDescription(description) => {
      doc.description = description;
      doc.touch();
    }
    Action::SetNodes(nodes) => {
      doc.nodes = nodes;
      doc.touch();
    }
    Action::SetEdges(edges) => {
      doc.edges = edges;
      doc.touch();
    }
    Action::SetWorkflowStatus(status) => doc.status = status,
    Action::SetNodeStatuses(status) => doc.set_node_statuses(status),
    Action::AddExecutionLog {
      level,
      message,
      node_id,
    } => state.push_log(ExecutionLogEntry::new(level, message, node_id)),
    Action::ClearExecutionLogs => state.execution_logs.clear(),
    Action::SetLoading(loading) => state.is_loading = loading,
    Action::SetError(error) => state.error = error,
    Action::LoadTemplate(template) => {
      let mut next = WorkflowDocument::from_graph(
        template.name,
        template.description,
        template.workflow.nodes,
        template.workflow.edges,
      );
      next.set_node_statuses(NodeStatus::Idle);
      next.touch();
      *doc = next;
    }
    Action::ReplaceGraph { nodes, edges } => {
      let mut next =
        WorkflowDocument::from_graph(doc.name.clone(), doc.description.clone(), nodes, edges);
      next.touch();
      *doc = next;
    }
    Action::OpenWorkflow { id, workflow } => {
      let mut next = WorkflowDocument::from_graph(workflow.name, "", workflow.nodes, workflow.edges);
      next.id = id;
      *doc = next;
    }
    Action::AddTemplate(template) => state.my_templates.push(template),
    Action::UpdateTemplate { id, patch } => {
      if let Some(template) = state.my_templates.iter_mut().find(|t| t.id == id) {
        template.apply(patch);
      }
    }
    Action::DeleteTemplate(id) => state.my_templates.retain(|t| t.id != id),
    Action::SetTemplates(templates) => state.templates = templates,
    Action::SetMyTemplates(templates) => state.my_templates = templates,
    Action::UpdateSettings(patch) => state.settings.apply(patch),
    Action::MarkSaved { id, revision } => {
      doc.is_auto_saving = false;
      if doc.id == id && doc.revision == revision {
        doc.has_unsaved_changes = false;
      }
    }
    Action::MarkUnsaved => doc.has_unsaved_changes = true,
    Action::SetAutoSaving(saving) => doc.is_auto_saving = saving,
    Action::ResetWorkflow => {
      *doc = WorkflowDocument::new();
      state.execution_logs.clear();
    }
  }
}

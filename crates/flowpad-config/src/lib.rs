//! flowpad Config
//!
//! Serializable types shared by every flowpad crate: workflow nodes and
//! edges, editor settings, and the portable JSON file format.
//!
//! These types are plain data. The live document, validation and the store
//! are built on top of them in `flowpad-workflow` and `flowpad-store`.

mod edge;
mod enums;
mod export;
mod node;
mod settings;

pub use edge::WorkflowEdge;
pub use enums::{
  Complexity, ConditionType, EdgeType, LogLevel, NodeStatus, NodeType, ParameterType,
  ShareLevel, ThinkingStrategy, Verbosity, WorkflowStatus,
};
pub use export::{FORMAT_VERSION, ImportError, WorkflowExport, import_workflow};
pub use node::{NodeData, Position, ToolParameter, WorkflowNode};
pub use settings::{Settings, SettingsPatch};

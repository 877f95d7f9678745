//! flowpad Workflow
//!
//! The live workflow document and the pure analysis run over it:
//! - [`WorkflowDocument`]: nodes, edges, status and save bookkeeping
//! - [`Graph`]: adjacency, start nodes and disconnected nodes
//! - [`validate`]: the structural rules that gate a run

mod error;
mod graph;
mod validation;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use validation::{ValidationIssue, ValidationReport, check, validate};
pub use workflow::{DEFAULT_WORKFLOW_NAME, WorkflowDocument};

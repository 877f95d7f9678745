//! flowpad Store
//!
//! The single source of truth for the editor. All state lives in one
//! [`AppState`] behind a [`Store`] handle and changes only through
//! [`Action`]s applied by [`reduce`].
//!
//! ```text
//!  canvas / engine / CLI
//!          │ dispatch(Action)
//!          ▼
//!   ┌─────────────┐   send_modify    ┌──────────────────┐
//!   │    Store    │ ───────────────► │ watch<AppState>  │──► subscribers
//!   └─────────────┘                  └──────────────────┘    (auto-save,
//!          │ save / open                                      sync bridge)
//!          ▼
//!   WorkflowBackend (MemoryBackend)
//! ```
//!
//! Store operations never fail loudly: save and open failures become log
//! entries and the `error` field, mirroring what the editor shows.

mod action;
mod backend;
mod error;
mod state;
mod store;

pub use action::{Action, reduce};
pub use backend::{
  DEFAULT_SAVE_LATENCY, MemoryBackend, SaveOptions, SavedWorkflow, WorkflowBackend,
};
pub use error::{BackendError, StoreError};
pub use state::{AppState, ExecutionLogEntry, MAX_EXECUTION_LOGS};
pub use store::{SaveOutcome, Store, log};

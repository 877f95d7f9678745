//! flowpad Engine
//!
//! Background behaviour layered over the store:
//!
//! ```text
//!   ExecutionController ──start──► Simulator::run ──dispatch_unless──► Store
//!           │                          ▲
//!           └──stop / reset (cancel)───┘
//!
//!   AutoSaver ◄──subscribe── Store ──save──► WorkflowBackend
//! ```
//!
//! - [`Simulator`]: simulated node-by-node execution with injected randomness
//! - [`ExecutionController`]: owns cancellation of in-flight runs
//! - [`AutoSaver`]: debounced save after edits

mod autosave;
mod controller;
mod simulator;

pub use autosave::{AutoSaveHandle, AutoSaver, DEFAULT_AUTO_SAVE_DELAY};
pub use controller::ExecutionController;
pub use simulator::{RunOutcome, Simulator, SimulatorConfig};

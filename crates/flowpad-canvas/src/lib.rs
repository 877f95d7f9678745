//! flowpad Canvas
//!
//! The editing surface and its bridge to the store. The canvas owns layout
//! and selection; the store owns the document. [`SyncBridge::reconcile`]
//! moves content between them after each batch of edits.

mod canvas;
mod error;
mod sync;

pub use canvas::Canvas;
pub use error::CanvasError;
pub use sync::{SyncBridge, SyncReport};

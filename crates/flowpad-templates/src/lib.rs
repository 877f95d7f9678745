//! flowpad Templates
//!
//! Reusable workflow snapshots and the read-only catalog they are browsed
//! from. Loading a template into the store is done by `flowpad-store`.
//!
//! ```text
//! templates/*.json ──include_str!──► Catalog::builtin()
//! <dir>/*.json ─────────────────────► Catalog::from_dir()
//!                                        │
//!                                        ▼
//!                      TemplateCatalog: get / search / by_category
//! ```

mod catalog;
mod error;
mod template;

pub use catalog::{Catalog, TemplateCatalog};
pub use error::CatalogError;
pub use template::{Template, TemplateGraph, TemplateMeta, TemplatePatch};

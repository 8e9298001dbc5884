//! Core library surface for Pocket Player, a terminal player for imported
//! audio files with optional cover images.
//!
//! The binary wires these pieces together; the modules stay usable on their
//! own so the import flow and the playback controller can be tested without a
//! terminal.
pub mod config;
pub mod db;
pub mod error;
pub mod importer;
pub mod library;
pub mod logging;
pub mod models;
pub mod playback;
pub mod ui;

/// Persistence entry point used by `main.rs`.
pub use db::ensure_schema;

pub use config::AppPaths;
pub use error::{MediaError, MediaResult};
pub use importer::Importer;
pub use models::{AudioEntry, ImageEntry};
pub use playback::{MediaController, RodioEngine};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};

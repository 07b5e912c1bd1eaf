// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod picker;
pub mod render;
pub mod sources;
pub mod types;

// Re-exports
pub use client::{DocumentQa, QaService};
pub use error::{Error, FailureKind, Result};
pub use observability::register_biometrics;
pub use picker::FilePicker;
pub use render::{PlainTextRenderer, Renderer};
pub use sources::{dedup_labels, source_label};
pub use types::*;

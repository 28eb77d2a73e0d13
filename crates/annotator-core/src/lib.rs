//! Annotator Core - batch template-driven annotation
//!
//! Loads a collection of JSON records, lets callers edit them cell by cell,
//! and sends a selected subset through a text-generation service:
//! - Renders a `{field}` template per record
//! - Dispatches one concurrent, isolated call per record
//! - Reconciles the outcomes back into the full collection
//! - Grows the column registry as results appear
//!
//! # Example
//!
//! ```rust,ignore
//! use annotator_core::{AnnotatorConfig, Workbench};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnnotatorConfig::load(None)?;
//! let mut bench = Workbench::from_config(&config)?;
//!
//! bench.load_json(r#"[{"title":"Hi"},{"title":"Bye"}]"#)?;
//! let summary = bench.process_all("Translate {title} to French").await?;
//!
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! println!("{}", bench.export_json()?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod cell;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod reconciler;
pub mod schema;
pub mod service;
pub mod store;
pub mod template;
pub mod types;
pub mod workbench;

// Re-exports for convenience
pub use cell::{CellEditor, CellState};
pub use config::{AnnotatorConfig, ServiceConfig};
pub use dispatcher::BatchDispatcher;
pub use error::{
    AnnotatorError, ConfigError, EditError, LoadError, SchemaError, ServiceError, StoreError,
};
pub use reconciler::{MergeSummary, ResultColumn};
pub use schema::Schema;
pub use service::{ChatCompletionsClient, TextGenerator};
pub use store::RowStore;
pub use template::{display_value, placeholders, render};
pub use types::{BatchId, BatchReport, ColumnDescriptor, Outcome, Record, FAILURE_MARKER_PREFIX};
pub use workbench::{ProcessSummary, Workbench, DEFAULT_EXPORT_FILE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Annotator Core
    pub use crate::{
        AnnotatorConfig, BatchDispatcher, CellEditor, Outcome, Record, RowStore, TextGenerator,
        Workbench,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

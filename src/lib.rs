//! SQL Suggest - Library
//! Statement-position aware SQL completion with pluggable dialects

pub mod completion;
pub mod config;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod sql;

pub use completion::{CompletionEngine, CompletionItem, CompletionItemKind, CompletionItemPriority, Position, Range};
pub use config::EngineConfig;
pub use dialect::{BigQueryDialect, CustomSuggestionKind, Dialect};
pub use error::{CompletionError, Result};
pub use metadata::{ColumnDefinition, InMemoryMetadata, MetadataProvider, TableDefinition};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

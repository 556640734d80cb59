//! Metadata provider abstraction trait
//!
//! Defines the interface a dialect or host implements so table and column
//! suggestions can reach a real catalog.

use crate::metadata::{ColumnDefinition, TableDefinition};
use anyhow::Result;
use async_trait::async_trait;

/// Trait that all metadata sources must implement.
///
/// All methods are async because listings usually come from the network.
/// Errors are reported per call; the completion engine logs them and keeps
/// the rest of the request.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List tables, optionally inside a dataset path such as `project.dataset`
    async fn list_tables(&self, dataset: Option<&str>) -> Result<Vec<TableDefinition>>;

    /// Get column definitions for a (possibly qualified) table name
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>>;
}

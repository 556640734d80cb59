//! In-memory metadata provider backed by a fixed catalog

use crate::metadata::{ColumnDefinition, MetadataProvider, TableDefinition};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Dataset path used for tables listed without a dataset
const ROOT_DATASET: &str = "";

/// Catalog held in memory.
///
/// `tables` maps a dataset path to its tables (`""` is the root listing),
/// `columns` maps a table name, qualified or not, to its columns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryMetadata {
    #[serde(default)]
    tables: BTreeMap<String, Vec<TableDefinition>>,
    #[serde(default)]
    columns: BTreeMap<String, Vec<ColumnDefinition>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tables under a dataset path, or the root listing for `None`
    pub fn with_tables(mut self, dataset: Option<&str>, tables: Vec<TableDefinition>) -> Self {
        self.tables
            .entry(dataset.unwrap_or(ROOT_DATASET).to_string())
            .or_default()
            .extend(tables);
        self
    }

    pub fn with_columns(mut self, table: &str, columns: Vec<ColumnDefinition>) -> Self {
        self.columns.entry(table.to_string()).or_default().extend(columns);
        self
    }

    /// Parse a catalog from JSON (`{"tables": {...}, "columns": {...}}`)
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse metadata catalog")
    }

    /// Load a JSON catalog from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&content)
    }
}

#[async_trait]
impl MetadataProvider for InMemoryMetadata {
    async fn list_tables(&self, dataset: Option<&str>) -> Result<Vec<TableDefinition>> {
        let key = dataset.unwrap_or(ROOT_DATASET);
        Ok(self.tables.get(key).cloned().unwrap_or_default())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_by_dataset() {
        let catalog = InMemoryMetadata::new()
            .with_tables(None, vec![TableDefinition::new("orders")])
            .with_tables(Some("proj.sales"), vec![TableDefinition::new("invoices")]);

        let root = catalog.list_tables(None).await.unwrap();
        assert_eq!(root, vec![TableDefinition::new("orders")]);

        let nested = catalog.list_tables(Some("proj.sales")).await.unwrap();
        assert_eq!(nested[0].name, "invoices");

        assert!(catalog.list_tables(Some("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_table_has_no_columns() {
        let catalog = InMemoryMetadata::new()
            .with_columns("orders", vec![ColumnDefinition::new("id").with_type("INT64")]);

        let columns = catalog.list_columns("orders").await.unwrap();
        assert_eq!(columns[0].data_type.as_deref(), Some("INT64"));
        assert!(catalog.list_columns("customers").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_json() {
        let catalog = InMemoryMetadata::from_json(
            r#"{
                "tables": {"": [{"name": "orders"}], "proj.sales": [{"name": "my table", "completion": "`my table`"}]},
                "columns": {"orders": [{"name": "id", "type": "INT64"}]}
            }"#,
        )
        .unwrap();

        let nested = catalog.list_tables(Some("proj.sales")).await.unwrap();
        assert_eq!(nested[0].completion.as_deref(), Some("`my table`"));
        let columns = catalog.list_columns("orders").await.unwrap();
        assert_eq!(columns[0].data_type.as_deref(), Some("INT64"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = InMemoryMetadata::from_json("not json").unwrap_err();
        assert!(err.to_string().contains("metadata catalog"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"tables": {"": [{"name": "orders"}]}}"#).unwrap();

        let catalog = InMemoryMetadata::load(&path).unwrap();
        assert_eq!(catalog.tables[""].len(), 1);
        assert!(InMemoryMetadata::load(&dir.path().join("missing.json")).is_err());
    }
}

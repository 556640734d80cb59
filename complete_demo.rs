//! Print completion items for a handful of sample queries
//!
//! Run with: cargo run --bin complete_demo [catalog.json]
//!
//! Without an argument a small built-in BigQuery catalog is used. The `|`
//! in each sample marks the cursor.

use sql_suggest::{
    init_logging, BigQueryDialect, ColumnDefinition, CompletionEngine, EngineConfig, InMemoryMetadata, Position,
    TableDefinition,
};
use std::path::Path;
use std::sync::Arc;

const SAMPLES: &[&str] = &[
    "|",
    "SELECT |",
    "SELECT  |FROM proj.sales.orders",
    "SELECT id FROM |",
    "SELECT id FROM proj.|",
    "SELECT id FROM proj.sales.orders |",
    "SELECT id FROM proj.sales.orders WHERE status |",
    "SELECT id FROM proj.sales.orders ORDER BY |",
];

fn sample_catalog() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_tables(None, vec![TableDefinition::new("proj")])
        .with_tables(Some("proj"), vec![TableDefinition::new("sales")])
        .with_tables(
            Some("proj.sales"),
            vec![TableDefinition::new("orders"), TableDefinition::new("daily totals")],
        )
        .with_columns(
            "proj.sales.orders",
            vec![
                ColumnDefinition::new("id").with_type("INT64"),
                ColumnDefinition::new("status").with_type("STRING"),
                ColumnDefinition::new("amount").with_type("NUMERIC"),
            ],
        )
}

/// Split a sample at its cursor marker into text and 1-based position
fn split_cursor(sample: &str) -> (String, Position) {
    let mut line_number = 1;
    let mut column = 1;
    for (index, c) in sample.char_indices() {
        if c == '|' {
            let text = format!("{}{}", &sample[..index], &sample[index + 1..]);
            return (text, Position::new(line_number, column));
        }
        if c == '\n' {
            line_number += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (sample.to_string(), Position::new(line_number, column))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::load();
    init_logging(&config.log_filter);

    let catalog = match std::env::args().nth(1) {
        Some(path) => InMemoryMetadata::load(Path::new(&path))?,
        None => sample_catalog(),
    };

    let engine = CompletionEngine::with_config(config);
    engine
        .register_dialect(Arc::new(BigQueryDialect::new(Arc::new(catalog))))
        .await;

    println!("=== SQL Completion Demo ===");
    println!("Trigger characters: {:?}\n", engine.trigger_characters().await);

    for sample in SAMPLES {
        let (text, position) = split_cursor(sample);
        let positions = engine.statement_positions(&text, &engine.tokenize(&text), position).await;
        let items = engine.complete(&text, position).await;

        println!("Query:     {sample}");
        println!("Positions: {}", positions.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", "));
        for item in &items {
            println!(
                "  [{}] {:<10} {:<32} -> {:?}",
                item.sort_text.sort_text(),
                item.kind_label(),
                item.label,
                item.insert_text
            );
        }
        println!();
    }

    Ok(())
}

//! BigQuery dialect
//!
//! Adds BigQuery aggregates and operators, qualified `project.dataset.table`
//! names for column lookup, and table suggestions inside a dataset path
//! typed after FROM.

use super::{CustomSuggestionKind, Dialect};
use crate::completion::{
    CompletionItemKind, FunctionDefinition, LinkedToken, OperatorDefinition, OperatorType, PositionContext,
    PositionInput, PositionResolverEntry, StatementPosition, Suggestion, SuggestionResolver, TokenKind,
};
use crate::metadata::MetadataProvider;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub const LANGUAGE_ID: &str = "bigquery";

/// Cursor is inside a dotted path after FROM
pub const AFTER_DATASET: &str = "afterDataset";

/// Tables of the dataset path typed before the cursor
pub const TABLES_WITHIN_DATASET: &str = "tablesWithinDataset";

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "ANY_VALUE",
    "ARRAY_AGG",
    "ARRAY_CONCAT_AGG",
    "AVG",
    "BIT_AND",
    "BIT_OR",
    "BIT_XOR",
    "COUNT",
    "COUNTIF",
    "LOGICAL_AND",
    "LOGICAL_OR",
    "MAX",
    "MIN",
    "STRING_AGG",
    "SUM",
];

const OPERATORS: &[(&str, &str, OperatorType)] = &[
    ("LESS_THAN", "<", OperatorType::Comparison),
    ("LESS_THAN_EQUAL", "<=", OperatorType::Comparison),
    ("GREATER_THAN", ">", OperatorType::Comparison),
    ("GREATER_THAN_EQUAL", ">=", OperatorType::Comparison),
    ("EQUAL", "=", OperatorType::Comparison),
    ("NOT_EQUAL", "!=", OperatorType::Comparison),
    ("NOT_EQUAL_ALT", "<>", OperatorType::Comparison),
    ("LIKE", "LIKE", OperatorType::Comparison),
    ("LOGICAL_AND", "AND", OperatorType::Logical),
    ("LOGICAL_OR", "OR", OperatorType::Logical),
];

const TRIGGER_CHARACTERS: &[char] = &['.', ' ', '$', ',', '(', '\''];

/// BigQuery-flavoured SQL backed by a metadata provider
pub struct BigQueryDialect {
    metadata: Arc<dyn MetadataProvider>,
}

impl BigQueryDialect {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { metadata }
    }
}

impl Dialect for BigQueryDialect {
    fn id(&self) -> &str {
        LANGUAGE_ID
    }

    fn supported_functions(&self) -> Vec<FunctionDefinition> {
        AGGREGATE_FUNCTIONS
            .iter()
            .map(|name| FunctionDefinition::named(name))
            .collect()
    }

    fn supported_operators(&self) -> Vec<OperatorDefinition> {
        OPERATORS
            .iter()
            .map(|&(id, operator, operator_type)| OperatorDefinition::new(id, operator, operator_type))
            .collect()
    }

    fn custom_statement_placements(&self) -> Vec<PositionResolverEntry> {
        vec![PositionResolverEntry::custom(AFTER_DATASET, after_dataset)]
    }

    fn custom_suggestion_kinds(&self) -> Vec<CustomSuggestionKind> {
        vec![CustomSuggestionKind::new(
            TABLES_WITHIN_DATASET,
            vec![StatementPosition::from(AFTER_DATASET)],
            Arc::new(TablesWithinDataset {
                metadata: Arc::clone(&self.metadata),
            }),
        )]
    }

    fn metadata(&self) -> Option<Arc<dyn MetadataProvider>> {
        Some(Arc::clone(&self.metadata))
    }

    fn parse_table_name(&self, token: LinkedToken<'_>) -> Option<String> {
        Some(qualified_name(token))
    }

    fn trigger_characters(&self) -> Vec<char> {
        TRIGGER_CHARACTERS.to_vec()
    }
}

/// Previous keyword is FROM and the cursor is on or right after a `.`
fn after_dataset(input: &PositionInput<'_>) -> bool {
    let is_dot = |token: LinkedToken<'_>| token.is_value(TokenKind::Delimiter, ".");
    let on_dot = input
        .current
        .map(|current| is_dot(current) || current.previous().map(is_dot).unwrap_or(false))
        .unwrap_or(false);

    input.previous_keyword_is("FROM") && on_dot
}

/// Join `token` with the tokens that follow it up to the next whitespace,
/// keyword or parenthesis, dropping backtick quoting.
fn qualified_name(token: LinkedToken<'_>) -> String {
    let mut name = token.value().to_string();
    let mut cursor = token;
    while let Some(next) = cursor.next() {
        if next.is_keyword() || next.is_parenthesis() || next.is_whitespace() {
            break;
        }
        name.push_str(next.value());
        cursor = next;
    }
    name.replace('`', "")
}

/// Dotted path typed directly before the current token, without the
/// trailing separator (`proj.sales.` gives `proj.sales`)
fn dataset_path(current: Option<LinkedToken<'_>>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut cursor = current.and_then(|token| token.previous());
    while let Some(token) = cursor {
        if token.is_whitespace() {
            break;
        }
        parts.push(token.value());
        cursor = token.previous();
    }
    parts.reverse();

    let path = parts.concat().replace('`', "");
    path.trim_end_matches('.').to_string()
}

/// Names with spaces, dots or dashes must be backtick-quoted to insert
fn needs_quoting(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[\s.\-]").ok())
        .as_ref()
        .map(|pattern| pattern.is_match(name))
        .unwrap_or(false)
}

struct TablesWithinDataset {
    metadata: Arc<dyn MetadataProvider>,
}

#[async_trait]
impl SuggestionResolver for TablesWithinDataset {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        let path = dataset_path(ctx.current_token);
        debug!(dataset = %path, "listing tables within dataset");

        let range = ctx.range.collapse_to_end();
        let tables = self.metadata.list_tables(Some(&path)).await?;
        Ok(tables
            .into_iter()
            .map(|table| {
                let insert = match table.completion {
                    Some(completion) => completion,
                    None if needs_quoting(&table.name) => format!("`{}`", table.name),
                    None => table.name.clone(),
                };
                Suggestion::new(table.name)
                    .insert_text(insert)
                    .kind(CompletionItemKind::Field)
                    .range(range)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{replacement_range, Lexicon, Position, StatementPositionRegistry, TokenChain};
    use crate::metadata::{InMemoryMetadata, TableDefinition};
    use crate::sql::tokenize;

    fn dialect() -> BigQueryDialect {
        BigQueryDialect::new(Arc::new(
            InMemoryMetadata::new()
                .with_tables(
                    Some("proj.sales"),
                    vec![TableDefinition::new("orders"), TableDefinition::new("daily totals")],
                )
                .with_tables(Some("proj"), vec![TableDefinition::new("sales")]),
        ))
    }

    fn registry() -> StatementPositionRegistry {
        let mut registry = StatementPositionRegistry::standard();
        for entry in dialect().custom_statement_placements() {
            registry.register(entry);
        }
        registry
    }

    fn positions_at_end(text: &str) -> Vec<StatementPosition> {
        let chain = TokenChain::build(&tokenize(text), text);
        let cursor = Position::new(1, text.chars().count() + 1);
        registry().resolve(chain.token_at(cursor), cursor)
    }

    #[test]
    fn test_after_dataset_on_dot() {
        let positions = positions_at_end("SELECT a FROM proj.");
        assert_eq!(positions[0], StatementPosition::AfterTable);
        assert!(positions.contains(&StatementPosition::from(AFTER_DATASET)));
    }

    #[test]
    fn test_after_dataset_while_typing_table() {
        let positions = positions_at_end("SELECT a FROM proj.sales.ord");
        assert!(positions.contains(&StatementPosition::from(AFTER_DATASET)));
    }

    #[test]
    fn test_no_dataset_without_dot() {
        let positions = positions_at_end("SELECT a FROM proj");
        assert!(!positions.contains(&StatementPosition::from(AFTER_DATASET)));

        let positions = positions_at_end("SELECT a.b ");
        assert!(!positions.contains(&StatementPosition::from(AFTER_DATASET)));
    }

    #[test]
    fn test_qualified_name_stops_at_whitespace_and_keywords() {
        let text = "SELECT a FROM `proj.sales`.orders WHERE";
        let chain = TokenChain::build(&tokenize(text), text);
        let table = chain.iter().find(|t| t.value().starts_with('`')).unwrap();
        assert_eq!(qualified_name(table), "proj.sales.orders");

        let text = "SELECT a FROM proj.sales.orders";
        let chain = TokenChain::build(&tokenize(text), text);
        let table = chain.iter().find(|t| t.value() == "proj").unwrap();
        assert_eq!(dialect().parse_table_name(table).as_deref(), Some("proj.sales.orders"));
    }

    #[test]
    fn test_dataset_path_trims_separator() {
        let text = "SELECT a FROM proj.sales.ord";
        let chain = TokenChain::build(&tokenize(text), text);
        let current = chain.token_at(Position::new(1, text.len() + 1));
        assert_eq!(current.unwrap().value(), "ord");
        assert_eq!(dataset_path(current), "proj.sales");

        let text = "SELECT a FROM proj.";
        let chain = TokenChain::build(&tokenize(text), text);
        let current = chain.token_at(Position::new(1, text.len() + 1));
        assert_eq!(dataset_path(current), "proj");
    }

    #[tokio::test]
    async fn test_tables_within_dataset() {
        let text = "SELECT a FROM proj.sales.";
        let chain = TokenChain::build(&tokenize(text), text);
        let lexicon = Lexicon::standard();
        let position = Position::new(1, text.len() + 1);
        let current = chain.token_at(position);
        let ctx = PositionContext {
            position,
            current_token: current,
            statement_positions: vec![StatementPosition::from(AFTER_DATASET)],
            kinds: Vec::new(),
            range: replacement_range(current, position),
            lexicon: &lexicon,
        };

        let kinds = dialect().custom_suggestion_kinds();
        let suggestions = kinds[0].resolver.suggestions(&ctx).await.unwrap();
        let inserts: Vec<_> = suggestions.iter().filter_map(|s| s.insert_text.as_deref()).collect();
        assert_eq!(inserts, vec!["orders", "`daily totals`"]);

        let range = suggestions[0].range.unwrap();
        assert_eq!(range.start_column, range.end_column);
        assert_eq!(range.end_column, position.column);
    }

    #[test]
    fn test_lexicon_contributions() {
        let dialect = dialect();
        assert_eq!(dialect.supported_functions().len(), 15);
        assert!(dialect
            .supported_operators()
            .iter()
            .any(|op| op.id == "NOT_EQUAL_ALT" && op.operator == "<>"));
        assert_eq!(dialect.trigger_characters(), vec!['.', ' ', '$', ',', '(', '\'']);
    }
}

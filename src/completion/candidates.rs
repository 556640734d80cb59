//! Suggestion resolvers
//!
//! One resolver per suggestion kind turns a position context into raw
//! suggestions. Keyword, function and operator kinds are static; Tables and
//! Columns are empty until a dialect brings a metadata provider.

use super::context::PositionContext;
use super::kinds::SuggestionKind;
use super::lexicon::{OperatorType, ASC, BY, DESC, FROM, GROUP, LIMIT, ORDER, SELECT, WHERE};
use super::registry::Registry;
use super::token::Range;
use super::{Command, CompletionItem, CompletionItemKind, CompletionItemPriority, InsertTextRule};
use crate::dialect::Dialect;
use crate::metadata::MetadataProvider;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A completion item before the engine fills in defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suggestion {
    pub label: String,
    /// Defaults to the label
    pub insert_text: Option<String>,
    /// Defaults to `Field`
    pub kind: Option<CompletionItemKind>,
    /// Defaults to `Medium`
    pub sort_text: Option<CompletionItemPriority>,
    pub insert_text_rules: Option<InsertTextRule>,
    pub command: Option<Command>,
    /// Defaults to the request's replacement range
    pub range: Option<Range>,
    pub detail: Option<String>,
}

impl Suggestion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    pub fn kind(mut self, kind: CompletionItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn priority(mut self, priority: CompletionItemPriority) -> Self {
        self.sort_text = Some(priority);
        self
    }

    /// Treat the insert text as a snippet with `$N` tab stops
    pub fn snippet(mut self) -> Self {
        self.insert_text_rules = Some(InsertTextRule::Snippet);
        self
    }

    /// Reopen suggestions after accept
    pub fn retrigger(mut self) -> Self {
        self.command = Some(Command::trigger_suggest());
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn into_item(self, default_range: Range) -> CompletionItem {
        CompletionItem {
            insert_text: self.insert_text.unwrap_or_else(|| self.label.clone()),
            label: self.label,
            kind: self.kind.unwrap_or_default(),
            sort_text: self.sort_text.unwrap_or_default(),
            insert_text_rules: self.insert_text_rules.unwrap_or_default(),
            command: self.command,
            range: self.range.unwrap_or(default_range),
            detail: self.detail,
        }
    }
}

/// Produces suggestions for one suggestion kind.
///
/// Resolvers only read shared state; a failed resolver contributes nothing
/// to the request.
#[async_trait]
pub trait SuggestionResolver: Send + Sync {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>>;
}

/// Fixed list of suggestions
#[derive(Clone, Debug, Default)]
pub struct StaticSuggestions(pub Vec<Suggestion>);

#[async_trait]
impl SuggestionResolver for StaticSuggestions {
    async fn suggestions(&self, _ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        Ok(self.0.clone())
    }
}

/// Contributes nothing; placeholder for extension points
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptySuggestions;

#[async_trait]
impl SuggestionResolver for EmptySuggestions {
    async fn suggestions(&self, _ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        Ok(Vec::new())
    }
}

/// Every function of the lexicon, as `NAME($0)` or `NAME()`
#[derive(Clone, Copy, Debug)]
pub struct FunctionSuggestions {
    pub with_arguments: bool,
}

#[async_trait]
impl SuggestionResolver for FunctionSuggestions {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        Ok(ctx
            .lexicon
            .functions()
            .map(|function| {
                let insert = if self.with_arguments {
                    format!("{}($0)", function.name)
                } else {
                    format!("{}()", function.name)
                };
                Suggestion::new(function.name.clone())
                    .insert_text(insert)
                    .snippet()
                    .kind(CompletionItemKind::Function)
                    .retrigger()
                    .priority(CompletionItemPriority::MediumHigh)
            })
            .collect())
    }
}

/// Operators of one type from the lexicon
#[derive(Clone, Copy, Debug)]
pub struct OperatorSuggestions(pub OperatorType);

#[async_trait]
impl SuggestionResolver for OperatorSuggestions {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        let kind = match self.0 {
            OperatorType::Comparison => CompletionItemKind::Operator,
            OperatorType::Logical => CompletionItemKind::Keyword,
        };
        Ok(ctx
            .lexicon
            .operators_of(self.0)
            .map(|op| {
                Suggestion::new(op.operator.clone())
                    .insert_text(format!("{} ", op.operator))
                    .kind(kind)
                    .retrigger()
                    .priority(CompletionItemPriority::High)
            })
            .collect())
    }
}

/// Union of two resolvers, base results first.
///
/// If either side fails the whole kind fails, matching how a single
/// resolver failure is handled.
pub struct ComposedResolver {
    pub base: Arc<dyn SuggestionResolver>,
    pub extension: Arc<dyn SuggestionResolver>,
}

#[async_trait]
impl SuggestionResolver for ComposedResolver {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        let (base, extension) = futures::join!(self.base.suggestions(ctx), self.extension.suggestions(ctx));
        let mut suggestions = base?;
        suggestions.extend(extension?);
        Ok(suggestions)
    }
}

/// Tables from a metadata provider
pub struct TablesResolver {
    pub provider: Arc<dyn MetadataProvider>,
}

#[async_trait]
impl SuggestionResolver for TablesResolver {
    async fn suggestions(&self, _ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        let tables = self.provider.list_tables(None).await?;
        Ok(tables
            .into_iter()
            .map(|table| {
                let insert = table.completion.unwrap_or_else(|| table.name.clone());
                Suggestion::new(table.name)
                    .insert_text(insert)
                    .kind(CompletionItemKind::Field)
                    .priority(CompletionItemPriority::High)
            })
            .collect())
    }
}

/// Columns of the statement's table from a metadata provider.
///
/// The table name comes from the dialect's parser when it has one, so
/// qualified names such as `project.dataset.table` arrive whole; otherwise
/// the raw table token is used.
pub struct ColumnsResolver {
    pub provider: Arc<dyn MetadataProvider>,
    pub dialect: Option<Arc<dyn Dialect>>,
}

impl ColumnsResolver {
    pub fn table_name(&self, ctx: &PositionContext<'_>) -> Option<String> {
        let token = ctx.table_token()?;
        let parsed = self
            .dialect
            .as_ref()
            .and_then(|dialect| dialect.parse_table_name(token));
        let name = parsed.unwrap_or_else(|| token.value().to_string());
        (!name.is_empty()).then_some(name)
    }
}

#[async_trait]
impl SuggestionResolver for ColumnsResolver {
    async fn suggestions(&self, ctx: &PositionContext<'_>) -> Result<Vec<Suggestion>> {
        let Some(table) = self.table_name(ctx) else {
            debug!("no table reference in statement, skipping columns");
            return Ok(Vec::new());
        };

        let columns = self.provider.list_columns(&table).await?;
        Ok(columns
            .into_iter()
            .map(|column| {
                let insert = column.completion.unwrap_or_else(|| column.name.clone());
                let suggestion = Suggestion::new(column.name)
                    .insert_text(insert)
                    .kind(CompletionItemKind::Field)
                    .priority(CompletionItemPriority::High);
                match column.data_type {
                    Some(data_type) => suggestion.detail(data_type),
                    None => suggestion,
                }
            })
            .collect())
    }
}

/// Suggestion kind to resolver
#[derive(Clone, Default)]
pub struct SuggestionResolverRegistry {
    resolvers: Registry<SuggestionKind, Arc<dyn SuggestionResolver>>,
}

impl std::fmt::Debug for SuggestionResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|(kind, _)| kind))
            .finish()
    }
}

impl SuggestionResolverRegistry {
    /// Resolvers for every built-in suggestion kind
    pub fn standard() -> Self {
        use SuggestionKind as K;

        let mut registry = Self::default();
        registry.register(K::SelectKeyword, Arc::new(StaticSuggestions(select_snippets())));
        registry.register(
            K::FromKeyword,
            Arc::new(StaticSuggestions(vec![Suggestion::new(FROM)
                .insert_text(format!("{FROM} $0"))
                .snippet()
                .kind(CompletionItemKind::Keyword)])),
        );
        registry.register(
            K::WhereKeyword,
            Arc::new(StaticSuggestions(vec![
                clause_keyword(WHERE, format!("{WHERE} ")).priority(CompletionItemPriority::High)
            ])),
        );
        registry.register(
            K::GroupByKeywords,
            Arc::new(StaticSuggestions(vec![clause_keyword(
                format!("{GROUP} {BY}"),
                format!("{GROUP} {BY} "),
            )
            .priority(CompletionItemPriority::MediumHigh)])),
        );
        registry.register(
            K::OrderByKeywords,
            Arc::new(StaticSuggestions(vec![clause_keyword(
                format!("{ORDER} {BY}"),
                format!("{ORDER} {BY} "),
            )
            .priority(CompletionItemPriority::Medium)])),
        );
        registry.register(
            K::LimitKeyword,
            Arc::new(StaticSuggestions(vec![
                clause_keyword(LIMIT, format!("{LIMIT} ")).priority(CompletionItemPriority::MediumLow)
            ])),
        );
        registry.register(
            K::SortOrderDirectionKeyword,
            Arc::new(StaticSuggestions(
                [ASC, DESC]
                    .iter()
                    .map(|direction| clause_keyword(*direction, format!("{direction} ")))
                    .collect(),
            )),
        );
        registry.register(K::FunctionsWithArguments, Arc::new(FunctionSuggestions { with_arguments: true }));
        registry.register(K::FunctionsWithoutArguments, Arc::new(FunctionSuggestions { with_arguments: false }));
        registry.register(K::ComparisonOperators, Arc::new(OperatorSuggestions(OperatorType::Comparison)));
        registry.register(K::LogicalOperators, Arc::new(OperatorSuggestions(OperatorType::Logical)));
        registry.register(K::Tables, Arc::new(EmptySuggestions));
        registry.register(K::Columns, Arc::new(EmptySuggestions));
        registry
    }

    /// Returns false and keeps the existing resolver when the kind is taken
    pub fn register(&mut self, kind: SuggestionKind, resolver: Arc<dyn SuggestionResolver>) -> bool {
        self.resolvers.register(kind, resolver)
    }

    /// Wrap the kind's resolver so `extension` results follow its own
    pub fn compose(&mut self, kind: SuggestionKind, extension: Arc<dyn SuggestionResolver>) {
        match self.resolvers.get_mut(&kind) {
            Some(slot) => {
                let base = Arc::clone(slot);
                *slot = Arc::new(ComposedResolver { base, extension });
            }
            None => {
                self.resolvers.register(kind, extension);
            }
        }
    }

    pub fn get(&self, kind: &SuggestionKind) -> Option<Arc<dyn SuggestionResolver>> {
        self.resolvers.get_if_exists(kind).cloned()
    }

    pub fn contains(&self, kind: &SuggestionKind) -> bool {
        self.resolvers.contains(kind)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

fn select_snippets() -> Vec<Suggestion> {
    vec![
        Suggestion::new(format!("{SELECT} <column>"))
            .insert_text(format!("{SELECT} $0"))
            .snippet()
            .kind(CompletionItemKind::Snippet)
            .retrigger()
            .priority(CompletionItemPriority::Medium),
        Suggestion::new(format!("{SELECT} <column> {FROM} <table>"))
            .insert_text(format!("{SELECT} $2 {FROM} $1"))
            .snippet()
            .kind(CompletionItemKind::Snippet)
            .retrigger()
            .priority(CompletionItemPriority::Medium),
    ]
}

fn clause_keyword(label: impl Into<String>, insert: String) -> Suggestion {
    Suggestion::new(label)
        .insert_text(insert)
        .kind(CompletionItemKind::Keyword)
        .retrigger()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::context::replacement_range;
    use crate::completion::lexicon::Lexicon;
    use crate::completion::token::{LinkedToken, Position, TokenChain};
    use crate::metadata::{ColumnDefinition, InMemoryMetadata, TableDefinition};
    use crate::sql::tokenize;

    fn context<'a>(chain: &'a TokenChain, lexicon: &'a Lexicon, position: Position) -> PositionContext<'a> {
        let current = chain.token_at(position);
        PositionContext {
            position,
            current_token: current,
            statement_positions: Vec::new(),
            kinds: Vec::new(),
            range: replacement_range(current, position),
            lexicon,
        }
    }

    fn catalog() -> Arc<InMemoryMetadata> {
        Arc::new(
            InMemoryMetadata::new()
                .with_tables(None, vec![TableDefinition::new("orders"), TableDefinition::new("customers")])
                .with_columns(
                    "proj.dataset.table1",
                    vec![ColumnDefinition::new("qualified_col").with_type("STRING")],
                )
                .with_columns("proj", vec![ColumnDefinition::new("raw_col")]),
        )
    }

    /// Joins every token after FROM up to whitespace
    struct DottedNames;

    impl Dialect for DottedNames {
        fn id(&self) -> &str {
            "dotted"
        }

        fn parse_table_name(&self, token: LinkedToken<'_>) -> Option<String> {
            let mut name = String::new();
            let mut cursor = Some(token);
            while let Some(t) = cursor {
                if t.is_whitespace() {
                    break;
                }
                name.push_str(t.value());
                cursor = t.next();
            }
            Some(name)
        }
    }

    #[tokio::test]
    async fn test_select_keyword_snippets() {
        let registry = SuggestionResolverRegistry::standard();
        let lexicon = Lexicon::standard();
        let chain = TokenChain::default();
        let ctx = context(&chain, &lexicon, Position::new(1, 1));

        let resolver = registry.get(&SuggestionKind::SelectKeyword).unwrap();
        let items: Vec<_> = resolver
            .suggestions(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.into_item(ctx.range))
            .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "SELECT <column>");
        assert_eq!(items[0].insert_text, "SELECT $0");
        assert_eq!(items[1].label, "SELECT <column> FROM <table>");
        assert_eq!(items[1].insert_text, "SELECT $2 FROM $1");
        assert!(items.iter().all(|i| i.insert_text_rules == InsertTextRule::Snippet));
        assert!(items.iter().all(|i| i.command == Some(Command::trigger_suggest())));
        assert!(items.iter().all(|i| i.sort_text == CompletionItemPriority::Medium));
    }

    #[tokio::test]
    async fn test_functions_and_operators_follow_lexicon() {
        let registry = SuggestionResolverRegistry::standard();
        let lexicon = Lexicon::standard();
        let chain = TokenChain::default();
        let ctx = context(&chain, &lexicon, Position::new(1, 1));

        let functions = registry
            .get(&SuggestionKind::FunctionsWithArguments)
            .unwrap()
            .suggestions(&ctx)
            .await
            .unwrap();
        assert_eq!(functions.len(), 5);
        assert_eq!(functions[1].label, "COUNT");
        assert_eq!(functions[1].insert_text.as_deref(), Some("COUNT($0)"));

        let bare = registry
            .get(&SuggestionKind::FunctionsWithoutArguments)
            .unwrap()
            .suggestions(&ctx)
            .await
            .unwrap();
        assert_eq!(bare[0].insert_text.as_deref(), Some("AVG()"));

        let comparisons = registry
            .get(&SuggestionKind::ComparisonOperators)
            .unwrap()
            .suggestions(&ctx)
            .await
            .unwrap();
        let inserts: Vec<_> = comparisons.iter().filter_map(|s| s.insert_text.as_deref()).collect();
        assert_eq!(inserts, vec!["= ", "!= ", "IS NOT "]);
    }

    #[test]
    fn test_defaults_applied_on_conversion() {
        let range = Range::from_position(Position::new(1, 3));
        let item = Suggestion::new("ASC").into_item(range);
        assert_eq!(item.insert_text, "ASC");
        assert_eq!(item.kind, CompletionItemKind::Field);
        assert_eq!(item.sort_text, CompletionItemPriority::Medium);
        assert_eq!(item.range, range);
    }

    #[tokio::test]
    async fn test_tables_from_provider() {
        let lexicon = Lexicon::standard();
        let chain = TokenChain::default();
        let ctx = context(&chain, &lexicon, Position::new(1, 1));

        let resolver = TablesResolver { provider: catalog() };
        let tables = resolver.suggestions(&ctx).await.unwrap();
        let labels: Vec<_> = tables.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["orders", "customers"]);
        assert!(tables.iter().all(|s| s.sort_text == Some(CompletionItemPriority::High)));
        assert!(tables.iter().all(|s| s.kind == Some(CompletionItemKind::Field)));
    }

    #[tokio::test]
    async fn test_columns_use_dialect_parser() {
        let lexicon = Lexicon::standard();
        let text = "SELECT  FROM proj.dataset.table1";
        let chain = TokenChain::build(&tokenize(text), text);
        // Cursor in the gap between SELECT and FROM
        let ctx = context(&chain, &lexicon, Position::new(1, 8));

        let with_parser = ColumnsResolver {
            provider: catalog(),
            dialect: Some(Arc::new(DottedNames)),
        };
        assert_eq!(with_parser.table_name(&ctx).as_deref(), Some("proj.dataset.table1"));
        let columns = with_parser.suggestions(&ctx).await.unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].label, "qualified_col");
        assert_eq!(columns[0].detail.as_deref(), Some("STRING"));

        let without_parser = ColumnsResolver {
            provider: catalog(),
            dialect: None,
        };
        assert_eq!(without_parser.table_name(&ctx).as_deref(), Some("proj"));
        let columns = without_parser.suggestions(&ctx).await.unwrap();
        assert_eq!(columns[0].label, "raw_col");
    }

    #[tokio::test]
    async fn test_composed_resolver_is_union() {
        let mut registry = SuggestionResolverRegistry::standard();
        registry.compose(
            SuggestionKind::LimitKeyword,
            Arc::new(StaticSuggestions(vec![Suggestion::new("LIMIT 100")])),
        );

        let lexicon = Lexicon::standard();
        let chain = TokenChain::default();
        let ctx = context(&chain, &lexicon, Position::new(1, 1));
        let labels: Vec<_> = registry
            .get(&SuggestionKind::LimitKeyword)
            .unwrap()
            .suggestions(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["LIMIT", "LIMIT 100"]);
    }

    #[test]
    fn test_register_keeps_first_resolver() {
        let mut registry = SuggestionResolverRegistry::standard();
        let before = registry.len();
        assert!(!registry.register(SuggestionKind::Tables, Arc::new(EmptySuggestions)));
        assert_eq!(registry.len(), before);
        assert!(registry.register(SuggestionKind::from("custom"), Arc::new(EmptySuggestions)));
        assert!(registry.contains(&SuggestionKind::from("custom")));
    }
}

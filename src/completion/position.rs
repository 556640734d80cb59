//! Statement position classification
//!
//! Each registered entry is a predicate over the cursor's token context.
//! Entries run by descending priority, then registration order; the first
//! match is the primary position. Entries flagged `additive` that also match
//! are appended after it, so dialect placements add to the standard position
//! instead of shadowing it.

use super::lexicon::{AND, ASC, BY, DESC, EQUALS, FROM, GROUP, NOT_EQUALS, ORDER, SELECT, STATEMENT_SEPARATOR, WHERE};
use super::registry::Registry;
use super::token::{LinkedToken, Position, TokenKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Syntactic location of the cursor inside a statement
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatementPosition {
    SelectKeyword,
    AfterSelectKeyword,
    AfterSelectFuncFirstArgument,
    AfterSelectArguments,
    FromKeyword,
    AfterFromKeyword,
    AfterFrom,
    AfterTable,
    WhereKey,
    WhereComparisonOperator,
    WhereValue,
    AfterWhereValue,
    AfterGroupByKeywords,
    AfterGroupBy,
    AfterOrderByKeywords,
    AfterOrderByFunction,
    AfterOrderByDirection,
    Unknown,
    /// Position contributed by a dialect
    Custom(String),
}

impl StatementPosition {
    const BUILTIN: [StatementPosition; 18] = [
        StatementPosition::SelectKeyword,
        StatementPosition::AfterSelectKeyword,
        StatementPosition::AfterSelectFuncFirstArgument,
        StatementPosition::AfterSelectArguments,
        StatementPosition::FromKeyword,
        StatementPosition::AfterFromKeyword,
        StatementPosition::AfterFrom,
        StatementPosition::AfterTable,
        StatementPosition::WhereKey,
        StatementPosition::WhereComparisonOperator,
        StatementPosition::WhereValue,
        StatementPosition::AfterWhereValue,
        StatementPosition::AfterGroupByKeywords,
        StatementPosition::AfterGroupBy,
        StatementPosition::AfterOrderByKeywords,
        StatementPosition::AfterOrderByFunction,
        StatementPosition::AfterOrderByDirection,
        StatementPosition::Unknown,
    ];

    /// Stable string id
    pub fn as_str(&self) -> &str {
        match self {
            StatementPosition::SelectKeyword => "selectKeyword",
            StatementPosition::AfterSelectKeyword => "afterSelectKeyword",
            StatementPosition::AfterSelectFuncFirstArgument => "afterSelectFuncFirstArgument",
            StatementPosition::AfterSelectArguments => "afterSelectArguments",
            StatementPosition::FromKeyword => "fromKeyword",
            StatementPosition::AfterFromKeyword => "afterFromKeyword",
            StatementPosition::AfterFrom => "afterFrom",
            StatementPosition::AfterTable => "afterTable",
            StatementPosition::WhereKey => "whereKey",
            StatementPosition::WhereComparisonOperator => "whereComparisonOperator",
            StatementPosition::WhereValue => "whereValue",
            StatementPosition::AfterWhereValue => "afterWhereValue",
            StatementPosition::AfterGroupByKeywords => "afterGroupByKeywords",
            StatementPosition::AfterGroupBy => "afterGroupBy",
            StatementPosition::AfterOrderByKeywords => "afterOrderByKeywords",
            StatementPosition::AfterOrderByFunction => "afterOrderByFunction",
            StatementPosition::AfterOrderByDirection => "afterOrderByDirection",
            StatementPosition::Unknown => "unknown",
            StatementPosition::Custom(id) => id,
        }
    }
}

impl From<&str> for StatementPosition {
    fn from(id: &str) -> Self {
        Self::BUILTIN
            .iter()
            .find(|position| position.as_str() == id)
            .cloned()
            .unwrap_or_else(|| StatementPosition::Custom(id.to_string()))
    }
}

impl From<String> for StatementPosition {
    fn from(id: String) -> Self {
        StatementPosition::from(id.as_str())
    }
}

impl From<StatementPosition> for String {
    fn from(position: StatementPosition) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for StatementPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token context handed to every position predicate
#[derive(Clone, Copy, Debug)]
pub struct PositionInput<'a> {
    /// Token under the cursor, `None` for an empty document
    pub current: Option<LinkedToken<'a>>,
    pub previous_keyword: Option<LinkedToken<'a>>,
    /// Nearest non-whitespace token before the cursor; punctuation the
    /// cursor directly follows counts as previous, not current
    pub previous_non_whitespace: Option<LinkedToken<'a>>,
    /// The previous non-whitespace token is the statement separator
    pub previous_is_slash: bool,
}

impl<'a> PositionInput<'a> {
    pub fn new(current: Option<LinkedToken<'a>>, position: Position) -> Self {
        let previous_non_whitespace = current
            .filter(|token| token.closes_at(position))
            .or_else(|| current.and_then(|token| token.previous_non_whitespace()));
        let previous_keyword = current.and_then(|token| token.previous_keyword());
        let previous_is_slash = previous_non_whitespace
            .map(|token| token.is_value(TokenKind::Operator, STATEMENT_SEPARATOR))
            .unwrap_or(false);

        Self {
            current,
            previous_keyword,
            previous_non_whitespace,
            previous_is_slash,
        }
    }

    pub fn previous_keyword_is(&self, word: &str) -> bool {
        self.previous_keyword
            .map(|token| token.matches_word(word))
            .unwrap_or(false)
    }

    pub fn previous_value_is(&self, word: &str) -> bool {
        self.previous_non_whitespace
            .map(|token| token.matches_word(word))
            .unwrap_or(false)
    }

    fn previous_matches(&self, check: impl Fn(LinkedToken<'a>) -> bool) -> bool {
        self.previous_non_whitespace.map(check).unwrap_or(false)
    }

    fn current_matches(&self, check: impl Fn(LinkedToken<'a>) -> bool) -> bool {
        self.current.map(check).unwrap_or(false)
    }

    /// Previous keyword is `second` and the keyword before it is `first`
    fn previous_keywords_are(&self, first: &str, second: &str) -> bool {
        self.previous_keyword
            .filter(|token| token.is_value(TokenKind::Keyword, second))
            .and_then(|token| token.previous_keyword())
            .map(|token| token.is_value(TokenKind::Keyword, first))
            .unwrap_or(false)
    }
}

pub type PositionPredicate = Arc<dyn Fn(&PositionInput<'_>) -> bool + Send + Sync>;

/// One registered position predicate
#[derive(Clone)]
pub struct PositionResolverEntry {
    pub id: StatementPosition,
    /// Higher runs earlier; ties keep registration order
    pub priority: i32,
    /// Reported alongside the primary position when it also matches
    pub additive: bool,
    predicate: PositionPredicate,
}

impl fmt::Debug for PositionResolverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionResolverEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("additive", &self.additive)
            .finish_non_exhaustive()
    }
}

impl PositionResolverEntry {
    pub fn new(
        id: impl Into<StatementPosition>,
        predicate: impl Fn(&PositionInput<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            additive: false,
            predicate: Arc::new(predicate),
        }
    }

    /// Dialect placement, additive by default
    pub fn custom(
        id: impl Into<StatementPosition>,
        predicate: impl Fn(&PositionInput<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            additive: true,
            ..Self::new(id, predicate)
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.additive = false;
        self
    }

    pub fn matches(&self, input: &PositionInput<'_>) -> bool {
        (self.predicate)(input)
    }
}

/// Ordered set of position predicates
#[derive(Clone, Debug, Default)]
pub struct StatementPositionRegistry {
    entries: Registry<StatementPosition, PositionResolverEntry>,
}

impl StatementPositionRegistry {
    /// Registry holding the base SQL positions in their evaluation order
    pub fn standard() -> Self {
        let mut registry = Self::default();
        let base: [(StatementPosition, fn(&PositionInput<'_>) -> bool); 17] = [
            (StatementPosition::SelectKeyword, select_keyword),
            (StatementPosition::AfterSelectKeyword, after_select_keyword),
            (StatementPosition::AfterSelectFuncFirstArgument, after_select_func_first_argument),
            (StatementPosition::AfterSelectArguments, after_select_arguments),
            (StatementPosition::FromKeyword, from_keyword),
            (StatementPosition::AfterFromKeyword, after_from_keyword),
            (StatementPosition::AfterFrom, after_from),
            (StatementPosition::AfterTable, after_table),
            (StatementPosition::WhereKey, where_key),
            (StatementPosition::WhereComparisonOperator, where_comparison_operator),
            (StatementPosition::WhereValue, where_value),
            (StatementPosition::AfterWhereValue, after_where_value),
            (StatementPosition::AfterGroupByKeywords, after_group_by_keywords),
            (StatementPosition::AfterGroupBy, after_group_by),
            (StatementPosition::AfterOrderByKeywords, after_order_by_keywords),
            (StatementPosition::AfterOrderByFunction, after_order_by_function),
            (StatementPosition::AfterOrderByDirection, after_order_by_direction),
        ];
        for (id, predicate) in base {
            registry.register(PositionResolverEntry::new(id, predicate));
        }
        registry
    }

    /// Returns false and leaves the registry untouched when the id exists
    pub fn register(&mut self, entry: PositionResolverEntry) -> bool {
        let id = entry.id.clone();
        let added = self.entries.register(id.clone(), entry);
        if !added {
            debug!(position = %id, "position already registered, skipping");
        }
        added
    }

    pub fn contains(&self, id: &StatementPosition) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in evaluation order
    pub fn ordered(&self) -> Vec<&PositionResolverEntry> {
        let mut entries: Vec<_> = self.entries.list().collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.priority));
        entries
    }

    /// Classify the cursor; never empty, `[Unknown]` when nothing matches
    pub fn resolve(&self, current: Option<LinkedToken<'_>>, position: Position) -> Vec<StatementPosition> {
        let input = PositionInput::new(current, position);
        let mut positions: Vec<StatementPosition> = Vec::new();

        for entry in self.ordered() {
            if positions.is_empty() {
                if entry.matches(&input) {
                    positions.push(entry.id.clone());
                }
            } else if entry.additive && entry.matches(&input) {
                positions.push(entry.id.clone());
            }
        }

        if positions.is_empty() {
            positions.push(StatementPosition::Unknown);
        }
        debug!(?positions, "resolved statement positions");
        positions
    }
}

fn select_keyword(input: &PositionInput<'_>) -> bool {
    let Some(current) = input.current else {
        return true;
    };
    if input.previous_is_slash {
        return true;
    }
    input.previous_non_whitespace.is_none()
        && (current.is_whitespace()
            || current.is_value(TokenKind::Keyword, SELECT)
            || current.is_identifier())
}

fn after_select_keyword(input: &PositionInput<'_>) -> bool {
    input.previous_value_is(SELECT)
}

fn after_select_func_first_argument(input: &PositionInput<'_>) -> bool {
    let in_parens = input.previous_matches(|t| t.is_value(TokenKind::Parenthesis, "("))
        || input.current_matches(|t| t.is_value(TokenKind::Parenthesis, "()"));
    in_parens && input.previous_keyword_is(SELECT)
}

fn after_select_arguments(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(SELECT) && input.previous_value_is(",")
}

fn from_keyword(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(SELECT) && !input.previous_value_is(",")
}

fn after_from_keyword(input: &PositionInput<'_>) -> bool {
    input.previous_value_is(FROM)
}

fn after_from(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(FROM)
        && input.previous_matches(|t| t.is_double_quoted_string() || t.is_variable())
}

fn after_table(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(FROM) && input.previous_matches(|t| !t.value().is_empty())
}

fn where_key(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(WHERE)
        && input.previous_matches(|t| {
            t.is_keyword() || t.is_value(TokenKind::Parenthesis, "(") || t.is_value(TokenKind::Operator, AND)
        })
}

fn where_comparison_operator(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(WHERE)
        && input.previous_matches(|t| t.is_identifier() || t.is_double_quoted_string())
}

fn where_value(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(WHERE)
        && input.previous_matches(|t| {
            t.is_value(TokenKind::Operator, EQUALS)
                || t.is_value(TokenKind::Operator, NOT_EQUALS)
                || t.is_value(TokenKind::Operator, "IS NOT")
                || is_split_is_not(t)
        })
}

/// `IS NOT` tokenized as two operator words
fn is_split_is_not(token: LinkedToken<'_>) -> bool {
    token.is_value(TokenKind::Operator, "NOT")
        && token
            .previous_non_whitespace()
            .map(|t| t.is_value(TokenKind::Operator, "IS"))
            .unwrap_or(false)
}

fn after_where_value(input: &PositionInput<'_>) -> bool {
    input.previous_keyword_is(WHERE)
        && input.previous_matches(|t| t.is_string() || t.is_value(TokenKind::Parenthesis, ")"))
}

fn after_group_by_keywords(input: &PositionInput<'_>) -> bool {
    input.previous_keywords_are(GROUP, BY)
        && input.previous_matches(|t| t.is_value(TokenKind::Keyword, BY) || t.is_value(TokenKind::Delimiter, ","))
}

fn after_group_by(input: &PositionInput<'_>) -> bool {
    input.previous_keywords_are(GROUP, BY)
        && input.previous_matches(|t| t.is_identifier() || t.is_double_quoted_string())
}

fn after_order_by_keywords(input: &PositionInput<'_>) -> bool {
    input.previous_matches(|t| {
        t.is_value(TokenKind::Keyword, BY)
            && t.previous_keyword()
                .map(|k| k.is_value(TokenKind::Keyword, ORDER))
                .unwrap_or(false)
    })
}

fn after_order_by_function(input: &PositionInput<'_>) -> bool {
    input.previous_keywords_are(ORDER, BY)
        && input.previous_matches(|t| {
            t.is_parenthesis()
                && t.previous_non_whitespace()
                    .map(|f| f.is_function())
                    .unwrap_or(false)
        })
}

fn after_order_by_direction(input: &PositionInput<'_>) -> bool {
    input
        .previous_keyword
        .map(|t| t.is_value(TokenKind::Keyword, DESC) || t.is_value(TokenKind::Keyword, ASC))
        .unwrap_or(false)
}

//! SQL Autocomplete - Statement-position aware completion engine
//!
//! Provides code completion for SQL queries in three steps:
//! - Classify where the cursor sits in the statement (after SELECT, in a WHERE value, ...)
//! - Map that position to the kinds of suggestions valid there
//! - Resolve each kind into items (keywords, functions, operators, tables, columns)

mod candidates;
mod context;
mod engine;
mod kinds;
mod lexicon;
mod position;
mod registry;
mod token;

pub use candidates::{
    ColumnsResolver, ComposedResolver, EmptySuggestions, FunctionSuggestions, OperatorSuggestions,
    StaticSuggestions, Suggestion, SuggestionResolver, SuggestionResolverRegistry, TablesResolver,
};
pub use context::{replacement_range, table_token, PositionContext};
pub use engine::CompletionEngine;
pub use kinds::{SuggestionKind, SuggestionKindRegistry};
pub use lexicon::{
    FunctionDefinition, Lexicon, OperatorDefinition, OperatorType, KEYWORDS, STATEMENT_SEPARATOR, STD_STATS,
};
pub use position::{PositionInput, PositionPredicate, PositionResolverEntry, StatementPosition, StatementPositionRegistry};
pub use registry::Registry;
pub use token::{LinkedToken, Position, Range, RawToken, Token, TokenChain, TokenKind};

pub mod keywords {
    //! Canonical keyword spellings
    pub use super::lexicon::{
        AND, AS, ASC, BY, DESC, EQUALS, FROM, GROUP, IS_NOT, LIMIT, NOT_EQUALS, OR, ORDER, SELECT, WHERE, WITH,
    };
}

use serde::{Deserialize, Serialize};

/// Editor command id that reopens the suggestion widget
pub const TRIGGER_SUGGEST: &str = "editor.action.triggerSuggest";

/// A single completion item, ready for the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    /// Display label (e.g., "SELECT <column>")
    pub label: String,
    /// Text to insert when selected
    pub insert_text: String,
    /// Display category
    pub kind: CompletionItemKind,
    /// Ranking bucket, lower sorts first
    pub sort_text: CompletionItemPriority,
    pub insert_text_rules: InsertTextRule,
    /// Command run after the item is accepted
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub command: Option<Command>,
    /// Text span replaced on accept
    pub range: Range,
    /// Additional detail (e.g., column type)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl CompletionItem {
    /// Create a literal item that inserts its label
    pub fn new(label: impl Into<String>, kind: CompletionItemKind, range: Range) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            kind,
            sort_text: CompletionItemPriority::default(),
            insert_text_rules: InsertTextRule::default(),
            command: None,
            range,
            detail: None,
        }
    }

    /// Get the short label for this item's kind
    pub fn kind_label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Display category of a completion item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    /// SQL function (COUNT, SUM, etc.)
    Function,
    /// Table or column name
    #[default]
    Field,
    /// SQL variable ($var)
    Variable,
    /// Dataset or schema
    Module,
    /// Comparison or logical operator
    Operator,
    /// Literal value
    Value,
    /// SQL keyword (SELECT, FROM, WHERE, etc.)
    Keyword,
    Text,
    /// Template with placeholders
    Snippet,
}

impl CompletionItemKind {
    /// Get a short label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            CompletionItemKind::Function => "fn",
            CompletionItemKind::Field => "fd",
            CompletionItemKind::Variable => "vr",
            CompletionItemKind::Module => "md",
            CompletionItemKind::Operator => "op",
            CompletionItemKind::Value => "vl",
            CompletionItemKind::Keyword => "kw",
            CompletionItemKind::Text => "tx",
            CompletionItemKind::Snippet => "sn",
        }
    }
}

/// Sort bucket; serialized as the editor's sort text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompletionItemPriority {
    #[serde(rename = "a")]
    High,
    #[serde(rename = "d")]
    MediumHigh,
    #[default]
    #[serde(rename = "g")]
    Medium,
    #[serde(rename = "k")]
    MediumLow,
    #[serde(rename = "q")]
    Low,
}

impl CompletionItemPriority {
    pub fn sort_text(&self) -> &'static str {
        match self {
            CompletionItemPriority::High => "a",
            CompletionItemPriority::MediumHigh => "d",
            CompletionItemPriority::Medium => "g",
            CompletionItemPriority::MediumLow => "k",
            CompletionItemPriority::Low => "q",
        }
    }
}

/// How the editor treats `insert_text`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertTextRule {
    #[default]
    Literal,
    /// `$0`, `$1`, ... are tab stops
    Snippet,
}

/// Editor command attached to an item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    pub title: String,
}

impl Command {
    /// Reopen suggestions once the item is inserted
    pub fn trigger_suggest() -> Self {
        Self {
            id: TRIGGER_SUGGEST.to_string(),
            title: String::new(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_editor_fields() {
        let item = CompletionItem {
            command: Some(Command::trigger_suggest()),
            sort_text: CompletionItemPriority::High,
            ..CompletionItem::new("orders", CompletionItemKind::Field, Range::from_position(Position::new(1, 5)))
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["insertText"], "orders");
        assert_eq!(json["sortText"], "a");
        assert_eq!(json["kind"], "field");
        assert_eq!(json["command"]["id"], TRIGGER_SUGGEST);
        assert_eq!(json["range"]["startColumn"], 5);
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_priority_order_matches_sort_text() {
        let mut priorities = vec![
            CompletionItemPriority::Low,
            CompletionItemPriority::High,
            CompletionItemPriority::Medium,
        ];
        priorities.sort();
        let texts: Vec<_> = priorities.iter().map(|p| p.sort_text()).collect();
        assert_eq!(texts, vec!["a", "g", "q"]);
    }
}

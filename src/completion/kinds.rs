//! Mapping from statement positions to the suggestion kinds offered there

use super::position::StatementPosition;
use super::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of completions
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SuggestionKind {
    SelectKeyword,
    FromKeyword,
    WhereKeyword,
    GroupByKeywords,
    OrderByKeywords,
    LimitKeyword,
    FunctionsWithArguments,
    FunctionsWithoutArguments,
    ComparisonOperators,
    LogicalOperators,
    SortOrderDirectionKeyword,
    Tables,
    Columns,
    /// Kind contributed by a dialect
    Custom(String),
}

impl SuggestionKind {
    const BUILTIN: [SuggestionKind; 13] = [
        SuggestionKind::SelectKeyword,
        SuggestionKind::FromKeyword,
        SuggestionKind::WhereKeyword,
        SuggestionKind::GroupByKeywords,
        SuggestionKind::OrderByKeywords,
        SuggestionKind::LimitKeyword,
        SuggestionKind::FunctionsWithArguments,
        SuggestionKind::FunctionsWithoutArguments,
        SuggestionKind::ComparisonOperators,
        SuggestionKind::LogicalOperators,
        SuggestionKind::SortOrderDirectionKeyword,
        SuggestionKind::Tables,
        SuggestionKind::Columns,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SuggestionKind::SelectKeyword => "selectKeyword",
            SuggestionKind::FromKeyword => "fromKeyword",
            SuggestionKind::WhereKeyword => "whereKeyword",
            SuggestionKind::GroupByKeywords => "groupByKeywords",
            SuggestionKind::OrderByKeywords => "orderByKeywords",
            SuggestionKind::LimitKeyword => "limitKeyword",
            SuggestionKind::FunctionsWithArguments => "functionsWithArguments",
            SuggestionKind::FunctionsWithoutArguments => "functionsWithoutArguments",
            SuggestionKind::ComparisonOperators => "comparisonOperators",
            SuggestionKind::LogicalOperators => "logicalOperators",
            SuggestionKind::SortOrderDirectionKeyword => "sortOrderDirectionKeyword",
            SuggestionKind::Tables => "tables",
            SuggestionKind::Columns => "columns",
            SuggestionKind::Custom(id) => id,
        }
    }
}

impl From<&str> for SuggestionKind {
    fn from(id: &str) -> Self {
        Self::BUILTIN
            .iter()
            .find(|kind| kind.as_str() == id)
            .cloned()
            .unwrap_or_else(|| SuggestionKind::Custom(id.to_string()))
    }
}

impl From<String> for SuggestionKind {
    fn from(id: String) -> Self {
        SuggestionKind::from(id.as_str())
    }
}

impl From<SuggestionKind> for String {
    fn from(kind: SuggestionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position id to ordered kind list
#[derive(Clone, Debug, Default)]
pub struct SuggestionKindRegistry {
    kinds: Registry<StatementPosition, Vec<SuggestionKind>>,
}

impl SuggestionKindRegistry {
    pub fn standard() -> Self {
        use StatementPosition as P;
        use SuggestionKind as K;

        let base = [
            (P::SelectKeyword, vec![K::SelectKeyword]),
            (P::AfterSelectKeyword, vec![K::FunctionsWithArguments, K::Columns]),
            (P::AfterSelectFuncFirstArgument, vec![K::Columns]),
            (P::AfterSelectArguments, vec![K::Columns]),
            (P::FromKeyword, vec![K::FromKeyword]),
            (P::AfterFromKeyword, vec![K::Tables]),
            (
                P::AfterFrom,
                vec![K::WhereKeyword, K::GroupByKeywords, K::OrderByKeywords, K::LimitKeyword, K::Tables],
            ),
            (
                P::AfterTable,
                vec![K::WhereKeyword, K::GroupByKeywords, K::OrderByKeywords, K::LimitKeyword],
            ),
            (P::WhereKey, vec![K::Columns]),
            (P::WhereComparisonOperator, vec![K::ComparisonOperators]),
            (P::WhereValue, vec![]),
            (
                P::AfterWhereValue,
                vec![K::LogicalOperators, K::GroupByKeywords, K::OrderByKeywords, K::LimitKeyword],
            ),
            (P::AfterGroupByKeywords, vec![K::Columns]),
            (P::AfterGroupBy, vec![K::OrderByKeywords, K::LimitKeyword]),
            (P::AfterOrderByKeywords, vec![K::Columns]),
            (P::AfterOrderByFunction, vec![K::SortOrderDirectionKeyword, K::LimitKeyword]),
            (P::AfterOrderByDirection, vec![K::LimitKeyword]),
        ];

        let mut registry = Self::default();
        for (position, kinds) in base {
            registry.kinds.register(position, kinds);
        }
        registry
    }

    /// Kinds for one position; unknown positions have none
    pub fn kinds_of(&self, position: &StatementPosition) -> &[SuggestionKind] {
        self.kinds
            .get_if_exists(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Kinds of every position, in position order, without duplicates
    pub fn kinds_for(&self, positions: &[StatementPosition]) -> Vec<SuggestionKind> {
        let mut result: Vec<SuggestionKind> = Vec::new();
        for kind in positions.iter().flat_map(|position| self.kinds_of(position)) {
            if !result.contains(kind) {
                result.push(kind.clone());
            }
        }
        result
    }

    /// Add an empty kind list for a new position. Returns false if it exists.
    pub fn register_position(&mut self, position: StatementPosition) -> bool {
        self.kinds.register(position, Vec::new())
    }

    /// Append a kind to a position, creating the position when missing
    pub fn append(&mut self, position: &StatementPosition, kind: SuggestionKind) {
        if !self.kinds.contains(position) {
            self.kinds.register(position.clone(), Vec::new());
        }
        if let Some(kinds) = self.kinds.get_mut(position) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
}

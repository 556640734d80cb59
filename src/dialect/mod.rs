//! Dialect registration contract
//!
//! A dialect layers functions, operators, statement positions, suggestion
//! kinds and a metadata source on top of the standard SQL engine. Every
//! capability is optional; the defaults contribute nothing.

pub mod bigquery;

pub use bigquery::BigQueryDialect;

use crate::completion::{
    FunctionDefinition, LinkedToken, OperatorDefinition, PositionResolverEntry, StatementPosition,
    SuggestionKind, SuggestionResolver,
};
use crate::metadata::MetadataProvider;
use std::sync::Arc;

/// A suggestion kind a dialect adds, and the positions it applies to
#[derive(Clone)]
pub struct CustomSuggestionKind {
    pub id: SuggestionKind,
    pub applies_to: Vec<StatementPosition>,
    pub resolver: Arc<dyn SuggestionResolver>,
}

impl CustomSuggestionKind {
    pub fn new(
        id: impl Into<SuggestionKind>,
        applies_to: Vec<StatementPosition>,
        resolver: Arc<dyn SuggestionResolver>,
    ) -> Self {
        Self {
            id: id.into(),
            applies_to,
            resolver,
        }
    }
}

impl std::fmt::Debug for CustomSuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomSuggestionKind")
            .field("id", &self.id)
            .field("applies_to", &self.applies_to)
            .finish_non_exhaustive()
    }
}

/// Trait that all SQL dialects implement.
///
/// Only `id` is required. Registration is keyed by it, so registering the
/// same dialect twice is a no-op.
pub trait Dialect: Send + Sync {
    /// Language id, e.g. `bigquery`
    fn id(&self) -> &str;

    /// Functions added to the lexicon; ids already known are skipped
    fn supported_functions(&self) -> Vec<FunctionDefinition> {
        Vec::new()
    }

    /// Operators added to the lexicon; ids already known are skipped
    fn supported_operators(&self) -> Vec<OperatorDefinition> {
        Vec::new()
    }

    /// Extra statement positions
    fn custom_statement_placements(&self) -> Vec<PositionResolverEntry> {
        Vec::new()
    }

    /// Extra suggestion kinds with their resolvers
    fn custom_suggestion_kinds(&self) -> Vec<CustomSuggestionKind> {
        Vec::new()
    }

    /// Source for the Tables and Columns kinds
    fn metadata(&self) -> Option<Arc<dyn MetadataProvider>> {
        None
    }

    /// Table name for column lookup, starting at the token after FROM.
    /// `None` falls back to the token's raw value.
    fn parse_table_name(&self, _token: LinkedToken<'_>) -> Option<String> {
        None
    }

    /// Characters that open the suggestion widget
    fn trigger_characters(&self) -> Vec<char> {
        Vec::new()
    }
}

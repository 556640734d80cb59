//! Completion orchestration
//!
//! One request runs: token chain, statement positions, suggestion kinds,
//! then every kind's resolver concurrently. Results are concatenated in
//! kind order regardless of which resolver finishes first.

use super::candidates::{ColumnsResolver, SuggestionResolver, SuggestionResolverRegistry, TablesResolver};
use super::context::{replacement_range, PositionContext};
use super::kinds::{SuggestionKind, SuggestionKindRegistry};
use super::lexicon::Lexicon;
use super::position::{StatementPosition, StatementPositionRegistry};
use super::token::{Position, RawToken, TokenChain};
use super::CompletionItem;
use crate::config::EngineConfig;
use crate::dialect::Dialect;
use crate::error::CompletionError;
use crate::sql::{sql_dialect, tokenize_with};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Registries shared by all requests
struct EngineState {
    positions: StatementPositionRegistry,
    kinds: SuggestionKindRegistry,
    resolvers: SuggestionResolverRegistry,
    lexicon: Arc<Lexicon>,
    dialects: Vec<Arc<dyn Dialect>>,
}

impl EngineState {
    fn standard() -> Self {
        Self {
            positions: StatementPositionRegistry::standard(),
            kinds: SuggestionKindRegistry::standard(),
            resolvers: SuggestionResolverRegistry::standard(),
            lexicon: Arc::new(Lexicon::standard()),
            dialects: Vec::new(),
        }
    }
}

/// Resolvers and lexicon captured for one request
struct RequestPlan {
    positions: Vec<StatementPosition>,
    kinds: Vec<SuggestionKind>,
    resolvers: Vec<(SuggestionKind, Option<Arc<dyn SuggestionResolver>>)>,
    lexicon: Arc<Lexicon>,
}

/// SQL completion engine.
///
/// Registries are written only by `register_dialect`; requests take a read
/// snapshot and release the lock before any resolver runs.
pub struct CompletionEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionEngine {
    /// Engine with the standard SQL registries and default config
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::new(EngineState::standard()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Layer a dialect onto the registries.
    ///
    /// Returns false when a dialect with the same id is already registered;
    /// nothing is changed in that case.
    pub async fn register_dialect(&self, dialect: Arc<dyn Dialect>) -> bool {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.dialects.iter().any(|known| known.id() == dialect.id()) {
            debug!(dialect = dialect.id(), "dialect already registered, skipping");
            return false;
        }

        {
            let lexicon = Arc::make_mut(&mut state.lexicon);
            for function in dialect.supported_functions() {
                lexicon.register_function(function);
            }
            for operator in dialect.supported_operators() {
                lexicon.register_operator(operator);
            }
        }

        for placement in dialect.custom_statement_placements() {
            let id = placement.id.clone();
            if state.positions.register(placement) {
                state.kinds.register_position(id);
            }
        }

        for custom in dialect.custom_suggestion_kinds() {
            for position in &custom.applies_to {
                state.kinds.append(position, custom.id.clone());
            }
            if !state.resolvers.register(custom.id.clone(), custom.resolver) {
                debug!(kind = %custom.id, "suggestion kind already has a resolver, skipping");
            }
        }

        if let Some(provider) = dialect.metadata() {
            state.resolvers.compose(
                SuggestionKind::Tables,
                Arc::new(TablesResolver {
                    provider: Arc::clone(&provider),
                }),
            );
            state.resolvers.compose(
                SuggestionKind::Columns,
                Arc::new(ColumnsResolver {
                    provider,
                    dialect: Some(Arc::clone(&dialect)),
                }),
            );
        }

        info!(
            dialect = dialect.id(),
            positions = state.positions.len(),
            resolvers = state.resolvers.len(),
            "registered dialect"
        );
        state.dialects.push(dialect);
        true
    }

    /// Positions at the cursor, primary first
    pub async fn statement_positions(
        &self,
        text: &str,
        lines: &[Vec<RawToken>],
        position: Position,
    ) -> Vec<StatementPosition> {
        let chain = TokenChain::build(lines, text);
        let state = self.state.read().await;
        state.positions.resolve(chain.token_at(position), position)
    }

    /// Kinds offered across the given positions, without duplicates
    pub async fn suggestion_kinds(&self, positions: &[StatementPosition]) -> Vec<SuggestionKind> {
        self.state.read().await.kinds.kinds_for(positions)
    }

    /// Completion items for a tokenized document.
    ///
    /// Never fails: a resolver error is logged and that kind contributes
    /// nothing.
    pub async fn get_completions(
        &self,
        text: &str,
        lines: &[Vec<RawToken>],
        position: Position,
    ) -> Vec<CompletionItem> {
        let chain = TokenChain::build(lines, text);
        let current = chain.token_at(position);

        let plan = {
            let state = self.state.read().await;
            let positions = state.positions.resolve(current, position);
            let kinds = state.kinds.kinds_for(&positions);
            let resolvers = kinds
                .iter()
                .map(|kind| (kind.clone(), state.resolvers.get(kind)))
                .collect();
            RequestPlan {
                positions,
                kinds,
                resolvers,
                lexicon: Arc::clone(&state.lexicon),
            }
        };
        debug!(positions = ?plan.positions, kinds = ?plan.kinds, "resolving suggestions");

        let range = replacement_range(current, position);
        let ctx = PositionContext {
            position,
            current_token: current,
            statement_positions: plan.positions,
            kinds: plan.kinds,
            range,
            lexicon: &plan.lexicon,
        };

        let ctx = &ctx;
        let results = futures::future::join_all(plan.resolvers.iter().map(|(kind, resolver)| async move {
            match resolver {
                Some(resolver) => (kind, resolver.suggestions(ctx).await),
                None => {
                    debug!(kind = %kind, "no resolver registered for suggestion kind");
                    (kind, Ok(Vec::new()))
                }
            }
        }))
        .await;

        let mut items: Vec<CompletionItem> = Vec::new();
        for (kind, result) in results {
            match result {
                Ok(suggestions) => {
                    items.extend(suggestions.into_iter().map(|s| s.into_item(range)));
                }
                Err(err) => {
                    let failure = CompletionError::resolver_failure(kind.as_str(), &err);
                    warn!(error = %failure, "suggestion resolver failed");
                }
            }
        }

        if self.config.dedupe_items {
            let mut seen = HashSet::new();
            items.retain(|item| seen.insert((item.label.clone(), item.insert_text.clone())));
        }
        items
    }

    /// Lex `text` with the built-in tokenizer for the configured language
    pub fn tokenize(&self, text: &str) -> Vec<Vec<RawToken>> {
        let dialect = sql_dialect(&self.config.language_id);
        tokenize_with(dialect.as_ref(), text)
    }

    /// Completion items for raw text, tokenized with the built-in tokenizer
    pub async fn complete(&self, text: &str, position: Position) -> Vec<CompletionItem> {
        let lines = self.tokenize(text);
        self.get_completions(text, &lines, position).await
    }

    /// Configured trigger characters followed by those of registered dialects
    pub async fn trigger_characters(&self) -> Vec<char> {
        let state = self.state.read().await;
        let mut characters = self.config.trigger_characters.clone();
        for c in state.dialects.iter().flat_map(|dialect| dialect.trigger_characters()) {
            if !characters.contains(&c) {
                characters.push(c);
            }
        }
        characters
    }

    /// Ids of registered dialects, in registration order
    pub async fn dialects(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.dialects.iter().map(|d| d.id().to_string()).collect()
    }
}

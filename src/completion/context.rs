//! Per-request position context and token lookups shared by resolvers

use super::kinds::SuggestionKind;
use super::lexicon::{Lexicon, FROM, SELECT};
use super::position::StatementPosition;
use super::token::{LinkedToken, Position, Range, TokenKind};

/// Everything a suggestion resolver may inspect for one completion request
#[derive(Clone, Debug)]
pub struct PositionContext<'a> {
    /// Cursor position
    pub position: Position,
    /// Token under the cursor
    pub current_token: Option<LinkedToken<'a>>,
    /// Resolved positions, primary first
    pub statement_positions: Vec<StatementPosition>,
    pub kinds: Vec<SuggestionKind>,
    /// Default replacement range for items
    pub range: Range,
    pub lexicon: &'a Lexicon,
}

impl<'a> PositionContext<'a> {
    /// Token naming the table of the current statement
    pub fn table_token(&self) -> Option<LinkedToken<'a>> {
        table_token(self.current_token)
    }
}

/// Find the table reference of the statement around `current`.
///
/// Looks for the statement's SELECT, then the FROM following it; when the
/// cursor sits after FROM with no SELECT in reach, the nearest preceding FROM
/// is used. The table token is the first non-whitespace token after FROM.
pub fn table_token(current: Option<LinkedToken<'_>>) -> Option<LinkedToken<'_>> {
    let current = current?;

    let select = if current.is_value(TokenKind::Keyword, SELECT) {
        Some(current)
    } else {
        current.previous_of(TokenKind::Keyword, SELECT)
    };

    let from = if current.is_value(TokenKind::Keyword, FROM) {
        Some(current)
    } else {
        select
            .and_then(|select| select.next_of(TokenKind::Keyword, FROM))
            .or_else(|| current.previous_of(TokenKind::Keyword, FROM))
    }?;

    from.next_non_whitespace()
        .filter(|token| !token.is_keyword() && !token.is_parenthesis())
        .filter(|token| !token.value().is_empty())
}

/// Span an accepted item replaces.
///
/// Whitespace, parentheses and punctuation the cursor just passed are never
/// replaced, so the range collapses to the cursor there; otherwise the
/// partial word under the cursor is replaced.
pub fn replacement_range(current: Option<LinkedToken<'_>>, position: Position) -> Range {
    match current {
        Some(token) if !token.is_whitespace() && !token.is_parenthesis() && !token.closes_at(position) => {
            token.range()
        }
        _ => Range::from_position(position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::test_support::single_line_full_query;
    use crate::completion::token::TokenChain;
    use crate::sql::tokenize;

    #[test]
    fn test_table_token_from_inside_select_list() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        // Cursor on the first column1, before FROM is reached
        let current = chain.token_at(Position::new(1, 10));
        assert_eq!(current.unwrap().value(), "column1");
        assert_eq!(table_token(current).unwrap().value(), "table1");
    }

    #[test]
    fn test_table_token_from_later_clause() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        let current = chain.token_at(Position::new(1, 80));
        assert_eq!(table_token(current).unwrap().value(), "table1");
    }

    #[test]
    fn test_table_token_missing() {
        let text = "SELECT a FROM ";
        let chain = TokenChain::build(&tokenize(text), text);
        let current = chain.token_at(Position::new(1, 15));
        assert!(table_token(current).is_none());
        assert!(table_token(None).is_none());
    }

    #[test]
    fn test_replacement_range() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        let at_select = Position::new(1, 0);
        assert_eq!(
            replacement_range(chain.token_at(at_select), at_select),
            Range {
                start_line_number: 1,
                start_column: 0,
                end_line_number: 1,
                end_column: 7,
            }
        );

        let at_space = Position::new(1, 7);
        assert_eq!(
            replacement_range(chain.token_at(at_space), at_space),
            Range::from_position(at_space)
        );

        let empty = Position::new(1, 1);
        assert_eq!(replacement_range(None, empty), Range::from_position(empty));
    }

    #[test]
    fn test_replacement_range_keeps_typed_punctuation() {
        for text in ["SELECT a,", "SELECT a FROM t WHERE a =", "SELECT a FROM proj."] {
            let chain = TokenChain::build(&tokenize(text), text);
            let cursor = Position::new(1, text.len() + 1);
            assert_eq!(
                replacement_range(chain.token_at(cursor), cursor),
                Range::from_position(cursor),
                "{text}"
            );
        }

        // A word being typed is still replaced whole
        let text = "SELECT a FROM ord";
        let chain = TokenChain::build(&tokenize(text), text);
        let cursor = Position::new(1, text.len() + 1);
        assert_eq!(replacement_range(chain.token_at(cursor), cursor).start_column, 15);
    }
}

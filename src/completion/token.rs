//! Token model for completion requests
//!
//! Wraps the per-line output of an editor tokenizer into one navigable chain.
//! A chain is built for a single completion request and dropped afterwards;
//! `LinkedToken` handles borrow from it and never outlive the request.

use serde::{Deserialize, Serialize};

/// Lexical category of a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenKind {
    Keyword,
    Identifier,
    /// Double-quoted identifier or literal (`"value"`)
    QuotedIdentifier,
    /// Single-quoted string literal
    String,
    Operator,
    Delimiter,
    Parenthesis,
    Whitespace,
    Number,
    Function,
    Variable,
    Type,
    Unknown,
}

impl TokenKind {
    /// Map an editor token type (`keyword.sql`, `white.sql`, ...) to a kind.
    ///
    /// The trailing language segment is ignored, so `keyword.bigquery` is a
    /// keyword as well.
    pub fn from_type_name(type_name: &str) -> Self {
        let base = match type_name.rsplit_once('.') {
            Some((base, _language)) => base,
            None => type_name,
        };

        match base.to_ascii_lowercase().as_str() {
            "keyword" => TokenKind::Keyword,
            "identifier" => TokenKind::Identifier,
            "identifier.quote" => TokenKind::QuotedIdentifier,
            "string" | "string.quote" => TokenKind::String,
            "operator" => TokenKind::Operator,
            "delimiter" => TokenKind::Delimiter,
            "delimiter.parenthesis" => TokenKind::Parenthesis,
            "white" => TokenKind::Whitespace,
            "number" => TokenKind::Number,
            "predefined" => TokenKind::Function,
            "variable" => TokenKind::Variable,
            "type" => TokenKind::Type,
            _ => TokenKind::Unknown,
        }
    }

    /// Editor token type for this kind in the base `sql` language
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword.sql",
            TokenKind::Identifier => "identifier.sql",
            TokenKind::QuotedIdentifier => "identifier.quote.sql",
            TokenKind::String => "string.sql",
            TokenKind::Operator => "operator.sql",
            TokenKind::Delimiter => "delimiter.sql",
            TokenKind::Parenthesis => "delimiter.parenthesis.sql",
            TokenKind::Whitespace => "white.sql",
            TokenKind::Number => "number.sql",
            TokenKind::Function => "predefined.sql",
            TokenKind::Variable => "variable.sql",
            TokenKind::Type => "type.sql",
            TokenKind::Unknown => "source.sql",
        }
    }

    /// Keywords and operators compare case-insensitively, everything else exactly
    fn folds_case(&self) -> bool {
        matches!(self, TokenKind::Keyword | TokenKind::Operator)
    }
}

impl From<String> for TokenKind {
    fn from(type_name: String) -> Self {
        TokenKind::from_type_name(&type_name)
    }
}

impl From<TokenKind> for String {
    fn from(kind: TokenKind) -> Self {
        kind.type_name().to_string()
    }
}

/// One entry of tokenizer output: where a token starts on its line and its type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    /// Character offset from the start of the line
    pub offset: usize,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl RawToken {
    pub fn new(offset: usize, kind: TokenKind) -> Self {
        Self { offset, kind }
    }
}

/// Cursor position, 1-based line and editor column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line_number: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line_number: usize, column: usize) -> Self {
        Self { line_number, column }
    }
}

/// Text span in editor coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_line_number: usize,
    pub start_column: usize,
    pub end_line_number: usize,
    pub end_column: usize,
}

impl Range {
    /// Zero-width range at a position
    pub fn from_position(position: Position) -> Self {
        Self {
            start_line_number: position.line_number,
            start_column: position.column,
            end_line_number: position.line_number,
            end_column: position.column,
        }
    }

    /// Inclusive containment check on both ends
    pub fn contains(&self, position: Position) -> bool {
        position.line_number >= self.start_line_number
            && position.line_number <= self.end_line_number
            && position.column >= self.start_column
            && position.column <= self.end_column
    }

    /// Collapse to a zero-width range at the end of this one
    pub fn collapse_to_end(&self) -> Self {
        Self {
            start_line_number: self.end_line_number,
            start_column: self.end_column,
            end_line_number: self.end_line_number,
            end_column: self.end_column,
        }
    }
}

/// A classified slice of the source text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Character offset on its line
    pub offset: usize,
    /// Length in characters
    pub length: usize,
    pub kind: TokenKind,
    pub value: String,
    pub line_number: usize,
    /// Editor column where the token starts
    pub column: usize,
    pub range: Range,
}

/// All tokens of one document, in source order
#[derive(Clone, Debug, Default)]
pub struct TokenChain {
    tokens: Vec<Token>,
}

impl TokenChain {
    /// Build the chain from per-line tokenizer output and the source text.
    ///
    /// A token's value runs from its offset to the next token's offset (or
    /// the end of the line). Empty lines after the first token get a
    /// synthetic whitespace token so navigation stays contiguous.
    pub fn build(lines: &[Vec<RawToken>], text: &str) -> Self {
        let source_lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        let mut tokens: Vec<Token> = Vec::new();

        for (line_index, raw_tokens) in lines.iter().enumerate() {
            let line_number = line_index + 1;
            let chars: Vec<char> = source_lines
                .get(line_index)
                .map(|line| line.chars().collect())
                .unwrap_or_default();
            let line_length = chars.len();

            if raw_tokens.is_empty() {
                if !tokens.is_empty() {
                    tokens.push(Token {
                        offset: 0,
                        length: 0,
                        kind: TokenKind::Whitespace,
                        value: String::new(),
                        line_number,
                        column: 0,
                        range: Range {
                            start_line_number: line_number,
                            start_column: 0,
                            end_line_number: line_number,
                            end_column: line_length + 1,
                        },
                    });
                }
                continue;
            }

            for (index, raw) in raw_tokens.iter().enumerate() {
                let next_offset = raw_tokens.get(index + 1).map(|next| next.offset);

                let start = raw.offset.min(line_length);
                let end = next_offset.unwrap_or(line_length).clamp(start, line_length);
                let value: String = chars[start..end].iter().collect();

                let start_column = if raw.offset == 0 { 0 } else { raw.offset + 1 };
                let end_column = next_offset
                    .map(|offset| offset + 1)
                    .unwrap_or(line_length + 1)
                    .max(start_column);

                tokens.push(Token {
                    offset: raw.offset,
                    length: end - start,
                    kind: raw.kind,
                    value,
                    line_number,
                    column: start_column,
                    range: Range {
                        start_line_number: line_number,
                        start_column,
                        end_line_number: line_number,
                        end_column,
                    },
                });
            }
        }

        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Handle to the token at an index
    pub fn get(&self, index: usize) -> Option<LinkedToken<'_>> {
        (index < self.tokens.len()).then_some(LinkedToken { chain: self, index })
    }

    /// First token of the chain
    pub fn first(&self) -> Option<LinkedToken<'_>> {
        self.get(0)
    }

    /// Token whose range contains the position.
    ///
    /// Adjacent ranges share a boundary column; the later token wins there.
    pub fn token_at(&self, position: Position) -> Option<LinkedToken<'_>> {
        self.tokens
            .iter()
            .rposition(|token| token.range.contains(position))
            .map(|index| LinkedToken { chain: self, index })
    }

    pub fn iter(&self) -> impl Iterator<Item = LinkedToken<'_>> {
        (0..self.tokens.len()).map(move |index| LinkedToken { chain: self, index })
    }
}

/// Navigable view of one token inside a [`TokenChain`]
#[derive(Clone, Copy)]
pub struct LinkedToken<'a> {
    chain: &'a TokenChain,
    index: usize,
}

impl std::fmt::Debug for LinkedToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedToken")
            .field("index", &self.index)
            .field("kind", &self.kind())
            .field("value", &self.value())
            .finish()
    }
}

impl PartialEq for LinkedToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.chain, other.chain) && self.index == other.index
    }
}

impl<'a> LinkedToken<'a> {
    pub fn token(&self) -> &'a Token {
        &self.chain.tokens[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> &'a str {
        &self.token().value
    }

    pub fn kind(&self) -> TokenKind {
        self.token().kind
    }

    pub fn range(&self) -> Range {
        self.token().range
    }

    pub fn previous(&self) -> Option<LinkedToken<'a>> {
        self.index.checked_sub(1).and_then(|index| self.chain.get(index))
    }

    pub fn next(&self) -> Option<LinkedToken<'a>> {
        self.chain.get(self.index + 1)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Kind and value match; keyword and operator values ignore ASCII case
    pub fn is_value(&self, kind: TokenKind, value: &str) -> bool {
        self.is(kind) && self.matches_word(value)
    }

    /// Value comparison under the keyword case policy of this token's kind
    pub fn matches_word(&self, value: &str) -> bool {
        if self.kind().folds_case() {
            self.value().eq_ignore_ascii_case(value)
        } else {
            self.value() == value
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.is(TokenKind::Keyword)
    }

    pub fn is_whitespace(&self) -> bool {
        self.is(TokenKind::Whitespace)
    }

    pub fn is_parenthesis(&self) -> bool {
        self.is(TokenKind::Parenthesis)
    }

    pub fn is_identifier(&self) -> bool {
        self.is(TokenKind::Identifier)
    }

    pub fn is_string(&self) -> bool {
        self.is(TokenKind::String)
    }

    pub fn is_double_quoted_string(&self) -> bool {
        self.is(TokenKind::QuotedIdentifier)
            || (self.is(TokenKind::String) && self.value().starts_with('"'))
    }

    pub fn is_variable(&self) -> bool {
        self.is(TokenKind::Variable)
    }

    pub fn is_function(&self) -> bool {
        self.is(TokenKind::Function)
    }

    /// Delimiter, parenthesis or symbolic operator; `AND`/`IS` do not count
    pub fn is_punctuation(&self) -> bool {
        match self.kind() {
            TokenKind::Delimiter | TokenKind::Parenthesis => true,
            TokenKind::Operator => !self.value().starts_with(|c: char| c.is_alphabetic()),
            _ => false,
        }
    }

    /// Punctuation whose last character sits directly before the cursor
    pub fn closes_at(&self, position: Position) -> bool {
        let range = self.range();
        self.is_punctuation()
            && range.end_line_number == position.line_number
            && range.end_column == position.column
    }

    pub fn previous_non_whitespace(&self) -> Option<LinkedToken<'a>> {
        self.walk_back().find(|token| !token.is_whitespace())
    }

    pub fn next_non_whitespace(&self) -> Option<LinkedToken<'a>> {
        self.walk_forward().find(|token| !token.is_whitespace())
    }

    pub fn previous_keyword(&self) -> Option<LinkedToken<'a>> {
        self.walk_back().find(|token| token.is_keyword())
    }

    /// Nearest earlier token of a kind and value
    pub fn previous_of(&self, kind: TokenKind, value: &str) -> Option<LinkedToken<'a>> {
        self.walk_back().find(|token| token.is_value(kind, value))
    }

    /// Nearest later token of a kind and value
    pub fn next_of(&self, kind: TokenKind, value: &str) -> Option<LinkedToken<'a>> {
        self.walk_forward().find(|token| token.is_value(kind, value))
    }

    fn walk_back(&self) -> impl Iterator<Item = LinkedToken<'a>> {
        std::iter::successors(self.previous(), |token| token.previous())
    }

    fn walk_forward(&self) -> impl Iterator<Item = LinkedToken<'a>> {
        std::iter::successors(self.next(), |token| token.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::test_support::single_line_full_query;

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(TokenKind::from_type_name("keyword.sql"), TokenKind::Keyword);
        assert_eq!(TokenKind::from_type_name("delimiter.parenthesis.sql"), TokenKind::Parenthesis);
        assert_eq!(TokenKind::from_type_name("identifier.quote.sql"), TokenKind::QuotedIdentifier);
        assert_eq!(TokenKind::from_type_name("predefined.bigquery"), TokenKind::Function);
        assert_eq!(TokenKind::from_type_name("comment.sql"), TokenKind::Unknown);
    }

    #[test]
    fn test_raw_token_from_json() {
        let raw: Vec<RawToken> =
            serde_json::from_str(r#"[{"offset":0,"type":"keyword.sql","language":"sql"}]"#).unwrap();
        assert_eq!(raw, vec![RawToken::new(0, TokenKind::Keyword)]);
    }

    #[test]
    fn test_build_values_and_ranges() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        let first = chain.first().unwrap();
        assert_eq!(first.value(), "SELECT");
        assert_eq!(first.range().start_column, 0);
        assert_eq!(first.range().end_column, 7);

        let second = first.next().unwrap();
        assert!(second.is_whitespace());
        assert_eq!(second.range().start_column, 7);

        let last = chain.iter().last().unwrap();
        assert_eq!(last.value(), "10");
        assert_eq!(last.range().end_column, query.len() + 1);
    }

    #[test]
    fn test_token_at_prefers_later_token_on_boundary() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        assert_eq!(chain.token_at(Position::new(1, 0)).unwrap().value(), "SELECT");
        // Column 7 is both the end of SELECT and the start of the whitespace
        assert!(chain.token_at(Position::new(1, 7)).unwrap().is_whitespace());
        assert!(chain.token_at(Position::new(2, 1)).is_none());
    }

    #[test]
    fn test_navigation_never_leaves_chain() {
        let (query, lines) = single_line_full_query();
        let chain = TokenChain::build(&lines, query);

        let first = chain.first().unwrap();
        assert!(first.previous().is_none());
        assert!(first.previous_keyword().is_none());
        assert!(first.previous_non_whitespace().is_none());

        let last = chain.iter().last().unwrap();
        assert!(last.next().is_none());
        assert_eq!(last.previous_keyword().unwrap().value(), "LIMIT");
        assert_eq!(last.previous_non_whitespace().unwrap().value(), "LIMIT");
    }

    #[test]
    fn test_keyword_compare_ignores_case() {
        let text = "select a";
        let lines = vec![vec![
            RawToken::new(0, TokenKind::Keyword),
            RawToken::new(6, TokenKind::Whitespace),
            RawToken::new(7, TokenKind::Identifier),
        ]];
        let chain = TokenChain::build(&lines, text);

        let select = chain.first().unwrap();
        assert!(select.is_value(TokenKind::Keyword, "SELECT"));

        let ident = chain.get(2).unwrap();
        assert!(ident.is_value(TokenKind::Identifier, "a"));
        assert!(!ident.is_value(TokenKind::Identifier, "A"));
    }

    #[test]
    fn test_closes_at_only_for_symbols_before_cursor() {
        let text = "a,AND <>";
        let lines = vec![vec![
            RawToken::new(0, TokenKind::Identifier),
            RawToken::new(1, TokenKind::Delimiter),
            RawToken::new(2, TokenKind::Operator),
            RawToken::new(5, TokenKind::Whitespace),
            RawToken::new(6, TokenKind::Operator),
        ]];
        let chain = TokenChain::build(&lines, text);

        let comma = chain.get(1).unwrap();
        assert!(comma.closes_at(Position::new(1, 3)));
        assert!(!comma.closes_at(Position::new(1, 2)));
        assert!(!comma.closes_at(Position::new(2, 3)));

        let and = chain.get(2).unwrap();
        assert!(!and.is_punctuation());
        assert!(!and.closes_at(Position::new(1, 6)));

        let not_equal = chain.get(4).unwrap();
        assert!(not_equal.closes_at(Position::new(1, 9)));
        assert!(!chain.first().unwrap().is_punctuation());
    }

    #[test]
    fn test_empty_line_gets_whitespace_token() {
        let text = "SELECT\n\nFROM";
        let lines = vec![
            vec![RawToken::new(0, TokenKind::Keyword)],
            vec![],
            vec![RawToken::new(0, TokenKind::Keyword)],
        ];
        let chain = TokenChain::build(&lines, text);

        assert_eq!(chain.len(), 3);
        let middle = chain.get(1).unwrap();
        assert!(middle.is_whitespace());
        assert_eq!(middle.range().start_line_number, 2);
        assert_eq!(chain.get(2).unwrap().previous_keyword().unwrap().value(), "SELECT");
    }

    #[test]
    fn test_empty_document() {
        let chain = TokenChain::build(&[], "");
        assert!(chain.is_empty());
        assert!(chain.token_at(Position::new(1, 0)).is_none());
    }
}

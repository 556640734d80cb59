//! SQL line tokenizer - classifies each line into editor-style tokens
//!
//! Lexing is done by `sqlparser`'s tokenizer for the configured dialect; this
//! module only maps its tokens onto the shape an editor tokenizer hands to
//! the completion engine: one vector per line, each token a start offset and
//! a type. Adjacent whitespace, delimiters and parentheses merge into one
//! token, so an empty call like `COUNT()` yields a single `()` token.

use crate::completion::{RawToken, TokenKind};
use sqlparser::dialect::{dialect_from_str, Dialect as SqlDialect, GenericDialect};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer, Whitespace, Word};
use tracing::trace;

/// Known function names, classified as functions when a `(` follows
const FUNCTIONS: &[&str] = &[
    "AVG", "COUNT", "MAX", "MIN", "SUM", "COUNTIF", "ANY_VALUE", "ARRAY_AGG", "ARRAY_CONCAT_AGG",
    "STRING_AGG", "BIT_AND", "BIT_OR", "BIT_XOR", "LOGICAL_AND", "LOGICAL_OR", "COALESCE", "IFNULL", "CAST",
    "CONCAT", "LOWER", "UPPER", "LENGTH", "ROUND", "ABS", "NOW",
];

/// `sqlparser` dialect for an editor language id, generic SQL when unknown
pub fn sql_dialect(language_id: &str) -> Box<dyn SqlDialect> {
    dialect_from_str(language_id).unwrap_or_else(|| Box::new(GenericDialect {}))
}

/// Tokenize every `\n`-separated line of `text` as generic SQL
pub fn tokenize(text: &str) -> Vec<Vec<RawToken>> {
    tokenize_with(&GenericDialect {}, text)
}

/// Tokenize every `\n`-separated line of `text` under `dialect`
pub fn tokenize_with(dialect: &dyn SqlDialect, text: &str) -> Vec<Vec<RawToken>> {
    text.split('\n')
        .map(|line| tokenize_line_with(dialect, line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

/// Tokenize a single line as generic SQL; offsets count characters
pub fn tokenize_line(line: &str) -> Vec<RawToken> {
    tokenize_line_with(&GenericDialect {}, line)
}

/// Tokenize a single line under `dialect`; offsets count characters
pub fn tokenize_line_with(dialect: &dyn SqlDialect, line: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    scan(dialect, line, &mut tokens);
    tokens
}

/// Lex `line` into `tokens`.
///
/// Text being edited is often unterminated (`'abc`, `` `proj ``). The lexer
/// rejects such a line, so the part before the error location is lexed on
/// its own and the rest of the line becomes one token.
fn scan(dialect: &dyn SqlDialect, line: &str, tokens: &mut Vec<RawToken>) {
    let lexed = Tokenizer::new(dialect, line).tokenize_with_location();
    match lexed {
        Ok(lexed) => {
            for (index, token) in lexed.iter().enumerate() {
                let Some(kind) = classify(&token.token, &lexed[index + 1..]) else {
                    continue;
                };
                let offset = (token.span.start.column as usize).saturating_sub(1);
                push_token(tokens, offset, kind);
            }
        }
        Err(err) => {
            let chars: Vec<char> = line.chars().collect();
            let split = (err.location.column as usize)
                .saturating_sub(1)
                .min(chars.len().saturating_sub(1));
            trace!(error = %err, split, "lexing up to the unterminated token");

            let prefix: String = chars[..split].iter().collect();
            scan(dialect, &prefix, tokens);
            let kind = match chars.get(split) {
                Some('\'') => TokenKind::String,
                Some('"') => TokenKind::QuotedIdentifier,
                Some('`') => TokenKind::Identifier,
                _ => TokenKind::Unknown,
            };
            push_token(tokens, split, kind);
        }
    }
}

/// Append a token, merging it into the previous one for coalescing kinds
fn push_token(tokens: &mut Vec<RawToken>, offset: usize, kind: TokenKind) {
    let coalesces = matches!(
        kind,
        TokenKind::Whitespace | TokenKind::Delimiter | TokenKind::Parenthesis
    );
    if coalesces && tokens.last().map(|last| last.kind == kind).unwrap_or(false) {
        return;
    }
    tokens.push(RawToken::new(offset, kind));
}

/// Editor token type of a lexed token; `None` drops it
fn classify(token: &Token, rest: &[TokenWithSpan]) -> Option<TokenKind> {
    let kind = match token {
        Token::EOF => return None,
        Token::Word(word) => classify_word(word, rest),
        Token::Number(_, _) => TokenKind::Number,
        Token::SingleQuotedString(_)
        | Token::TripleSingleQuotedString(_)
        | Token::NationalStringLiteral(_)
        | Token::EscapedStringLiteral(_)
        | Token::HexStringLiteral(_)
        | Token::SingleQuotedByteStringLiteral(_)
        | Token::DoubleQuotedByteStringLiteral(_)
        | Token::SingleQuotedRawStringLiteral(_) => TokenKind::String,
        Token::DoubleQuotedString(_) => TokenKind::QuotedIdentifier,
        Token::Placeholder(_) | Token::AtSign => TokenKind::Variable,
        Token::Eq
        | Token::DoubleEq
        | Token::Neq
        | Token::Lt
        | Token::Gt
        | Token::LtEq
        | Token::GtEq
        | Token::Spaceship
        | Token::Plus
        | Token::Minus
        | Token::Mul
        | Token::Div
        | Token::Mod
        | Token::StringConcat
        | Token::Caret
        | Token::Ampersand
        | Token::Pipe
        | Token::Tilde
        | Token::ExclamationMark
        | Token::ShiftLeft
        | Token::ShiftRight => TokenKind::Operator,
        Token::Comma | Token::SemiColon | Token::Period | Token::Colon | Token::DoubleColon => {
            TokenKind::Delimiter
        }
        Token::LParen | Token::RParen | Token::LBracket | Token::RBracket => TokenKind::Parenthesis,
        Token::Whitespace(Whitespace::SingleLineComment { .. })
        | Token::Whitespace(Whitespace::MultiLineComment(_)) => TokenKind::Unknown,
        Token::Whitespace(_) => TokenKind::Whitespace,
        _ => TokenKind::Unknown,
    };
    Some(kind)
}

fn classify_word(word: &Word, rest: &[TokenWithSpan]) -> TokenKind {
    match word.quote_style {
        Some('"') => return TokenKind::QuotedIdentifier,
        Some(_) => return TokenKind::Identifier,
        None => {}
    }
    if word.value.starts_with('@') {
        return TokenKind::Variable;
    }

    let calls = rest
        .iter()
        .find(|next| !matches!(next.token, Token::Whitespace(_)))
        .map(|next| next.token == Token::LParen)
        .unwrap_or(false);
    if calls && FUNCTIONS.iter().any(|name| word.value.eq_ignore_ascii_case(name)) {
        return TokenKind::Function;
    }

    match word.keyword {
        Keyword::AND
        | Keyword::OR
        | Keyword::NOT
        | Keyword::IN
        | Keyword::LIKE
        | Keyword::IS
        | Keyword::NULL
        | Keyword::BETWEEN
        | Keyword::EXISTS => TokenKind::Operator,
        Keyword::SELECT
        | Keyword::FROM
        | Keyword::WHERE
        | Keyword::GROUP
        | Keyword::ORDER
        | Keyword::BY
        | Keyword::DESC
        | Keyword::ASC
        | Keyword::LIMIT
        | Keyword::OFFSET
        | Keyword::WITH
        | Keyword::AS
        | Keyword::HAVING
        | Keyword::JOIN
        | Keyword::INNER
        | Keyword::LEFT
        | Keyword::RIGHT
        | Keyword::OUTER
        | Keyword::FULL
        | Keyword::CROSS
        | Keyword::ON
        | Keyword::USING
        | Keyword::UNION
        | Keyword::ALL
        | Keyword::DISTINCT
        | Keyword::INSERT
        | Keyword::INTO
        | Keyword::VALUES
        | Keyword::UPDATE
        | Keyword::SET
        | Keyword::DELETE
        | Keyword::CREATE
        | Keyword::ALTER
        | Keyword::DROP
        | Keyword::TABLE
        | Keyword::VIEW
        | Keyword::CASE
        | Keyword::WHEN
        | Keyword::THEN
        | Keyword::ELSE
        | Keyword::END
        | Keyword::WINDOW
        | Keyword::OVER
        | Keyword::PARTITION
        | Keyword::QUALIFY => TokenKind::Keyword,
        _ => TokenKind::Identifier,
    }
}

//! SQL text utilities

mod tokenizer;

pub use tokenizer::{sql_dialect, tokenize, tokenize_line, tokenize_line_with, tokenize_with};

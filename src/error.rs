//! Error types for configuration loading and resolver reporting

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unsupported config format: {0} (expected .json or .toml)")]
    UnsupportedConfigFormat(String),

    #[error("Suggestion resolver for '{kind}' failed: {message}")]
    ResolverFailure { kind: String, message: String },
}

impl CompletionError {
    /// Wrap a resolver error; the chain is flattened into the message
    pub fn resolver_failure(kind: impl Into<String>, error: &anyhow::Error) -> Self {
        CompletionError::ResolverFailure {
            kind: kind.into(),
            message: format!("{error:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompletionError>;

//! Configuration management for the completion engine
//!
//! Handles loading and saving engine settings from ~/.config/sql-suggest/config.json

use crate::error::{CompletionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Engine configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Language id the engine answers for
    pub language_id: String,
    /// Characters that open the suggestion widget, merged with dialect ones
    pub trigger_characters: Vec<char>,
    /// Drop items with the same label and insert text
    pub dedupe_items: bool,
    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language_id: "sql".to_string(),
            trigger_characters: vec![' ', '.', ',', '('],
            dedupe_items: true,
            log_filter: "sql_suggest=info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Get the config file path (~/.config/sql-suggest/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sql-suggest").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "using default engine config");
                Self::default()
            }
        }
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from(path: &Path) -> Result<Self> {
        let format = Self::format_of(path)?;
        let contents = fs::read_to_string(path).map_err(|source| CompletionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = match format {
            Format::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(&contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| CompletionError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Save configuration to disk in the format its extension names
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let format = Self::format_of(path)?;
        let contents = match format {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            Format::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
        }
        .map_err(|message| CompletionError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })?;

        let io_error = |source| CompletionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, contents).map_err(io_error)
    }

    fn format_of(path: &Path) -> Result<Format> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(CompletionError::UnsupportedConfigFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

enum Format {
    Json,
    Toml,
}

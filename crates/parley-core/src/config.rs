use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};
use crate::types::CandidateScope;

/// Top-level configuration for a Parley chat bot.
///
/// Loaded from `~/.parley/config.toml` by default. Every section falls back
/// to its defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logic: LogicConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject configurations that cannot produce a working engine.
    pub fn validate(&self) -> Result<()> {
        if self.logic.default_response.trim().is_empty() {
            return Err(ParleyError::Config(
                "logic.default_response must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for kind in &self.logic.strategies {
            if !seen.insert(*kind) {
                return Err(ParleyError::Config(format!(
                    "strategy '{}' is listed more than once",
                    kind.as_str()
                )));
            }
        }

        if self.engine.max_message_length == 0 {
            return Err(ParleyError::Config(
                "engine.max_message_length must be greater than zero".to_string(),
            ));
        }

        if self.storage.candidate_scope == ScopeKind::Recent && self.storage.recent_limit == 0 {
            return Err(ParleyError::Config(
                "storage.recent_limit must be greater than zero".to_string(),
            ));
        }

        if self.storage.backend == StoreKind::Sqlite && self.storage.database_path.is_empty() {
            return Err(ParleyError::Config(
                "storage.database_path is required for the sqlite backend".to_string(),
            ));
        }

        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Display name of the bot.
    pub name: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "Parley".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Request handling and learning behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Freeze the corpus: responses are still selected but nothing is learned.
    pub read_only: bool,
    /// Session used when a caller does not name one. Generated when absent.
    pub default_session: Option<String>,
    /// Maximum input length in characters.
    pub max_message_length: usize,
    /// Preprocessors applied to every input, in order.
    pub preprocessors: Vec<PreprocessorKind>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            default_session: None,
            max_message_length: 2000,
            preprocessors: vec![PreprocessorKind::CleanWhitespace],
        }
    }
}

/// Matching strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicConfig {
    /// Strategies in tie-break order. The no-knowledge fallback is implicit.
    pub strategies: Vec<StrategyKind>,
    /// Text comparison used to find the closest known statement.
    pub comparator: ComparatorKind,
    /// How best-match picks among several known responses.
    pub response_selection: ResponseSelectionMethod,
    /// Reply used when no strategy has an opinion.
    pub default_response: String,
}

impl Default for LogicConfig {
    fn default() -> Self {
        Self {
            strategies: vec![StrategyKind::BestMatch],
            comparator: ComparatorKind::Levenshtein,
            response_selection: ResponseSelectionMethod::First,
            default_response: "I don't understand.".to_string(),
        }
    }
}

/// Statement store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StoreKind,
    /// SQLite database file, used by the sqlite backend.
    pub database_path: String,
    /// Candidate pool prefilter.
    pub candidate_scope: ScopeKind,
    /// Pool size for the `recent` scope.
    pub recent_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::Memory,
            database_path: "~/.parley/corpus.db".to_string(),
            candidate_scope: ScopeKind::All,
            recent_limit: 1000,
        }
    }
}

impl StorageConfig {
    /// Resolve the configured prefilter into a store query scope.
    pub fn scope(&self) -> CandidateScope {
        match self.candidate_scope {
            ScopeKind::All => CandidateScope::All,
            ScopeKind::Responses => CandidateScope::Responses,
            ScopeKind::Recent => CandidateScope::Recent {
                limit: self.recent_limit,
            },
        }
    }
}

// =============================================================================
// Registry keys
// =============================================================================

/// Matching strategies that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Closest known statement by text similarity.
    BestMatch,
    /// Most frequent reply to the closest known statement.
    Frequency,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::BestMatch => "best_match",
            StrategyKind::Frequency => "frequency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    Levenshtein,
    Jaccard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSelectionMethod {
    /// The earliest learned reply.
    First,
    /// The reply seen most often after the matched statement.
    MostFrequent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessorKind {
    CleanWhitespace,
    UnescapeHtml,
    Lowercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    All,
    Responses,
    Recent,
}

//! Chat bot facade: wires preprocessing, selection, learning and
//! conversations into a single request/response call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use parley_core::config::{ParleyConfig, StoreKind};
use parley_core::types::{CandidateScope, SessionId, Statement};
use parley_storage::{MemoryStore, SqliteStore, StatementStore};

use crate::context::{Conversation, ConversationManager, ConversationSummary};
use crate::ensemble::EnsembleSelector;
use crate::error::ChatError;
use crate::learning::LearningRecorder;
use crate::output::Reply;
use crate::preprocess::{build_preprocessor, Preprocessor};
use crate::strategy::{MatchingStrategy, NoKnowledge};
use crate::trainer::ListTrainer;

/// A conversational engine that learns from every exchange.
///
/// `ChatBot` is `Send + Sync`; share it behind an `Arc` to serve several
/// sessions at once.
pub struct ChatBot {
    name: String,
    store: Arc<dyn StatementStore>,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    selector: EnsembleSelector,
    recorder: LearningRecorder,
    conversations: ConversationManager,
    scope: CandidateScope,
    max_message_length: usize,
}

impl ChatBot {
    /// Build a bot from configuration over an already opened store.
    pub fn new(config: &ParleyConfig, store: Arc<dyn StatementStore>) -> Result<Self, ChatError> {
        let selector = EnsembleSelector::from_config(&config.logic);
        Self::assemble(config, store, selector)
    }

    /// Build a bot with caller-supplied strategies instead of the configured
    /// ones. The fallback still comes from `logic.default_response`.
    pub fn with_strategies(
        config: &ParleyConfig,
        store: Arc<dyn StatementStore>,
        strategies: Vec<Box<dyn MatchingStrategy>>,
    ) -> Result<Self, ChatError> {
        let fallback = NoKnowledge::new(config.logic.default_response.as_str());
        Self::assemble(config, store, EnsembleSelector::new(strategies, fallback))
    }

    /// Load a TOML config file, open its store and build a bot.
    pub fn from_config(path: &Path) -> Result<Self, ChatError> {
        let config = ParleyConfig::load(path)?;
        let store = Self::open_store(&config)?;
        Self::new(&config, store)
    }

    /// Open the store named in `config.storage`.
    ///
    /// A read-only engine over an existing SQLite file opens it read-only.
    pub fn open_store(config: &ParleyConfig) -> Result<Arc<dyn StatementStore>, ChatError> {
        match config.storage.backend {
            StoreKind::Memory => {
                info!("Using in-memory statement store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreKind::Sqlite => {
                let path = expand_home(&config.storage.database_path);
                let store = if config.engine.read_only && path.exists() {
                    SqliteStore::open_read_only(&path)?
                } else {
                    SqliteStore::open(&path)?
                };
                info!(path = %path.display(), "Using SQLite statement store");
                Ok(Arc::new(store))
            }
        }
    }

    fn assemble(
        config: &ParleyConfig,
        store: Arc<dyn StatementStore>,
        selector: EnsembleSelector,
    ) -> Result<Self, ChatError> {
        config.validate()?;

        let read_only = config.engine.read_only;
        if !read_only && !store.is_writable() {
            return Err(ChatError::Config(
                "store is not writable but engine.read_only is false".to_string(),
            ));
        }

        let default_session = config
            .engine
            .default_session
            .as_deref()
            .map(SessionId::from)
            .unwrap_or_else(SessionId::generate);

        let preprocessors = config
            .engine
            .preprocessors
            .iter()
            .map(|kind| build_preprocessor(*kind))
            .collect();

        info!(
            name = %config.general.name,
            strategies = ?selector.strategy_names(),
            read_only,
            "Chat bot ready"
        );

        Ok(Self {
            name: config.general.name.clone(),
            recorder: LearningRecorder::new(Arc::clone(&store), read_only),
            store,
            preprocessors,
            selector,
            conversations: ConversationManager::new(default_session),
            scope: config.storage.scope(),
            max_message_length: config.engine.max_message_length,
        })
    }

    // =========================================================================
    // Request path
    // =========================================================================

    /// Answer `input` within `session` (the default session when `None`)
    /// and learn from the exchange.
    pub fn get_response(
        &self,
        input: impl Into<Statement>,
        session: Option<&str>,
    ) -> Result<Reply, ChatError> {
        let input = input.into();
        if input.text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if input.text.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let input = self.preprocess(input);
        if input.text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // Nothing is created or written until the exchange is learned, so a
        // failed turn leaves both the corpus and the session untouched.
        let requested = session.map(SessionId::from);
        let session_id = self.conversations.resolve(requested.as_ref());

        let pool = self.store.get_candidates(&self.scope)?;
        let selection = self.selector.select(&input, &pool);

        let prior = self.conversations.last_response(&session_id)?;
        self.recorder
            .record_exchange(&input, prior.as_ref(), &selection.response)?;

        self.conversations.get_or_create(Some(&session_id))?;
        self.conversations.append(&session_id, input.clone())?;
        self.conversations
            .append(&session_id, selection.response.clone())?;

        info!(
            session = %session_id,
            input = %input.text,
            response = %selection.response.text,
            strategy = %selection.strategy,
            confidence = selection.confidence,
            "Selected response"
        );

        Ok(Reply {
            statement: selection.response,
            confidence: selection.confidence,
            strategy: selection.strategy,
            session_id,
        })
    }

    /// Teach the bot that `statement` follows `prior` without asking it
    /// anything. Returns `None` when read-only.
    pub fn learn_response(
        &self,
        statement: impl Into<Statement>,
        prior: Option<&str>,
    ) -> Result<Option<Statement>, ChatError> {
        let statement = self.preprocess(statement.into());
        if statement.text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let prior = prior.map(|p| self.preprocess(Statement::new(p)));
        self.recorder.record(&statement, prior.as_ref())
    }

    /// Run the configured preprocessors in order.
    pub fn preprocess(&self, statement: Statement) -> Statement {
        self.preprocessors
            .iter()
            .fold(statement, |s, p| p.transform(s))
    }

    // =========================================================================
    // Conversations
    // =========================================================================

    pub fn conversation_history(&self, session: &str) -> Result<Vec<Statement>, ChatError> {
        self.conversations.history(&SessionId::from(session))
    }

    pub fn conversation(&self, session: &str) -> Result<Option<Conversation>, ChatError> {
        self.conversations.get(&SessionId::from(session))
    }

    /// What the next input in `session` would be learned as a reply to.
    pub fn last_response(&self, session: &str) -> Result<Option<Statement>, ChatError> {
        self.conversations.last_response(&SessionId::from(session))
    }

    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.conversations.list()
    }

    pub fn delete_conversation(&self, session: &str) -> Result<(), ChatError> {
        debug!(session, "Deleting conversation");
        self.conversations.delete(&SessionId::from(session))
    }

    /// Forget every conversation. The corpus is kept.
    pub fn reset_conversations(&self) -> Result<(), ChatError> {
        info!("Resetting all conversations");
        self.conversations.reset()
    }

    pub fn default_session(&self) -> &SessionId {
        self.conversations.default_session()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn StatementStore> {
        &self.store
    }

    pub fn is_read_only(&self) -> bool {
        self.recorder.is_read_only()
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.selector.strategy_names()
    }

    pub(crate) fn recorder(&self) -> &LearningRecorder {
        &self.recorder
    }

    /// A trainer that feeds dialog into this bot's corpus.
    pub fn trainer(&self) -> ListTrainer<'_> {
        ListTrainer::new(self)
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Conversation bookkeeping.
//!
//! Keeps the ordered statements of every session in memory. Sessions are
//! created on first use; a caller that names no session gets the default
//! session handed to the manager at construction.
//!
//! Appends to one session are not serialized against each other: callers
//! must not issue overlapping turns on the same session id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_core::types::{SessionId, Statement};

use crate::error::ChatError;

// =============================================================================
// Conversation
// =============================================================================

/// An ordered, append-only sequence of statements in one session.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: SessionId,
    pub statements: Vec<Statement>,
    pub started_at: DateTime<Utc>,
    pub last_turn_at: DateTime<Utc>,
}

impl Conversation {
    fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            statements: Vec::new(),
            started_at: now,
            last_turn_at: now,
        }
    }

    /// The most recently appended statement.
    pub fn last_response(&self) -> Option<&Statement> {
        self.statements.last()
    }
}

/// Lightweight listing entry for a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: SessionId,
    pub started_at: String,
    pub last_turn_at: String,
    pub turn_count: usize,
}

// =============================================================================
// ConversationManager
// =============================================================================

/// Owns the session id -> conversation map.
pub struct ConversationManager {
    conversations: Mutex<HashMap<SessionId, Conversation>>,
    default_session: SessionId,
}

impl ConversationManager {
    pub fn new(default_session: SessionId) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            default_session,
        }
    }

    pub fn default_session(&self) -> &SessionId {
        &self.default_session
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Conversation>>, ChatError> {
        self.conversations
            .lock()
            .map_err(|e| ChatError::Store(format!("conversation lock poisoned: {}", e)))
    }

    /// The id a request for `session` refers to, without creating anything.
    ///
    /// `None` resolves to the default session.
    pub fn resolve(&self, session: Option<&SessionId>) -> SessionId {
        session.unwrap_or(&self.default_session).clone()
    }

    /// Resolve a session, creating an empty conversation if it is unknown.
    pub fn get_or_create(&self, session: Option<&SessionId>) -> Result<SessionId, ChatError> {
        let id = self.resolve(session);
        let mut conversations = self.lock()?;
        if !conversations.contains_key(&id) {
            tracing::debug!(session = %id, "Creating conversation");
            conversations.insert(id.clone(), Conversation::new(id.clone()));
        }
        Ok(id)
    }

    /// Append a statement to a session, creating the session if needed.
    pub fn append(&self, session: &SessionId, statement: Statement) -> Result<(), ChatError> {
        let mut conversations = self.lock()?;
        let conversation = conversations
            .entry(session.clone())
            .or_insert_with(|| Conversation::new(session.clone()));
        conversation.statements.push(statement);
        conversation.last_turn_at = Utc::now();
        Ok(())
    }

    /// What the next input in this session would be responding to.
    ///
    /// An unknown session has nothing to respond to.
    pub fn last_response(&self, session: &SessionId) -> Result<Option<Statement>, ChatError> {
        Ok(self
            .lock()?
            .get(session)
            .and_then(|conv| conv.last_response().cloned()))
    }

    /// Snapshot of a conversation.
    pub fn get(&self, session: &SessionId) -> Result<Option<Conversation>, ChatError> {
        Ok(self.lock()?.get(session).cloned())
    }

    /// Ordered statements of a session.
    pub fn history(&self, session: &SessionId) -> Result<Vec<Statement>, ChatError> {
        let conversations = self.lock()?;
        conversations
            .get(session)
            .map(|c| c.statements.clone())
            .ok_or_else(|| ChatError::SessionNotFound(session.clone()))
    }

    /// All conversations, oldest first.
    pub fn list(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let conversations = self.lock()?;
        let mut summaries: Vec<(DateTime<Utc>, ConversationSummary)> = conversations
            .values()
            .map(|c| {
                (
                    c.started_at,
                    ConversationSummary {
                        id: c.id.clone(),
                        started_at: c.started_at.to_rfc3339(),
                        last_turn_at: c.last_turn_at.to_rfc3339(),
                        turn_count: c.statements.len(),
                    },
                )
            })
            .collect();
        summaries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(summaries.into_iter().map(|(_, s)| s).collect())
    }

    pub fn delete(&self, session: &SessionId) -> Result<(), ChatError> {
        let mut conversations = self.lock()?;
        if conversations.remove(session).is_some() {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session.clone()))
        }
    }

    /// Forget every conversation.
    pub fn reset(&self) -> Result<(), ChatError> {
        self.lock()?.clear();
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Shared domain types for the Parley corpus.
//!
//! A [`Statement`] is identified by its text. Everything that follows a
//! statement in dialog is recorded on the *following* statement as a
//! [`ResponseLink`] naming the prior text.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ResponseLink
// =============================================================================

/// A weighted edge `prior -> this statement`.
///
/// Stored on the next statement; `text` is the prior statement's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseLink {
    /// Text of the statement this one was produced in reply to.
    pub text: String,
    /// How many times the pairing has been seen. Always >= 1.
    pub occurrence_count: u64,
}

impl ResponseLink {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            occurrence_count: 1,
        }
    }
}

// =============================================================================
// Statement
// =============================================================================

/// A normalized unit of text tracked by the corpus.
///
/// Two statements with the same `text` are the same entity: equality and
/// hashing only look at the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    /// Number of times this exact text has been persisted.
    pub occurrence_count: u64,
    /// Prior statements this one has been a reply to.
    pub in_response_to: Vec<ResponseLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Statement {
    /// Create an unpersisted statement with no history.
    pub fn new(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            text: text.into(),
            occurrence_count: 0,
            in_response_to: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record that this statement followed `prior`, bumping the link count
    /// when the pairing already exists.
    pub fn add_response(&mut self, prior: &str) {
        match self.in_response_to.iter_mut().find(|l| l.text == prior) {
            Some(link) => link.occurrence_count += 1,
            None => self.in_response_to.push(ResponseLink::new(prior)),
        }
    }

    /// Link count for `prior -> self`, or 0 if never seen.
    pub fn response_count(&self, prior: &str) -> u64 {
        self.in_response_to
            .iter()
            .find(|l| l.text == prior)
            .map(|l| l.occurrence_count)
            .unwrap_or(0)
    }

    /// Whether this statement has ever followed `prior`.
    pub fn responds_to(&self, prior: &str) -> bool {
        self.in_response_to.iter().any(|l| l.text == prior)
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Statement {}

impl Hash for Statement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::new(text)
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::new(text)
    }
}

// =============================================================================
// SessionId
// =============================================================================

/// Identifier of a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        SessionId(id)
    }
}

// =============================================================================
// CandidateScope
// =============================================================================

/// Coarse prefilter a store applies before fine-grained scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateScope {
    /// Every statement in the corpus.
    #[default]
    All,
    /// Only statements that have been a reply to something.
    Responses,
    /// The `limit` most recently updated statements.
    Recent { limit: usize },
}

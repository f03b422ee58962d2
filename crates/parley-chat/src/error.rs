//! Error types for the chat engine.

use parley_core::error::ParleyError;
use parley_core::types::SessionId;

/// Errors from the chat engine.
///
/// `Config` is only produced while building a bot. `Store` is the
/// recoverable per-request failure; no-match is never an error.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
}

impl From<ParleyError> for ChatError {
    fn from(err: ParleyError) -> Self {
        match err {
            ParleyError::Config(msg) => ChatError::Config(msg),
            other => ChatError::Store(other.to_string()),
        }
    }
}

//! Reply rendering.

use serde::Serialize;

use parley_core::types::{SessionId, Statement};

/// The outcome of one `get_response` call.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub statement: Statement,
    pub confidence: f64,
    /// Strategy that produced the reply, `no_knowledge` for the fallback.
    pub strategy: String,
    pub session_id: SessionId,
}

impl Reply {
    pub fn text(&self) -> &str {
        &self.statement.text
    }
}

/// Turns a reply into the string shown to a user.
pub trait OutputFormatter: Send + Sync {
    fn format(&self, reply: &Reply) -> String;
}

/// Plain text, optionally prefixed with the bot's name.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    prefix: Option<String>,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            prefix: Some(name.into()),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, reply: &Reply) -> String {
        match &self.prefix {
            Some(name) => format!("{}: {}", name, reply.text()),
            None => reply.text().to_string(),
        }
    }
}

/// One JSON object per reply.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, reply: &Reply) -> String {
        serde_json::json!({
            "response": reply.text(),
            "confidence": reply.confidence,
            "strategy": reply.strategy,
            "session_id": reply.session_id,
        })
        .to_string()
    }
}

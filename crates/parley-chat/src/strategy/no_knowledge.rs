//! The mandatory fallback strategy.

use parley_core::types::Statement;

use super::{Match, MatchingStrategy};

/// Always answers with the configured default response at confidence 0.
///
/// The ensemble holds exactly one of these, outside the configurable
/// strategy list, so a reply always exists.
pub struct NoKnowledge {
    default_response: String,
}

impl NoKnowledge {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            default_response: default_response.into(),
        }
    }

    /// The default reply as a fresh statement.
    pub fn response(&self) -> Statement {
        Statement::new(self.default_response.as_str())
    }
}

impl MatchingStrategy for NoKnowledge {
    fn name(&self) -> &str {
        "no_knowledge"
    }

    fn evaluate(&self, _input: &Statement, _pool: &[Statement]) -> Match {
        Match {
            response: Some(self.response()),
            confidence: 0.0,
        }
    }
}

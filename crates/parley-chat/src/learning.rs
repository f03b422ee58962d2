//! Learning path: the only place the corpus is written.
//!
//! The read-only switch is enforced here and nowhere else. When it is on,
//! every write is skipped and selection keeps working on a frozen corpus.

use std::sync::Arc;

use tracing::{debug, info};

use parley_core::types::Statement;
use parley_storage::StatementStore;

use crate::error::ChatError;

/// Records observed exchanges into a statement store.
pub struct LearningRecorder {
    store: Arc<dyn StatementStore>,
    read_only: bool,
}

impl LearningRecorder {
    pub fn new(store: Arc<dyn StatementStore>, read_only: bool) -> Self {
        Self { store, read_only }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Learn that `statement` was said in reply to `prior`.
    ///
    /// The link and the occurrence bump are one atomic store update.
    /// Returns the stored record, or `None` when read-only.
    pub fn record(
        &self,
        statement: &Statement,
        prior: Option<&Statement>,
    ) -> Result<Option<Statement>, ChatError> {
        if self.read_only {
            debug!(text = %statement.text, "Read-only: skipping learn");
            return Ok(None);
        }

        let prior_text = prior.map(|p| p.text.as_str());
        let stored = self.store.learn(statement, prior_text)?;
        if let Some(prior_text) = prior_text {
            info!(
                next = %statement.text,
                prior = %prior_text,
                "Added \"{}\" as a response to \"{}\"",
                statement.text,
                prior_text
            );
        }
        Ok(Some(stored))
    }

    /// Learn one full exchange: `input` in reply to `prior`, plus one more
    /// occurrence of the `response` the bot produced for it.
    ///
    /// Everything is written in one atomic store update, so a failed write
    /// leaves the corpus as it was. Returns the stored input, or `None` when
    /// read-only.
    pub fn record_exchange(
        &self,
        input: &Statement,
        prior: Option<&Statement>,
        response: &Statement,
    ) -> Result<Option<Statement>, ChatError> {
        if self.read_only {
            debug!(text = %input.text, "Read-only: skipping exchange");
            return Ok(None);
        }

        let prior_text = prior.map(|p| p.text.as_str());
        let stored = self.store.learn_exchange(input, prior_text, response)?;
        if let Some(prior_text) = prior_text {
            info!(
                next = %input.text,
                prior = %prior_text,
                "Added \"{}\" as a response to \"{}\"",
                input.text,
                prior_text
            );
        }
        Ok(Some(stored))
    }
}

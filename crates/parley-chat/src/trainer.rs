//! Corpus training from scripted dialog.

use tracing::info;

use parley_core::types::Statement;

use crate::error::ChatError;
use crate::orchestrator::ChatBot;

/// Feeds an ordered dialog into a bot's corpus.
///
/// Each utterance is learned as a reply to the one before it. Training
/// goes through the same recorder as live conversation, so a read-only
/// bot learns nothing.
pub struct ListTrainer<'a> {
    bot: &'a ChatBot,
}

impl<'a> ListTrainer<'a> {
    pub fn new(bot: &'a ChatBot) -> Self {
        Self { bot }
    }

    /// Learn `dialog` in order. Blank lines are skipped and do not break
    /// the chain. Returns the number of utterances learned.
    pub fn train<S: AsRef<str>>(&self, dialog: &[S]) -> Result<usize, ChatError> {
        let mut prior: Option<Statement> = None;
        let mut learned = 0;

        for line in dialog {
            let statement = self.bot.preprocess(Statement::new(line.as_ref()));
            if statement.text.is_empty() {
                continue;
            }
            if self.bot.recorder().record(&statement, prior.as_ref())?.is_some() {
                learned += 1;
            }
            prior = Some(statement);
        }

        info!(learned, total = dialog.len(), "Training complete");
        Ok(learned)
    }
}

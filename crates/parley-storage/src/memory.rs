//! In-memory statement store.
//!
//! Holds the whole corpus in a `HashMap` behind a single `Mutex`, which
//! makes every read-modify-write atomic. Creation order is tracked
//! separately so candidate pools are deterministic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::info;

use parley_core::error::{ParleyError, Result};
use parley_core::types::{CandidateScope, Statement};

use crate::store::StatementStore;

#[derive(Default)]
struct Corpus {
    statements: HashMap<String, Statement>,
    /// Statement texts in creation order.
    order: Vec<String>,
}

impl Corpus {
    fn entry(&mut self, text: &str) -> &mut Statement {
        if !self.statements.contains_key(text) {
            self.order.push(text.to_string());
        }
        self.statements
            .entry(text.to_string())
            .or_insert_with(|| Statement::new(text))
    }

    fn in_order(&self) -> impl Iterator<Item = &Statement> {
        self.order.iter().filter_map(|t| self.statements.get(t))
    }
}

/// Thread-safe in-memory store, mainly for tests and ephemeral bots.
#[derive(Default)]
pub struct MemoryStore {
    corpus: Mutex<Corpus>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Corpus>> {
        self.corpus
            .lock()
            .map_err(|e| ParleyError::Storage(format!("corpus lock poisoned: {}", e)))
    }
}

impl StatementStore for MemoryStore {
    fn get_candidates(&self, scope: &CandidateScope) -> Result<Vec<Statement>> {
        let corpus = self.lock()?;
        let pool = match scope {
            CandidateScope::All => corpus.in_order().cloned().collect(),
            CandidateScope::Responses => corpus
                .in_order()
                .filter(|s| !s.in_response_to.is_empty())
                .cloned()
                .collect(),
            CandidateScope::Recent { limit } => {
                let mut ranked: Vec<(usize, &Statement)> = corpus.in_order().enumerate().collect();
                // Stable sort keeps creation order among equal timestamps.
                ranked.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));
                ranked.truncate(*limit);
                ranked.sort_by_key(|(seq, _)| *seq);
                ranked.into_iter().map(|(_, s)| s.clone()).collect()
            }
        };
        Ok(pool)
    }

    fn upsert(&self, statement: &Statement) -> Result<Statement> {
        let mut corpus = self.lock()?;
        let stored = corpus.entry(&statement.text);
        stored.occurrence_count += 1;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn link_response(&self, prior: &str, next: &str) -> Result<()> {
        let mut corpus = self.lock()?;
        let stored = corpus.entry(next);
        stored.add_response(prior);
        stored.updated_at = Utc::now();
        Ok(())
    }

    fn learn(&self, next: &Statement, prior: Option<&str>) -> Result<Statement> {
        let mut corpus = self.lock()?;
        let stored = corpus.entry(&next.text);
        if let Some(prior) = prior {
            stored.add_response(prior);
        }
        stored.occurrence_count += 1;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn learn_exchange(
        &self,
        input: &Statement,
        prior: Option<&str>,
        response: &Statement,
    ) -> Result<Statement> {
        let mut corpus = self.lock()?;
        let now = Utc::now();

        let stored = corpus.entry(&input.text);
        if let Some(prior) = prior {
            stored.add_response(prior);
        }
        stored.occurrence_count += 1;
        stored.updated_at = now;
        let learned = stored.clone();

        let reply = corpus.entry(&response.text);
        reply.occurrence_count += 1;
        reply.updated_at = now;

        Ok(learned)
    }

    fn find(&self, text: &str) -> Result<Option<Statement>> {
        Ok(self.lock()?.statements.get(text).cloned())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.lock()?.statements.len() as u64)
    }

    fn drop_all(&self) -> Result<()> {
        let mut corpus = self.lock()?;
        corpus.statements.clear();
        corpus.order.clear();
        info!("In-memory corpus dropped");
        Ok(())
    }
}

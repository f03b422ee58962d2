//! The statement store contract.
//!
//! Every backend exposes the same operations. Count updates must be atomic
//! per statement text: two conversations reinforcing the same statement at
//! the same time must both be counted.

use parley_core::error::Result;
use parley_core::types::{CandidateScope, Statement};

/// Persistent corpus of statements and their response links.
pub trait StatementStore: Send + Sync {
    /// Coarse candidate pool for one selection round.
    ///
    /// Results are in creation order. A non-empty store yields a non-empty
    /// pool for [`CandidateScope::All`] and [`CandidateScope::Recent`].
    fn get_candidates(&self, scope: &CandidateScope) -> Result<Vec<Statement>>;

    /// Create the statement if needed and add one to its occurrence count.
    ///
    /// Only the text of `statement` is used; links are written through
    /// [`StatementStore::link_response`] or [`StatementStore::learn`].
    fn upsert(&self, statement: &Statement) -> Result<Statement>;

    /// Add one to the `prior -> next` link count, creating `next` with a
    /// zero occurrence count if it is not stored yet.
    fn link_response(&self, prior: &str, next: &str) -> Result<()>;

    /// Link `prior -> next` (when given) and count one occurrence of `next`
    /// as a single atomic update.
    fn learn(&self, next: &Statement, prior: Option<&str>) -> Result<Statement>;

    /// Record one conversational exchange as a single atomic update: learn
    /// `input` (linked to `prior` when given) and count one occurrence of
    /// `response`. Either every change lands or none does.
    ///
    /// Returns the stored `input`.
    fn learn_exchange(
        &self,
        input: &Statement,
        prior: Option<&str>,
        response: &Statement,
    ) -> Result<Statement>;

    /// Look up a statement by its exact text.
    fn find(&self, text: &str) -> Result<Option<Statement>>;

    /// Number of stored statements.
    fn count(&self) -> Result<u64>;

    /// Remove every statement and link.
    fn drop_all(&self) -> Result<()>;

    /// Whether this store accepts writes.
    fn is_writable(&self) -> bool {
        true
    }
}

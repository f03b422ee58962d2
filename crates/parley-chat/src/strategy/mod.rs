//! Matching strategies.
//!
//! A strategy looks at the input and a candidate pool and proposes one
//! response with a confidence. Strategies never touch the store and never
//! fail: having no opinion is a [`Match::none`].

pub mod best_match;
pub mod frequency;
pub mod no_knowledge;

pub use best_match::BestMatch;
pub use frequency::Frequency;
pub use no_knowledge::NoKnowledge;

use parley_core::config::{LogicConfig, StrategyKind};
use parley_core::types::Statement;

use crate::similarity::{comparator_for, TextComparator};

// =============================================================================
// Match
// =============================================================================

/// One strategy's proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub response: Option<Statement>,
    /// In `[0, 1]`. Zero means "no opinion".
    pub confidence: f64,
}

impl Match {
    /// A proposal with the confidence clamped to `[0, 1]` (NaN becomes 0).
    pub fn new(response: Statement, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            response: Some(response),
            confidence,
        }
    }

    pub fn none() -> Self {
        Self {
            response: None,
            confidence: 0.0,
        }
    }

    /// Whether this proposal can compete in selection.
    pub fn is_opinion(&self) -> bool {
        self.response.is_some() && self.confidence > 0.0
    }
}

// =============================================================================
// MatchingStrategy
// =============================================================================

/// A pluggable scoring function over a candidate pool.
pub trait MatchingStrategy: Send + Sync {
    /// Stable name used in logs and replies.
    fn name(&self) -> &str;

    /// Whether this strategy wants to look at `input` at all.
    fn can_process(&self, _input: &Statement) -> bool {
        true
    }

    /// Propose a response for `input` from `pool`.
    fn evaluate(&self, input: &Statement, pool: &[Statement]) -> Match;
}

/// Build the strategy registered under `kind`.
pub fn build_strategy(kind: StrategyKind, logic: &LogicConfig) -> Box<dyn MatchingStrategy> {
    match kind {
        StrategyKind::BestMatch => Box::new(BestMatch::new(
            comparator_for(logic.comparator),
            logic.response_selection,
        )),
        StrategyKind::Frequency => Box::new(Frequency::new(comparator_for(logic.comparator))),
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// The known prior text most similar to the input.
///
/// Priors are the texts that appear in some candidate's `in_response_to`.
/// Ties keep the first prior seen in pool order.
pub(crate) fn closest_prior<'a>(
    input: &Statement,
    pool: &'a [Statement],
    comparator: &dyn TextComparator,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;
    for link in pool.iter().flat_map(|s| s.in_response_to.iter()) {
        let similarity = comparator.compare(&input.text, &link.text);
        if best.map_or(true, |(_, score)| similarity > score) {
            best = Some((link.text.as_str(), similarity));
        }
    }
    best
}

/// Candidates that have followed `prior`, in pool order.
pub(crate) fn responses_to<'a>(prior: &str, pool: &'a [Statement]) -> Vec<&'a Statement> {
    pool.iter().filter(|s| s.responds_to(prior)).collect()
}

/// The response seen most often after `prior`; ties keep pool order.
pub(crate) fn most_frequent<'a>(prior: &str, responses: &[&'a Statement]) -> Option<&'a Statement> {
    let mut best: Option<&'a Statement> = None;
    for &candidate in responses {
        let count = candidate.response_count(prior);
        if best.map_or(true, |b| count > b.response_count(prior)) {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
pub(crate) mod test_support {
    use parley_core::types::Statement;

    /// Build a pool from `(prior, response, count)` triples, merging repeats.
    pub fn pool(links: &[(&str, &str, u64)]) -> Vec<Statement> {
        let mut pool: Vec<Statement> = Vec::new();
        for (prior, response, count) in links {
            let idx = match pool.iter().position(|s| s.text == *response) {
                Some(i) => i,
                None => {
                    pool.push(Statement::new(*response));
                    pool.len() - 1
                }
            };
            for _ in 0..*count {
                pool[idx].add_response(prior);
            }
        }
        pool
    }
}

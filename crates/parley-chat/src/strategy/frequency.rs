//! Prior-response frequency strategy.

use tracing::debug;

use parley_core::types::Statement;

use super::{closest_prior, most_frequent, responses_to, Match, MatchingStrategy};
use crate::similarity::TextComparator;

/// Answers with the reply that most often followed the closest known
/// statement.
///
/// Confidence is `similarity * count / total`, where `total` sums every
/// link count out of that statement. An exact prior with replies seen 3
/// and 1 times yields the first at 0.75.
pub struct Frequency {
    comparator: Box<dyn TextComparator>,
}

impl Frequency {
    pub fn new(comparator: Box<dyn TextComparator>) -> Self {
        Self { comparator }
    }
}

impl MatchingStrategy for Frequency {
    fn name(&self) -> &str {
        "frequency"
    }

    fn evaluate(&self, input: &Statement, pool: &[Statement]) -> Match {
        let Some((prior, similarity)) = closest_prior(input, pool, self.comparator.as_ref()) else {
            return Match::none();
        };

        let responses = responses_to(prior, pool);
        let total: u64 = responses.iter().map(|s| s.response_count(prior)).sum();
        let Some(response) = most_frequent(prior, &responses) else {
            return Match::none();
        };
        if total == 0 {
            return Match::none();
        }

        let share = response.response_count(prior) as f64 / total as f64;
        debug!(closest = prior, similarity, share, response = %response.text, "Frequency match found");
        Match::new(response.clone(), similarity * share)
    }
}

//! Lexical best-match strategy.

use tracing::debug;

use parley_core::config::ResponseSelectionMethod;
use parley_core::types::Statement;

use super::{closest_prior, most_frequent, responses_to, Match, MatchingStrategy};
use crate::similarity::TextComparator;

/// Finds the known statement closest to the input and answers with one of
/// the replies it has received.
///
/// Confidence is the similarity between the input and that statement.
pub struct BestMatch {
    comparator: Box<dyn TextComparator>,
    selection: ResponseSelectionMethod,
}

impl BestMatch {
    pub fn new(comparator: Box<dyn TextComparator>, selection: ResponseSelectionMethod) -> Self {
        Self {
            comparator,
            selection,
        }
    }
}

impl MatchingStrategy for BestMatch {
    fn name(&self) -> &str {
        "best_match"
    }

    fn evaluate(&self, input: &Statement, pool: &[Statement]) -> Match {
        let Some((prior, similarity)) = closest_prior(input, pool, self.comparator.as_ref()) else {
            return Match::none();
        };

        let responses = responses_to(prior, pool);
        let chosen = match self.selection {
            ResponseSelectionMethod::First => responses.first().copied(),
            ResponseSelectionMethod::MostFrequent => most_frequent(prior, &responses),
        };

        match chosen {
            Some(response) => {
                debug!(closest = prior, similarity, response = %response.text, "Best match found");
                Match::new(response.clone(), similarity)
            }
            None => Match::none(),
        }
    }
}

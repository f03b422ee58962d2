//! Ensemble selection across matching strategies.
//!
//! Every configured strategy scores the same input against the same pool.
//! The strictly highest confidence wins; ties go to the strategy configured
//! first. When nobody has an opinion the no-knowledge fallback answers.

use tracing::debug;

use parley_core::config::LogicConfig;
use parley_core::types::Statement;

use crate::strategy::{build_strategy, MatchingStrategy, NoKnowledge};

/// The winning response of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub response: Statement,
    pub confidence: f64,
    /// Name of the strategy that produced `response`.
    pub strategy: String,
}

/// Ordered strategies plus the fallback, fixed at construction.
pub struct EnsembleSelector {
    strategies: Vec<Box<dyn MatchingStrategy>>,
    fallback: NoKnowledge,
}

impl EnsembleSelector {
    pub fn new(strategies: Vec<Box<dyn MatchingStrategy>>, fallback: NoKnowledge) -> Self {
        Self {
            strategies,
            fallback,
        }
    }

    /// Build the strategies listed in `logic`, in order.
    pub fn from_config(logic: &LogicConfig) -> Self {
        let strategies = logic
            .strategies
            .iter()
            .map(|kind| build_strategy(*kind, logic))
            .collect();
        Self::new(strategies, NoKnowledge::new(logic.default_response.as_str()))
    }

    /// Strategy names in tie-break order, fallback last.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Pick one response for `input` from `pool`.
    ///
    /// All strategies run; none short-circuits the others.
    pub fn select(&self, input: &Statement, pool: &[Statement]) -> Selection {
        let mut best: Option<Selection> = None;

        for strategy in &self.strategies {
            if !strategy.can_process(input) {
                debug!(strategy = strategy.name(), "Strategy skipped input");
                continue;
            }

            let proposal = strategy.evaluate(input, pool);
            debug!(
                strategy = strategy.name(),
                confidence = proposal.confidence,
                response = ?proposal.response.as_ref().map(|s| s.text.as_str()),
                "Strategy evaluated"
            );

            if !proposal.is_opinion() {
                continue;
            }
            let beats_best = best
                .as_ref()
                .map_or(true, |b| proposal.confidence > b.confidence);
            if !beats_best {
                continue;
            }
            if let Some(response) = proposal.response {
                best = Some(Selection {
                    response,
                    confidence: proposal.confidence,
                    strategy: strategy.name().to_string(),
                });
            }
        }

        best.unwrap_or_else(|| {
            debug!("No strategy had an opinion, using fallback");
            Selection {
                response: self.fallback.response(),
                confidence: 0.0,
                strategy: self.fallback.name().to_string(),
            }
        })
    }
}

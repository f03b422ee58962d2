//! Parley chat engine.
//!
//! Selects a reply for each input by running an ordered ensemble of
//! matching strategies over the learned corpus, then learns from the
//! exchange: the input is recorded as a response to the previous turn of
//! the same conversation.

pub mod context;
pub mod ensemble;
pub mod error;
pub mod learning;
pub mod orchestrator;
pub mod output;
pub mod preprocess;
pub mod similarity;
pub mod strategy;
pub mod trainer;

pub use context::{Conversation, ConversationManager, ConversationSummary};
pub use ensemble::{EnsembleSelector, Selection};
pub use error::ChatError;
pub use learning::LearningRecorder;
pub use orchestrator::ChatBot;
pub use output::{JsonFormatter, OutputFormatter, Reply, TextFormatter};
pub use preprocess::Preprocessor;
pub use similarity::TextComparator;
pub use strategy::{Match, MatchingStrategy};
pub use trainer::ListTrainer;

//! End-to-end tests for the chat engine.
//!
//! Each test builds its own bot over a fresh store, either in memory or in
//! a temporary SQLite file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parley_chat::similarity::LevenshteinRatio;
use parley_chat::strategy::{Frequency, Match, MatchingStrategy};
use parley_chat::{ChatBot, ChatError, JsonFormatter, OutputFormatter};
use parley_core::config::{ParleyConfig, StrategyKind};
use parley_core::error::{ParleyError, Result as StoreResult};
use parley_core::types::{CandidateScope, Statement};
use parley_storage::{MemoryStore, SqliteStore, StatementStore};

// =============================================================================
// Helpers
// =============================================================================

/// Proposes one fixed reply whenever the input matches a known question.
struct Lexical {
    question: &'static str,
    answer: &'static str,
    confidence: f64,
}

impl MatchingStrategy for Lexical {
    fn name(&self) -> &str {
        "lexical"
    }

    fn evaluate(&self, input: &Statement, _pool: &[Statement]) -> Match {
        if input.text == self.question {
            Match::new(Statement::new(self.answer), self.confidence)
        } else {
            Match::none()
        }
    }
}

/// In-memory store whose reads or writes can be made to fail on demand.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ParleyError::Storage("disk read failed".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ParleyError::Storage("disk full".to_string()));
        }
        Ok(())
    }
}

impl StatementStore for FlakyStore {
    fn get_candidates(&self, scope: &CandidateScope) -> StoreResult<Vec<Statement>> {
        self.check_read()?;
        self.inner.get_candidates(scope)
    }

    fn upsert(&self, statement: &Statement) -> StoreResult<Statement> {
        self.check_write()?;
        self.inner.upsert(statement)
    }

    fn link_response(&self, prior: &str, next: &str) -> StoreResult<()> {
        self.check_write()?;
        self.inner.link_response(prior, next)
    }

    fn learn(&self, next: &Statement, prior: Option<&str>) -> StoreResult<Statement> {
        self.check_write()?;
        self.inner.learn(next, prior)
    }

    fn learn_exchange(
        &self,
        input: &Statement,
        prior: Option<&str>,
        response: &Statement,
    ) -> StoreResult<Statement> {
        self.check_write()?;
        self.inner.learn_exchange(input, prior, response)
    }

    fn find(&self, text: &str) -> StoreResult<Option<Statement>> {
        self.inner.find(text)
    }

    fn count(&self) -> StoreResult<u64> {
        self.inner.count()
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.check_write()?;
        self.inner.drop_all()
    }
}

fn how_are_you_corpus(store: &dyn StatementStore) {
    for _ in 0..3 {
        store.link_response("How are you?", "I am good").unwrap();
    }
    store.link_response("How are you?", "Fine").unwrap();
}

fn snapshot(store: &dyn StatementStore) -> Vec<(String, u64, Vec<(String, u64)>)> {
    store
        .get_candidates(&CandidateScope::All)
        .unwrap()
        .into_iter()
        .map(|s| {
            let links = s
                .in_response_to
                .into_iter()
                .map(|l| (l.text, l.occurrence_count))
                .collect();
            (s.text, s.occurrence_count, links)
        })
        .collect()
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_tie_goes_to_earlier_configured_strategy() {
    let store = Arc::new(MemoryStore::new());
    how_are_you_corpus(store.as_ref());

    let strategies: Vec<Box<dyn MatchingStrategy>> = vec![
        Box::new(Frequency::new(Box::new(LevenshteinRatio))),
        Box::new(Lexical {
            question: "How are you?",
            answer: "Fine",
            confidence: 0.75,
        }),
    ];
    let bot = ChatBot::with_strategies(&ParleyConfig::default(), store, strategies).unwrap();

    let reply = bot.get_response("How are you?", Some("s1")).unwrap();
    assert_eq!(reply.text(), "I am good");
    assert_eq!(reply.strategy, "frequency");
    assert!((reply.confidence - 0.75).abs() < 1e-9);
}

#[test]
fn test_tie_respects_reversed_order() {
    let store = Arc::new(MemoryStore::new());
    how_are_you_corpus(store.as_ref());

    let strategies: Vec<Box<dyn MatchingStrategy>> = vec![
        Box::new(Lexical {
            question: "How are you?",
            answer: "Fine",
            confidence: 0.75,
        }),
        Box::new(Frequency::new(Box::new(LevenshteinRatio))),
    ];
    let bot = ChatBot::with_strategies(&ParleyConfig::default(), store, strategies).unwrap();

    assert_eq!(bot.get_response("How are you?", None).unwrap().text(), "Fine");
}

#[test]
fn test_fallback_only_on_empty_corpus() {
    let mut config = ParleyConfig::default();
    config.logic.strategies = vec![];
    config.logic.default_response = "I don't understand".to_string();
    let bot = ChatBot::new(&config, Arc::new(MemoryStore::new())).unwrap();

    for input in ["Hello", "What is the time?", "42"] {
        let reply = bot.get_response(input, Some("s1")).unwrap();
        assert_eq!(reply.text(), "I don't understand");
        assert_eq!(reply.confidence, 0.0);
    }
}

#[test]
fn test_every_input_gets_a_reply() {
    let mut config = ParleyConfig::default();
    config.logic.strategies = vec![StrategyKind::Frequency, StrategyKind::BestMatch];
    let store = Arc::new(MemoryStore::new());
    how_are_you_corpus(store.as_ref());
    let bot = ChatBot::new(&config, store).unwrap();

    for input in ["How are you?", "zzz", "Fine", "?"] {
        let reply = bot.get_response(input, None).unwrap();
        assert!(!reply.text().is_empty());
        assert!((0.0..=1.0).contains(&reply.confidence));
    }
}

// =============================================================================
// Learning
// =============================================================================

#[test]
fn test_two_turn_conversation_in_s1() {
    let store = Arc::new(MemoryStore::new());
    let bot = ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap();
    bot.trainer().train(&["Hi", "Hi"]).unwrap();
    bot.trainer().train(&["How are you?", "How are you?"]).unwrap();

    bot.get_response("Hi", Some("s1")).unwrap();
    bot.get_response("How are you?", Some("s1")).unwrap();

    assert_eq!(bot.last_response("s1").unwrap().unwrap().text, "How are you?");
    let how = store.find("How are you?").unwrap().unwrap();
    assert_eq!(how.response_count("Hi"), 1);
}

#[test]
fn test_learning_adds_exactly_one_per_call() {
    let store = Arc::new(MemoryStore::new());
    let bot = ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap();

    bot.learn_response("Fine", Some("How are you?")).unwrap();
    let before = store.find("Fine").unwrap().unwrap();
    bot.learn_response("Fine", Some("How are you?")).unwrap();
    bot.learn_response("Fine", Some("How are you?")).unwrap();
    let after = store.find("Fine").unwrap().unwrap();

    assert_eq!(after.response_count("How are you?") - before.response_count("How are you?"), 2);
    assert_eq!(after.occurrence_count - before.occurrence_count, 2);
}

#[test]
fn test_concurrent_learning_no_lost_updates() {
    let store = Arc::new(MemoryStore::new());
    let bot = Arc::new(ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bot = Arc::clone(&bot);
            thread::spawn(move || {
                for _ in 0..50 {
                    bot.learn_response("Fine", Some("How are you?")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let fine = store.find("Fine").unwrap().unwrap();
    assert_eq!(fine.response_count("How are you?"), 400);
    assert_eq!(fine.occurrence_count, 400);
}

#[test]
fn test_upsert_round_trip_counts() {
    let store = MemoryStore::new();
    store.upsert(&Statement::new("Hello")).unwrap();
    let first = store.find("Hello").unwrap().unwrap();
    store.upsert(&first).unwrap();
    let second = store.find("Hello").unwrap().unwrap();
    assert_eq!(second.occurrence_count, first.occurrence_count + 1);
}

#[test]
fn test_read_only_snapshot_unchanged() {
    let store = Arc::new(MemoryStore::new());
    how_are_you_corpus(store.as_ref());
    let mut config = ParleyConfig::default();
    config.engine.read_only = true;
    let bot = ChatBot::new(&config, store.clone()).unwrap();

    let before = snapshot(store.as_ref());
    for input in ["How are you?", "Something new", "Fine"] {
        bot.get_response(input, Some("s1")).unwrap();
    }
    bot.trainer().train(&["a", "b", "c"]).unwrap();
    assert_eq!(before, snapshot(store.as_ref()));
    assert_eq!(bot.conversation_history("s1").unwrap().len(), 6);
}

// =============================================================================
// Store failures
// =============================================================================

#[test]
fn test_failed_candidate_read_creates_no_session() {
    let store = Arc::new(FlakyStore::default());
    let bot = ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap();
    store.fail_reads.store(true, Ordering::SeqCst);

    let result = bot.get_response("Hello", Some("fresh"));
    assert!(matches!(result, Err(ChatError::Store(_))));
    assert!(bot.conversation("fresh").unwrap().is_none());
    assert!(bot.list_conversations().unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_failed_write_leaves_corpus_and_history_unchanged() {
    let store = Arc::new(FlakyStore::default());
    let bot = ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap();
    bot.get_response("Hi", Some("s1")).unwrap();
    let before = snapshot(store.as_ref());

    store.fail_writes.store(true, Ordering::SeqCst);
    let result = bot.get_response("Hello", Some("s1"));
    assert!(matches!(result, Err(ChatError::Store(_))));

    assert!(store.find("Hello").unwrap().is_none());
    assert_eq!(before, snapshot(store.as_ref()));
    assert_eq!(bot.conversation_history("s1").unwrap().len(), 2);
}

#[test]
fn test_retry_after_failed_write_learns_once() {
    let store = Arc::new(FlakyStore::default());
    let bot = ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap();
    let first = bot.get_response("Hi", Some("s1")).unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    assert!(bot.get_response("Hello", Some("s1")).is_err());

    store.fail_writes.store(false, Ordering::SeqCst);
    bot.get_response("Hello", Some("s1")).unwrap();

    let hello = store.find("Hello").unwrap().unwrap();
    assert_eq!(hello.occurrence_count, 1);
    assert_eq!(hello.response_count(first.text()), 1);

    let history = bot.conversation_history("s1").unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].text, "Hello");
}

// =============================================================================
// SQLite
// =============================================================================

#[test]
fn test_sqlite_corpus_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.db");

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let bot = ChatBot::new(&ParleyConfig::default(), store).unwrap();
        bot.trainer()
            .train(&["How are you?", "I am good"])
            .unwrap();
        bot.get_response("How are you?", Some("s1")).unwrap();
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let good = store.find("I am good").unwrap().unwrap();
    assert_eq!(good.response_count("How are you?"), 1);
    // Learned once from training, once as the persisted reply.
    assert_eq!(good.occurrence_count, 2);

    let bot = ChatBot::new(&ParleyConfig::default(), store).unwrap();
    assert_eq!(bot.get_response("How are you?", None).unwrap().text(), "I am good");
}

#[test]
fn test_sqlite_concurrent_learning() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("corpus.db")).unwrap());
    let bot = Arc::new(ChatBot::new(&ParleyConfig::default(), store.clone()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bot = Arc::clone(&bot);
            thread::spawn(move || {
                for _ in 0..25 {
                    bot.learn_response("Fine", Some("How are you?")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(
        store.find("Fine").unwrap().unwrap().response_count("How are you?"),
        100
    );
}

#[test]
fn test_sqlite_read_only_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.db");
    let writer = Arc::new(SqliteStore::open(&path).unwrap());
    how_are_you_corpus(writer.as_ref());

    let reader = Arc::new(SqliteStore::open_read_only(&path).unwrap());
    let writable = ChatBot::new(&ParleyConfig::default(), reader.clone());
    assert!(matches!(writable, Err(ChatError::Config(_))));

    let mut config = ParleyConfig::default();
    config.engine.read_only = true;
    let bot = ChatBot::new(&config, reader).unwrap();
    let before = snapshot(writer.as_ref());
    bot.get_response("How are you?", None).unwrap();
    assert_eq!(before, snapshot(writer.as_ref()));
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_json_output_of_reply() {
    let bot = ChatBot::new(&ParleyConfig::default(), Arc::new(MemoryStore::new())).unwrap();
    let reply = bot.get_response("Hello", Some("s1")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&JsonFormatter.format(&reply)).unwrap();
    assert_eq!(value["session_id"], "s1");
    assert_eq!(value["strategy"], "no_knowledge");
}

//! Input preprocessors.
//!
//! Each preprocessor is a pure, total transform applied to the input
//! statement before matching, in configured order.

use std::sync::LazyLock;

use regex::Regex;

use parley_core::config::PreprocessorKind;
use parley_core::types::Statement;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Transform applied to every input statement.
pub trait Preprocessor: Send + Sync {
    fn transform(&self, statement: Statement) -> Statement;
}

/// Build the preprocessor named in configuration.
pub fn build_preprocessor(kind: PreprocessorKind) -> Box<dyn Preprocessor> {
    match kind {
        PreprocessorKind::CleanWhitespace => Box::new(CleanWhitespace),
        PreprocessorKind::UnescapeHtml => Box::new(UnescapeHtml),
        PreprocessorKind::Lowercase => Box::new(Lowercase),
    }
}

fn with_text(mut statement: Statement, text: String) -> Statement {
    statement.text = text;
    statement
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub struct CleanWhitespace;

impl Preprocessor for CleanWhitespace {
    fn transform(&self, statement: Statement) -> Statement {
        let cleaned = WHITESPACE.replace_all(statement.text.trim(), " ").into_owned();
        with_text(statement, cleaned)
    }
}

/// Decode HTML character references such as `&amp;`, `&eacute;` or `&#39;`.
///
/// Unknown named entities are left as they are.
pub struct UnescapeHtml;

impl Preprocessor for UnescapeHtml {
    fn transform(&self, statement: Statement) -> Statement {
        let decoded = html_escape::decode_html_entities(&statement.text).into_owned();
        with_text(statement, decoded)
    }
}

/// Lowercase the whole text.
pub struct Lowercase;

impl Preprocessor for Lowercase {
    fn transform(&self, statement: Statement) -> Statement {
        let lowered = statement.text.to_lowercase();
        with_text(statement, lowered)
    }
}

//! Text comparison primitives.
//!
//! Strategies only see the [`TextComparator`] trait: compare two texts and
//! get a similarity in `[0, 1]`, where 1 means identical.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use parley_core::config::ComparatorKind;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("Invalid word regex"));

/// Similarity between two texts.
pub trait TextComparator: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> f64;
}

/// Build the comparator named in configuration.
pub fn comparator_for(kind: ComparatorKind) -> Box<dyn TextComparator> {
    match kind {
        ComparatorKind::Levenshtein => Box::new(LevenshteinRatio),
        ComparatorKind::Jaccard => Box::new(JaccardSimilarity),
    }
}

// =============================================================================
// LevenshteinRatio
// =============================================================================

/// `1 - edit_distance / longest_length`, case-insensitive.
pub struct LevenshteinRatio;

impl TextComparator for LevenshteinRatio {
    fn compare(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.to_lowercase().chars().collect();
        let b: Vec<char> = b.to_lowercase().chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 1.0;
        }
        1.0 - edit_distance(&a, &b) as f64 / longest as f64
    }
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    // Single rolling row.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b.len()]
}

// =============================================================================
// JaccardSimilarity
// =============================================================================

/// Word-set overlap: `|A ∩ B| / |A ∪ B|` over lowercase word tokens.
pub struct JaccardSimilarity;

fn tokens(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

impl TextComparator for JaccardSimilarity {
    fn compare(&self, a: &str, b: &str) -> f64 {
        let a_tokens = tokens(a);
        let b_tokens = tokens(b);
        if a_tokens.is_empty() && b_tokens.is_empty() {
            return if a == b { 1.0 } else { 0.0 };
        }
        let shared = a_tokens.intersection(&b_tokens).count();
        let union = a_tokens.union(&b_tokens).count();
        shared as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ---- Levenshtein ----

    #[test]
    fn test_levenshtein_identical() {
        assert!(approx(LevenshteinRatio.compare("How are you?", "How are you?"), 1.0));
    }

    #[test]
    fn test_levenshtein_case_insensitive() {
        assert!(approx(LevenshteinRatio.compare("HELLO", "hello"), 1.0));
    }

    #[test]
    fn test_levenshtein_disjoint() {
        assert!(approx(LevenshteinRatio.compare("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_levenshtein_partial() {
        // kitten -> sitting: distance 3 over 7 chars.
        let score = LevenshteinRatio.compare("kitten", "sitting");
        assert!(approx(score, 1.0 - 3.0 / 7.0));
    }

    #[test]
    fn test_levenshtein_empty() {
        assert!(approx(LevenshteinRatio.compare("", ""), 1.0));
        assert!(approx(LevenshteinRatio.compare("", "abc"), 0.0));
    }

    #[test]
    fn test_levenshtein_unicode() {
        let score = LevenshteinRatio.compare("caf\u{00e9}", "cafe");
        assert!(approx(score, 0.75));
    }

    #[test]
    fn test_edit_distance_basic() {
        let a: Vec<char> = "flaw".chars().collect();
        let b: Vec<char> = "lawn".chars().collect();
        assert_eq!(edit_distance(&a, &b), 2);
    }

    // ---- Jaccard ----

    #[test]
    fn test_jaccard_identical_ignores_punctuation() {
        assert!(approx(JaccardSimilarity.compare("How are you?", "how are you"), 1.0));
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        // {how, are, you} vs {how, old, are, you}: 3 / 4
        let score = JaccardSimilarity.compare("How are you", "How old are you");
        assert!(approx(score, 0.75));
    }

    #[test]
    fn test_jaccard_no_overlap() {
        assert!(approx(JaccardSimilarity.compare("hello there", "goodbye now"), 0.0));
    }

    #[test]
    fn test_jaccard_punctuation_only() {
        assert!(approx(JaccardSimilarity.compare("?!", "?!"), 1.0));
        assert!(approx(JaccardSimilarity.compare("?!", "..."), 0.0));
    }

    // ---- Factory ----

    #[test]
    fn test_comparator_for_kinds() {
        let lev = comparator_for(ComparatorKind::Levenshtein);
        let jac = comparator_for(ComparatorKind::Jaccard);
        // Word order matters to edit distance but not to token overlap.
        assert!(lev.compare("you are", "are you") < 1.0);
        assert!(approx(jac.compare("you are", "are you"), 1.0));
    }

    #[test]
    fn test_scores_are_in_unit_range() {
        let pairs = [("a", "abcdef"), ("Hello world", "world"), ("", "x")];
        for (a, b) in pairs {
            for cmp in [comparator_for(ComparatorKind::Levenshtein), comparator_for(ComparatorKind::Jaccard)] {
                let s = cmp.compare(a, b);
                assert!((0.0..=1.0).contains(&s), "{} vs {} gave {}", a, b, s);
            }
        }
    }
}

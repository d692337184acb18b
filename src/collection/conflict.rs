//! Conflict Detector: which minus-words a phrase would collide with

use std::collections::HashSet;

use crate::collection::normalize::{normalize_base, split_words, token_key};

/// Base keys of `phrase`'s tokens that are present in `minus_index`.
///
/// Deduplicated, in first-occurrence order. Never cached: the index may
/// change between two calls.
pub fn conflicting_exclusions(
    phrase: &str,
    minus_index: &HashSet<String>,
    strip_plus: bool,
) -> Vec<String> {
    let mut hits: Vec<String> = Vec::new();
    for token in split_words(phrase) {
        let key = normalize_base(token_key(token, strip_plus));
        if key.is_empty() || !minus_index.contains(&key) {
            continue;
        }
        if !hits.contains(&key) {
            hits.push(key);
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_phrase_with_minus_word() {
        let idx = index(&["дешево"]);
        assert_eq!(conflicting_exclusions("купить дешево телефон", &idx, false), vec!["дешево"]);
        assert!(conflicting_exclusions("купить телефон", &idx, false).is_empty());
    }

    #[test]
    fn test_hits_are_deduplicated_and_case_insensitive() {
        let idx = index(&["дешево", "бу"]);
        let hits = conflicting_exclusions("Дешево бу телефон дешево", &idx, false);
        assert_eq!(hits, vec!["дешево", "бу"]);
    }

    #[test]
    fn test_operator_tokens_match_base() {
        let idx = index(&["в"]);
        // `normalize_base` strips the leading run regardless of the setting
        assert_eq!(conflicting_exclusions("купить +в москве", &idx, false), vec!["в"]);
        assert_eq!(conflicting_exclusions("купить +в москве", &idx, true), vec!["в"]);
        assert_eq!(conflicting_exclusions("купить !в москве", &idx, true), vec!["в"]);
    }

    #[test]
    fn test_empty_index() {
        assert!(conflicting_exclusions("купить дешево", &HashSet::new(), false).is_empty());
    }
}

//! Normalizer: canonical forms for words, phrases and minus-words
//!
//! Pure functions only. Every identity key used by the store and the
//! decorations is derived here, so two call sites can never disagree on
//! whether a word is "the same word".

use crate::collection::settings::Settings;

/// Operator markers Wordstat understands and this tool may prepend
const OPERATOR_MARKERS: [char; 2] = ['!', '+'];

/// Strip the leading run of `!`/`+` markers, preserving case
pub fn strip_markers(raw: &str) -> &str {
    raw.trim_start_matches(OPERATOR_MARKERS)
}

/// Base key of a minus-word: markers stripped, lowercased
pub fn normalize_base(raw: &str) -> String {
    strip_markers(raw).to_lowercase()
}

/// Phrase key: whitespace runs collapsed to one space, outer whitespace trimmed.
/// Case is preserved.
pub fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key (and display text) of a token taken from a rendered phrase.
///
/// With `strip_plus` the leading `+` run is removed (`+в` -> `в`); `!` is
/// always kept.
pub fn token_key(raw: &str, strip_plus: bool) -> &str {
    if strip_plus {
        raw.trim_start_matches('+')
    } else {
        raw
    }
}

/// Stored form of a new minus-word: `!` first, then `+`, each at most once
pub fn apply_prefixes(base: &str, settings: &Settings) -> String {
    let mut word = base.to_string();
    if settings.prefix_with_bang && !leading_markers(&word).contains('!') {
        word.insert(0, '!');
    }
    if settings.prefix_with_plus && !leading_markers(&word).contains('+') {
        word.insert(0, '+');
    }
    word
}

fn leading_markers(word: &str) -> &str {
    let stripped = strip_markers(word);
    &word[..word.len() - stripped.len()]
}

/// Whitespace tokenization used for phrases
pub fn split_words(phrase: &str) -> Vec<&str> {
    phrase.split_whitespace().collect()
}

/// Split a pasted batch on newlines, commas and semicolons
pub fn split_batch(input: &str) -> Vec<String> {
    input
        .split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

//! Phrase extractor: best-effort current phrase of a render-tree node
//!
//! Preference order:
//! 1. `words`/`word` query parameter of the node's `href` (the host keeps
//!    links current even after their text was replaced by decorations)
//! 2. raw words recorded on the word-decorations of an already decorated node
//! 3. rendered text with `+`/`−`/`-` glyphs removed and whitespace collapsed
//!
//! An empty string means "no phrase"; callers skip the node.

use url::Url;

use crate::collection::normalize::normalize_phrase;
use crate::decorate::{ATTR_PROCESSED, ATTR_WORD_RAW, CLASS_TOKEN};
use crate::tree::RenderTree;

/// Query parameters that carry the phrase, most specific first
const PHRASE_PARAMS: [&str; 2] = ["words", "word"];

/// Glyphs rendered by the host and by decorations around words
const OPERATOR_GLYPHS: [char; 3] = ['+', '−', '-'];

pub fn current_phrase<T: RenderTree>(tree: &T, node: &T::Node) -> String {
    if let Some(href) = tree.attr(node, "href") {
        let phrase = phrase_from_href(&href, &tree.location());
        if !phrase.is_empty() {
            return phrase;
        }
    }

    let tokens = if tree.attr(node, ATTR_PROCESSED).is_some() {
        tree.query_all(node, &format!(".{}", CLASS_TOKEN))
    } else {
        Vec::new()
    };
    if !tokens.is_empty() {
        let raw: Vec<String> = tokens
            .iter()
            .filter_map(|token| tree.attr(token, ATTR_WORD_RAW))
            .collect();
        return normalize_phrase(&raw.join(" "));
    }

    phrase_from_text(&tree.text(node))
}

/// Phrase carried by a link target, resolved against `base`
pub fn phrase_from_href(href: &str, base: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    let url = match Url::parse(base).and_then(|b| b.join(href)).or_else(|_| Url::parse(href)) {
        Ok(url) => url,
        Err(_) => return String::new(),
    };
    for name in PHRASE_PARAMS {
        let found = url
            .query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.replace('+', " "));
        if let Some(value) = found {
            return value.trim().to_string();
        }
    }
    String::new()
}

/// Visible text with operator glyphs treated as separators
pub fn phrase_from_text(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if OPERATOR_GLYPHS.contains(&c) { ' ' } else { c })
        .collect();
    normalize_phrase(&spaced)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemTree;

    const BASE: &str = "https://wordstat.yandex.ru/?region=all";

    #[test]
    fn test_href_words_param() {
        assert_eq!(
            phrase_from_href("/?words=купить+чехол+gopro", BASE),
            "купить чехол gopro"
        );
        assert_eq!(
            phrase_from_href("https://wordstat.yandex.ru/?region=1&words=%D0%B1%D1%83%20%D1%82%D0%B5%D0%BB%D0%B5%D1%84%D0%BE%D0%BD", BASE),
            "бу телефон"
        );
    }

    #[test]
    fn test_href_word_fallback_and_missing() {
        assert_eq!(phrase_from_href("?word=a%20b", BASE), "a b");
        assert_eq!(phrase_from_href("/search?region=1", BASE), "");
        assert_eq!(phrase_from_href("", BASE), "");
    }

    #[test]
    fn test_text_fallback_strips_glyphs() {
        assert_eq!(phrase_from_text("  купить −  чехол+gopro "), "купить чехол gopro");
        assert_eq!(phrase_from_text("wi-fi роутер"), "wi fi роутер");
    }

    #[test]
    fn test_node_prefers_href() {
        let mut tree = MemTree::new(BASE);
        let root = tree.root();
        let link = tree.element(root, "a", "");
        tree.set_attr(&link, "href", "/?words=купить+бытовку");
        tree.text_node(link, "что-то другое");
        assert_eq!(current_phrase(&tree, &link), "купить бытовку");
    }

    #[test]
    fn test_node_text_when_no_href() {
        let mut tree = MemTree::new(BASE);
        let root = tree.root();
        let span = tree.element(root, "span", "");
        tree.text_node(span, "купить\n  бытовку");
        assert_eq!(current_phrase(&tree, &span), "купить бытовку");
    }

    #[test]
    fn test_decorated_node_reads_raw_words() {
        let mut tree = MemTree::new(BASE);
        let root = tree.root();
        let span = tree.element(root, "span", "");
        tree.set_attr(&span, ATTR_PROCESSED, "1");
        for word in ["+в", "москве"] {
            let token = tree.element(span, "span", CLASS_TOKEN);
            tree.set_attr(&token, ATTR_WORD_RAW, word);
            tree.text_node(token, "+ ");
        }
        assert_eq!(current_phrase(&tree, &span), "+в москве");
    }
}

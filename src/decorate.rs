//! Decoration Engine: per-word and per-phrase controls inside result phrases
//!
//! # Markup
//! ```text
//! <a data-wc-processed="1" data-wc-phrase="купить чехол">
//!   <span class="wc-phrase-actions" data-wc-phrase="…">
//!     <span class="wc-phrase-warn">⚠️</span><button class="wc-phrase-btn">+</button>
//!   </span>
//!   <span class="wc-token" data-wc-word-raw="купить" data-wc-word-key="купить">
//!     <button class="wc-token-btn">+</button><span class="wc-token-text">купить</span>
//!   </span> …
//! </a>
//! ```
//!
//! Building is skipped when the node's processed mark already equals its
//! current phrase. Refreshing writes only values that differ from what the
//! tree holds, so a refresh over unchanged state produces no mutations.

use serde::{Deserialize, Serialize};

use crate::collection::normalize::{normalize_phrase, split_words, token_key};
use crate::collection::settings::Mode;
use crate::collection::store::CollectionStore;
use crate::extract;
use crate::tree::RenderTree;

// =============================================================================
// Markup vocabulary
// =============================================================================

pub const CLASS_TOKEN: &str = "wc-token";
pub const CLASS_TOKEN_BUTTON: &str = "wc-token-btn";
pub const CLASS_TOKEN_TEXT: &str = "wc-token-text";
pub const CLASS_TOKEN_SELECTED: &str = "wc-token--selected";

pub const CLASS_PHRASE_ACTIONS: &str = "wc-phrase-actions";
pub const CLASS_PHRASE_WARN: &str = "wc-phrase-warn";
pub const CLASS_PHRASE_BUTTON: &str = "wc-phrase-btn";
pub const CLASS_PHRASE_ADDED: &str = "wc-phrase-actions--added";

pub const ATTR_PROCESSED: &str = "data-wc-processed";
pub const ATTR_PHRASE: &str = "data-wc-phrase";
pub const ATTR_WORD_RAW: &str = "data-wc-word-raw";
pub const ATTR_WORD_KEY: &str = "data-wc-word-key";

/// Any node that belongs to a decoration rather than to the host
pub const DECORATION_SELECTOR: &str = ".wc-token, .wc-phrase-actions";

const GLYPH_ADD: &str = "+";
const GLYPH_REMOVE: &str = "−";
const GLYPH_WARN: &str = "⚠️";

const TITLE_ADD_MINUS: &str = "Добавить в минус-слова";
const TITLE_REMOVE_MINUS: &str = "Удалить из минус-слов";
const TITLE_ADD_PHRASE: &str = "Добавить ключевую фразу";
const TITLE_REMOVE_PHRASE: &str = "Удалить ключевую фразу";
const TITLE_SWITCH_TO_PHRASES: &str = "Переключись на ключевые фразы";

// =============================================================================
// Types
// =============================================================================

/// Read-only view a refresh needs
#[derive(Clone, Copy)]
pub struct DecorationContext<'a> {
    pub store: &'a CollectionStore,
    /// Stored mode, or exclusions while the hotkey override is held
    pub effective_mode: Mode,
}

impl<'a> DecorationContext<'a> {
    pub fn new(store: &'a CollectionStore, effective_mode: Mode) -> Self {
        Self { store, effective_mode }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Extractor found nothing
    NoPhrase,
    /// Fewer than two words
    SingleWord,
    /// The host refused to create a decoration element
    BuildFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DecorateOutcome {
    /// Processed mark matches; nothing written
    Unchanged,
    Decorated { words: usize },
    Skipped { reason: SkipReason },
}

// =============================================================================
// Building
// =============================================================================

/// Decorate one phrase-bearing node, or leave it alone if it is already
/// decorated for its current phrase.
pub fn decorate_phrase_node<T: RenderTree>(
    tree: &mut T,
    node: &T::Node,
    ctx: &DecorationContext<'_>,
) -> DecorateOutcome {
    let phrase = extract::current_phrase(tree, node);
    if phrase.is_empty() {
        return DecorateOutcome::Skipped { reason: SkipReason::NoPhrase };
    }

    if is_current(tree, node, &phrase) {
        return DecorateOutcome::Unchanged;
    }

    let words: Vec<String> = split_words(&phrase).into_iter().map(str::to_string).collect();
    if words.len() < 2 {
        return DecorateOutcome::Skipped { reason: SkipReason::SingleWord };
    }

    tree.set_attr(node, ATTR_PROCESSED, "1");
    tree.set_attr(node, ATTR_PHRASE, &phrase);
    tree.clear(node);

    let Some(actions) = build_phrase_decoration(tree, node, &phrase) else {
        return DecorateOutcome::Skipped { reason: SkipReason::BuildFailed };
    };
    tree.append_text(node, " ");

    for (i, word) in words.iter().enumerate() {
        let Some(token) = build_word_decoration(tree, node, word) else {
            return DecorateOutcome::Skipped { reason: SkipReason::BuildFailed };
        };
        if i + 1 < words.len() {
            tree.append_text(node, " ");
        }
        refresh_word_decoration(tree, &token, ctx);
    }
    refresh_phrase_decoration(tree, &actions, ctx);

    DecorateOutcome::Decorated { words: words.len() }
}

fn is_current<T: RenderTree>(tree: &T, node: &T::Node, phrase: &str) -> bool {
    tree.attr(node, ATTR_PROCESSED).as_deref() == Some("1")
        && tree.attr(node, ATTR_PHRASE).as_deref() == Some(phrase)
        && !tree.query_all(node, &format!(".{}", CLASS_TOKEN)).is_empty()
}

fn build_phrase_decoration<T: RenderTree>(
    tree: &mut T,
    parent: &T::Node,
    phrase: &str,
) -> Option<T::Node> {
    let wrap = tree.append_element(parent, "span", CLASS_PHRASE_ACTIONS)?;
    tree.set_attr(&wrap, ATTR_PHRASE, phrase);

    let warn = tree.append_element(&wrap, "span", CLASS_PHRASE_WARN)?;
    tree.set_text(&warn, GLYPH_WARN);
    tree.set_attr(&warn, "hidden", "");

    let button = tree.append_element(&wrap, "button", CLASS_PHRASE_BUTTON)?;
    tree.set_attr(&button, "type", "button");
    Some(wrap)
}

fn build_word_decoration<T: RenderTree>(
    tree: &mut T,
    parent: &T::Node,
    raw: &str,
) -> Option<T::Node> {
    let wrap = tree.append_element(parent, "span", CLASS_TOKEN)?;
    tree.set_attr(&wrap, ATTR_WORD_RAW, raw);

    let button = tree.append_element(&wrap, "button", CLASS_TOKEN_BUTTON)?;
    tree.set_attr(&button, "type", "button");
    tree.append_element(&wrap, "span", CLASS_TOKEN_TEXT)?;
    Some(wrap)
}

// =============================================================================
// Refreshing
// =============================================================================

/// Sync one word-decoration with the minus-words list and the effective mode
pub fn refresh_word_decoration<T: RenderTree>(
    tree: &mut T,
    token: &T::Node,
    ctx: &DecorationContext<'_>,
) {
    let raw = tree.attr(token, ATTR_WORD_RAW).unwrap_or_default();
    let key = token_key(&raw, ctx.store.settings().strip_leading_plus_in_tokens).to_string();
    write_attr(tree, token, ATTR_WORD_KEY, &key);

    if let Some(text) = child(tree, token, CLASS_TOKEN_TEXT) {
        write_text(tree, &text, &key);
    }
    let Some(button) = child(tree, token, CLASS_TOKEN_BUTTON) else {
        return;
    };

    if ctx.effective_mode != Mode::Exclusions {
        set_hidden(tree, &button, true);
        write_class(tree, token, CLASS_TOKEN_SELECTED, false);
        return;
    }

    set_hidden(tree, &button, false);
    let selected = ctx.store.has_exclusion(&key);
    write_class(tree, token, CLASS_TOKEN_SELECTED, selected);
    if selected {
        write_text(tree, &button, GLYPH_REMOVE);
        write_attr(tree, &button, "title", TITLE_REMOVE_MINUS);
    } else {
        write_text(tree, &button, GLYPH_ADD);
        write_attr(tree, &button, "title", TITLE_ADD_MINUS);
    }
}

/// Sync one phrase-decoration: conflict warning plus add/remove control
pub fn refresh_phrase_decoration<T: RenderTree>(
    tree: &mut T,
    wrap: &T::Node,
    ctx: &DecorationContext<'_>,
) {
    let phrase = tree.attr(wrap, ATTR_PHRASE).unwrap_or_default();
    let (Some(warn), Some(button)) = (
        child(tree, wrap, CLASS_PHRASE_WARN),
        child(tree, wrap, CLASS_PHRASE_BUTTON),
    ) else {
        return;
    };

    let hits = ctx.store.conflicting_exclusions(&phrase);
    set_hidden(tree, &warn, hits.is_empty());
    match conflict_tooltip(&hits) {
        Some(title) => write_attr(tree, &warn, "title", &title),
        None => drop_attr(tree, &warn, "title"),
    }

    if ctx.store.settings().active_mode != Mode::Phrases {
        write_text(tree, &button, GLYPH_ADD);
        write_attr(tree, &button, "disabled", "");
        write_attr(tree, &button, "title", TITLE_SWITCH_TO_PHRASES);
        write_class(tree, wrap, CLASS_PHRASE_ADDED, false);
        return;
    }

    drop_attr(tree, &button, "disabled");
    let member = ctx.store.has_phrase(&normalize_phrase(&phrase));
    write_class(tree, wrap, CLASS_PHRASE_ADDED, member);
    if member {
        write_text(tree, &button, GLYPH_REMOVE);
        write_attr(tree, &button, "title", TITLE_REMOVE_PHRASE);
    } else {
        write_text(tree, &button, GLYPH_ADD);
        write_attr(tree, &button, "title", TITLE_ADD_PHRASE);
    }
}

/// Refresh every live decoration in the document. Returns how many.
pub fn refresh_all<T: RenderTree>(tree: &mut T, ctx: &DecorationContext<'_>) -> usize {
    let tokens = tree.query_document(&format!(".{}", CLASS_TOKEN));
    for token in &tokens {
        refresh_word_decoration(tree, token, ctx);
    }
    let phrases = tree.query_document(&format!(".{}", CLASS_PHRASE_ACTIONS));
    for wrap in &phrases {
        refresh_phrase_decoration(tree, wrap, ctx);
    }
    tokens.len() + phrases.len()
}

/// Word-decoration refresh only (hotkey and strip-plus changes)
pub fn refresh_word_decorations<T: RenderTree>(tree: &mut T, ctx: &DecorationContext<'_>) -> usize {
    let tokens = tree.query_document(&format!(".{}", CLASS_TOKEN));
    for token in &tokens {
        refresh_word_decoration(tree, token, ctx);
    }
    tokens.len()
}

/// Tooltip for the conflict warning, `None` when there are no hits
pub fn conflict_tooltip(hits: &[String]) -> Option<String> {
    match hits.len() {
        0 => None,
        1 => Some(format!("Фраза содержит минус-слово: {}", hits[0])),
        _ => Some(format!("Фраза содержит минус-слова: {}", hits.join(", "))),
    }
}

// =============================================================================
// Write-if-changed helpers
// =============================================================================

fn child<T: RenderTree>(tree: &T, parent: &T::Node, class: &str) -> Option<T::Node> {
    tree.query_all(parent, &format!(".{}", class)).into_iter().next()
}

fn write_text<T: RenderTree>(tree: &mut T, node: &T::Node, text: &str) {
    if tree.text(node) != text {
        tree.set_text(node, text);
    }
}

fn write_attr<T: RenderTree>(tree: &mut T, node: &T::Node, name: &str, value: &str) {
    if tree.attr(node, name).as_deref() != Some(value) {
        tree.set_attr(node, name, value);
    }
}

fn drop_attr<T: RenderTree>(tree: &mut T, node: &T::Node, name: &str) {
    if tree.attr(node, name).is_some() {
        tree.remove_attr(node, name);
    }
}

fn write_class<T: RenderTree>(tree: &mut T, node: &T::Node, class: &str, on: bool) {
    if tree.has_class(node, class) != on {
        tree.toggle_class(node, class, on);
    }
}

fn set_hidden<T: RenderTree>(tree: &mut T, node: &T::Node, hidden: bool) {
    if hidden {
        write_attr(tree, node, "hidden", "");
    } else {
        drop_attr(tree, node, "hidden");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MemTree, NodeId};

    const PAGE: &str = "https://wordstat.yandex.ru/?words=gopro";

    fn page_with_link(text: &str) -> (MemTree, NodeId) {
        let mut tree = MemTree::new(PAGE);
        let root = tree.root();
        let link = tree.element(root, "a", "");
        tree.text_node(link, text);
        tree.take_mutations();
        (tree, link)
    }

    fn store_with(phrases: &[&str], minus: &[&str]) -> CollectionStore {
        let mut store = CollectionStore::new();
        for p in phrases {
            store.add_phrase(p).unwrap();
        }
        for m in minus {
            store.add_exclusion(m).unwrap();
        }
        store
    }

    fn tokens(tree: &MemTree) -> Vec<NodeId> {
        tree.query_document(".wc-token")
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    #[test]
    fn test_decorates_one_phrase_control_and_one_token_per_word() {
        let (mut tree, link) = page_with_link("купить чехол gopro недорого");
        let store = CollectionStore::new();
        let ctx = DecorationContext::new(&store, Mode::Phrases);

        let outcome = decorate_phrase_node(&mut tree, &link, &ctx);
        assert_eq!(outcome, DecorateOutcome::Decorated { words: 4 });

        let children = tree.children(link);
        let first = children[0];
        assert!(tree.has_class(&first, CLASS_PHRASE_ACTIONS), "phrase control comes first");
        assert_eq!(tree.query_document(".wc-phrase-actions").len(), 1);

        let raws: Vec<String> = tokens(&tree)
            .iter()
            .map(|t| tree.attr(t, ATTR_WORD_RAW).unwrap())
            .collect();
        assert_eq!(raws, vec!["купить", "чехол", "gopro", "недорого"]);
        assert_eq!(tree.attr(&link, ATTR_PHRASE).as_deref(), Some("купить чехол gopro недорого"));
    }

    #[test]
    fn test_second_decoration_is_a_no_op() {
        let (mut tree, link) = page_with_link("купить чехол gopro");
        let store = CollectionStore::new();
        let ctx = DecorationContext::new(&store, Mode::Phrases);

        decorate_phrase_node(&mut tree, &link, &ctx);
        tree.take_mutations();

        assert_eq!(decorate_phrase_node(&mut tree, &link, &ctx), DecorateOutcome::Unchanged);
        assert_eq!(tree.mutation_count(), 0);
        assert_eq!(tokens(&tree).len(), 3);
    }

    #[test]
    fn test_phrase_change_rebuilds() {
        let (mut tree, link) = page_with_link("купить чехол");
        let store = CollectionStore::new();
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        decorate_phrase_node(&mut tree, &link, &ctx);

        // Host re-renders the link with a new phrase
        tree.set_text(&link, "купить аквабокс 45м");
        let outcome = decorate_phrase_node(&mut tree, &link, &ctx);
        assert_eq!(outcome, DecorateOutcome::Decorated { words: 3 });
        assert_eq!(tokens(&tree).len(), 3);
    }

    #[test]
    fn test_single_word_is_not_decorated() {
        let (mut tree, link) = page_with_link("Wordstat");
        let store = CollectionStore::new();
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        assert_eq!(
            decorate_phrase_node(&mut tree, &link, &ctx),
            DecorateOutcome::Skipped { reason: SkipReason::SingleWord }
        );
        assert_eq!(tree.mutation_count(), 0);
    }

    #[test]
    fn test_empty_node_is_skipped() {
        let (mut tree, link) = page_with_link("  ");
        let store = CollectionStore::new();
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        assert_eq!(
            decorate_phrase_node(&mut tree, &link, &ctx),
            DecorateOutcome::Skipped { reason: SkipReason::NoPhrase }
        );
    }

    // -------------------------------------------------------------------------
    // Word refresh
    // -------------------------------------------------------------------------

    #[test]
    fn test_word_controls_hidden_outside_exclusions_mode() {
        let (mut tree, link) = page_with_link("купить дешево");
        let store = store_with(&[], &["дешево"]);
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        decorate_phrase_node(&mut tree, &link, &ctx);

        for token in tokens(&tree) {
            let button = tree.query_all(&token, ".wc-token-btn")[0];
            assert!(tree.attr(&button, "hidden").is_some());
            assert!(!tree.has_class(&token, CLASS_TOKEN_SELECTED));
        }
    }

    #[test]
    fn test_word_selected_in_exclusions_mode() {
        let (mut tree, link) = page_with_link("купить Дешево");
        let store = store_with(&[], &["!дешево"]);
        let ctx = DecorationContext::new(&store, Mode::Exclusions);
        decorate_phrase_node(&mut tree, &link, &ctx);

        let toks = tokens(&tree);
        assert!(!tree.has_class(&toks[0], CLASS_TOKEN_SELECTED));
        assert!(tree.has_class(&toks[1], CLASS_TOKEN_SELECTED));
        let button = tree.query_all(&toks[1], ".wc-token-btn")[0];
        assert_eq!(tree.text(&button), GLYPH_REMOVE);
        assert_eq!(tree.attr(&button, "title").as_deref(), Some(TITLE_REMOVE_MINUS));
        assert!(tree.attr(&button, "hidden").is_none());
    }

    #[test]
    fn test_strip_plus_changes_display_and_key() {
        let mut tree = MemTree::new(PAGE);
        let root = tree.root();
        let token = tree.element(root, "span", CLASS_TOKEN);
        tree.set_attr(&token, ATTR_WORD_RAW, "+в");
        tree.element(token, "button", CLASS_TOKEN_BUTTON);
        let text = tree.element(token, "span", CLASS_TOKEN_TEXT);

        let mut store = CollectionStore::new();
        refresh_word_decorations(&mut tree, &DecorationContext::new(&store, Mode::Exclusions));
        assert_eq!(tree.attr(&token, ATTR_WORD_KEY).as_deref(), Some("+в"));
        assert_eq!(tree.text(&text), "+в");

        store.set_toggle(crate::collection::SettingToggle::StripLeadingPlus, true);
        refresh_word_decorations(&mut tree, &DecorationContext::new(&store, Mode::Exclusions));
        assert_eq!(tree.attr(&token, ATTR_WORD_KEY).as_deref(), Some("в"));
        assert_eq!(tree.text(&text), "в");
    }

    // -------------------------------------------------------------------------
    // Phrase refresh
    // -------------------------------------------------------------------------

    #[test]
    fn test_warning_lists_conflicts() {
        let (mut tree, link) = page_with_link("купить чехол gopro недорого");
        let store = store_with(&[], &["недорого"]);
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        decorate_phrase_node(&mut tree, &link, &ctx);

        let warn = tree.query_document(".wc-phrase-warn")[0];
        assert!(tree.attr(&warn, "hidden").is_none());
        assert!(tree.attr(&warn, "title").unwrap().contains("недорого"));
    }

    #[test]
    fn test_phrase_button_reflects_membership_and_mode() {
        let (mut tree, link) = page_with_link("купить чехол");
        let store = store_with(&["купить чехол"], &[]);
        let ctx = DecorationContext::new(&store, Mode::Phrases);
        decorate_phrase_node(&mut tree, &link, &ctx);

        let wrap = tree.query_document(".wc-phrase-actions")[0];
        let button = tree.query_document(".wc-phrase-btn")[0];
        assert_eq!(tree.text(&button), GLYPH_REMOVE);
        assert!(tree.has_class(&wrap, CLASS_PHRASE_ADDED));
        assert!(tree.attr(&button, "disabled").is_none());

        let mut store = store;
        store.set_mode(Mode::Exclusions);
        let ctx = DecorationContext::new(&store, Mode::Exclusions);
        refresh_all(&mut tree, &ctx);
        assert!(tree.attr(&button, "disabled").is_some());
        assert_eq!(tree.attr(&button, "title").as_deref(), Some(TITLE_SWITCH_TO_PHRASES));
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let (mut tree, link) = page_with_link("купить дешево чехол");
        let store = store_with(&["купить дешево чехол"], &["дешево"]);
        let ctx = DecorationContext::new(&store, Mode::Exclusions);
        decorate_phrase_node(&mut tree, &link, &ctx);
        tree.take_mutations();

        assert_eq!(refresh_all(&mut tree, &ctx), 4);
        assert_eq!(tree.mutation_count(), 0);
    }

    #[test]
    fn test_tooltip_text() {
        assert_eq!(conflict_tooltip(&[]), None);
        assert_eq!(
            conflict_tooltip(&["бу".to_string(), "даром".to_string()]).unwrap(),
            "Фраза содержит минус-слова: бу, даром"
        );
    }
}

//! Collector: coordinator for scanning, decoration and collection edits
//!
//! # Design Principles
//! 1. State machine: Booting → Ready. Nothing is scanned before the storage
//!    snapshot has been hydrated.
//! 2. Every collection or settings change is followed by a refresh of the live
//!    decorations. Refresh writes only differences, so the observer → rescan →
//!    refresh loop settles after one round.
//! 3. The tree is passed in per call; the collector never owns the page.
//!
//! # Usage
//! ```rust,ignore
//! let mut collector = Collector::new(CollectorConfig::default());
//! collector.hydrate(&mut tree, &snapshot, now);
//! collector.on_mutations(&records, now);
//! if let Some(report) = collector.tick(&mut tree, now) { /* ... */ }
//! ```

use serde::{Deserialize, Serialize};

use crate::collection::normalize::{normalize_base, normalize_phrase, split_words, token_key};
use crate::collection::persist::{StorageSnapshot, StorageWrite};
use crate::collection::settings::Mode;
use crate::collection::store::CollectionStore;
use crate::config::CollectorConfig;
use crate::decorate::{
    self, DecorateOutcome, DecorationContext, ATTR_PHRASE, ATTR_WORD_RAW, CLASS_PHRASE_ACTIONS,
    CLASS_PHRASE_BUTTON, CLASS_TOKEN, CLASS_TOKEN_BUTTON, DECORATION_SELECTOR,
};
use crate::error::CollectorError;
use crate::extract;
use crate::gate::{ConfirmationGate, ConflictPrompt, Decision};
use crate::logging;
use crate::panel::WidgetState;
use crate::scheduler::{ScanScheduler, ScanTrigger};
use crate::tree::{MutationRecord, RenderTree};

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Waiting for the storage snapshot
    Booting,
    /// Hydrated and watching the page
    Ready,
}

// =============================================================================
// Outputs
// =============================================================================

/// Transient message for the notice surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    Added,
    Removed,
    AlreadyAdded,
    Cleared,
    Copied,
    Saved,
    Empty,
    SwitchToPhrases,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Added => "Добавлено",
            Notice::Removed => "Удалено",
            Notice::AlreadyAdded => "Уже добавлено",
            Notice::Cleared => "Очищено",
            Notice::Copied => "Скопировано",
            Notice::Saved => "Сохранено",
            Notice::Empty => "Пусто",
            Notice::SwitchToPhrases => "Переключись на ключевые фразы",
        }
    }

    /// Notice for a failed add; empty input stays silent
    pub fn for_error(err: &CollectorError) -> Option<Notice> {
        match err {
            CollectorError::Duplicate(_) => Some(Notice::AlreadyAdded),
            _ => None,
        }
    }
}

/// Result of a click on a decoration control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ClickOutcome {
    /// Control inactive in the current mode, or nothing to do
    Ignored,
    /// Collections changed without a message
    Updated,
    Notice(Notice),
    /// The confirmation surface must ask; answer with `resolve_confirmation`
    Confirm(ConflictPrompt),
}

/// Counts for one rescan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub trigger: Option<ScanTrigger>,
    pub candidates: usize,
    pub decorated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Live decorations refreshed after the pass
    pub refreshed: usize,
    pub elapsed_us: u64,
}

// =============================================================================
// Collector
// =============================================================================

#[derive(Debug)]
pub struct Collector {
    pub(crate) config: CollectorConfig,
    pub(crate) store: CollectionStore,
    pub(crate) widget: WidgetState,
    gate: ConfirmationGate,
    scheduler: ScanScheduler,
    lifecycle: Lifecycle,
    hotkey_held: bool,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        let scheduler = ScanScheduler::new(&config);
        Self {
            config,
            store: CollectionStore::new(),
            widget: WidgetState::default(),
            gate: ConfirmationGate::new(),
            scheduler,
            lifecycle: Lifecycle::Booting,
            hotkey_held: false,
        }
    }

    /// Load the startup snapshot and start watching the page.
    /// The first scan runs immediately; its report is returned.
    pub fn hydrate<T: RenderTree>(
        &mut self,
        tree: &mut T,
        snapshot: &StorageSnapshot,
        now: u64,
    ) -> Option<ScanReport> {
        if self.store.hydrate(snapshot) {
            logging::debug("[Collector] migrated legacy word list to minus-words");
        }
        self.widget.load(snapshot);

        if self.lifecycle == Lifecycle::Booting {
            self.lifecycle = Lifecycle::Ready;
            self.scheduler.install(&tree.location(), now);
        }
        self.tick(tree, now)
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn state_name(&self) -> &'static str {
        match self.lifecycle {
            Lifecycle::Booting => "booting",
            Lifecycle::Ready => "ready",
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn hotkey_held(&self) -> bool {
        self.hotkey_held
    }

    /// Exclusions while the hotkey override is held in phrases mode,
    /// otherwise the stored mode
    pub fn effective_mode(&self) -> Mode {
        let settings = self.store.settings();
        if settings.shift_hotkey_enabled && settings.active_mode == Mode::Phrases && self.hotkey_held {
            Mode::Exclusions
        } else {
            settings.active_mode
        }
    }

    fn context(&self) -> DecorationContext<'_> {
        DecorationContext::new(&self.store, self.effective_mode())
    }

    // -------------------------------------------------------------------------
    // Scanning
    // -------------------------------------------------------------------------

    /// Decorate every candidate under the results container, then refresh all
    /// live decorations. `None` while booting.
    pub fn scan<T: RenderTree>(&mut self, tree: &mut T) -> Option<ScanReport> {
        if !self.is_ready() {
            return None;
        }
        let start = instant::Instant::now();
        let mut report = ScanReport::default();

        if let Some(root) = tree.query_first(&self.config.results_selector) {
            let candidates = tree.query_all(&root, &self.config.candidate_selector);
            report.candidates = candidates.len();

            let ctx = self.context();
            for node in &candidates {
                if !self.is_candidate(tree, node) {
                    report.skipped += 1;
                    continue;
                }
                match decorate::decorate_phrase_node(tree, node, &ctx) {
                    DecorateOutcome::Decorated { .. } => report.decorated += 1,
                    DecorateOutcome::Unchanged => report.unchanged += 1,
                    DecorateOutcome::Skipped { .. } => report.skipped += 1,
                }
            }
        }

        report.refreshed = self.refresh_all(tree);
        report.elapsed_us = start.elapsed().as_micros() as u64;

        if report.decorated > 0 {
            logging::debug(&format!(
                "[Collector] decorated {} of {} candidates in {}us",
                report.decorated, report.candidates, report.elapsed_us
            ));
        }
        Some(report)
    }

    fn is_candidate<T: RenderTree>(&self, tree: &T, node: &T::Node) -> bool {
        if tree.closest(node, &self.config.widget_selector).is_some()
            || tree.closest(node, DECORATION_SELECTOR).is_some()
            // detached by an earlier rebuild in the same pass
            || tree.closest(node, &self.config.results_selector).is_none()
        {
            return false;
        }

        let phrase = extract::current_phrase(tree, node);
        !phrase.is_empty()
            && phrase.chars().count() <= self.config.max_phrase_chars
            && phrase.chars().any(char::is_whitespace)
            && split_words(&phrase).len() >= 2
    }

    /// Refresh every live decoration. Returns how many were visited.
    pub fn refresh_all<T: RenderTree>(&self, tree: &mut T) -> usize {
        decorate::refresh_all(tree, &self.context())
    }

    pub(crate) fn refresh_words<T: RenderTree>(&self, tree: &mut T) -> usize {
        decorate::refresh_word_decorations(tree, &self.context())
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Feed a MutationObserver batch. Returns whether a rescan got scheduled.
    pub fn on_mutations(&mut self, records: &[MutationRecord], now: u64) -> bool {
        self.scheduler.on_mutations(records, now)
    }

    /// History hook fired (pushState, replaceState, popstate)
    pub fn on_location(&mut self, location: &str, now: u64) -> bool {
        self.scheduler.check_location(location, now)
    }

    pub fn on_search_submit(&mut self, now: u64) {
        self.scheduler.on_search_submit(now);
    }

    /// Timer callback: run the location poll and any due rescan
    pub fn tick<T: RenderTree>(&mut self, tree: &mut T, now: u64) -> Option<ScanReport> {
        if !self.is_ready() {
            return None;
        }
        if self.scheduler.poll_due(now) {
            self.scheduler.poll(&tree.location(), now);
        }
        let trigger = self.scheduler.take_due(now)?;
        let mut report = self.scan(tree)?;
        report.trigger = Some(trigger);
        Some(report)
    }

    pub fn next_wakeup(&self) -> Option<u64> {
        self.scheduler.next_wakeup()
    }

    // -------------------------------------------------------------------------
    // Hotkey
    // -------------------------------------------------------------------------

    /// Hotkey pressed or released (window blur counts as release).
    /// Pressing arms the override only when enabled and in phrases mode.
    pub fn set_hotkey_held<T: RenderTree>(&mut self, tree: &mut T, held: bool) -> bool {
        if held == self.hotkey_held {
            return false;
        }
        if held {
            let settings = self.store.settings();
            if !settings.shift_hotkey_enabled || settings.active_mode != Mode::Phrases {
                return false;
            }
        }
        self.hotkey_held = held;
        self.refresh_words(tree);
        true
    }

    pub(crate) fn release_hotkey(&mut self) {
        self.hotkey_held = false;
    }

    // -------------------------------------------------------------------------
    // Decoration clicks
    // -------------------------------------------------------------------------

    /// Toggle a token's minus-word membership. Only active in exclusions mode.
    pub fn click_word<T: RenderTree>(&mut self, tree: &mut T, raw: &str) -> ClickOutcome {
        if self.effective_mode() != Mode::Exclusions {
            return ClickOutcome::Ignored;
        }
        let key = token_key(raw, self.store.settings().strip_leading_plus_in_tokens);
        let base = normalize_base(key);
        if base.is_empty() {
            return ClickOutcome::Ignored;
        }

        let outcome = if self.store.has_exclusion(&base) {
            self.store.remove_exclusion_by_base(&base);
            ClickOutcome::Updated
        } else {
            match self.store.add_exclusion(&base) {
                Ok(()) => ClickOutcome::Updated,
                Err(e) => Notice::for_error(&e).map_or(ClickOutcome::Ignored, ClickOutcome::Notice),
            }
        };
        self.refresh_all(tree);
        outcome
    }

    /// Add or remove a phrase. Conflicting adds go through the gate unless
    /// the prompt is suppressed.
    pub fn click_phrase<T: RenderTree>(&mut self, tree: &mut T, phrase: &str) -> ClickOutcome {
        if self.store.settings().active_mode != Mode::Phrases {
            return ClickOutcome::Notice(Notice::SwitchToPhrases);
        }
        let key = normalize_phrase(phrase);
        if key.is_empty() {
            return ClickOutcome::Ignored;
        }

        if self.store.has_phrase(&key) {
            self.store.remove_phrase(&key);
            self.refresh_all(tree);
            return ClickOutcome::Notice(Notice::Removed);
        }

        let hits = self.store.conflicting_exclusions(&key);
        if !hits.is_empty() && !self.store.settings().suppress_conflict_prompt {
            return match self.gate.open(key, hits) {
                Ok(prompt) => ClickOutcome::Confirm(prompt.clone()),
                Err(e) => {
                    logging::warn(&format!("[Collector] {}", e));
                    ClickOutcome::Ignored
                }
            };
        }

        let outcome = self.add_phrase_with_notice(&key);
        self.refresh_all(tree);
        outcome
    }

    /// Answer from the confirmation surface
    pub fn resolve_confirmation<T: RenderTree>(
        &mut self,
        tree: &mut T,
        decision: Decision,
    ) -> ClickOutcome {
        let Some(resolution) = self.gate.resolve(decision) else {
            return ClickOutcome::Ignored;
        };
        if resolution.suppress_future {
            self.store.set_suppress_conflict_prompt(true);
        }
        let outcome = if resolution.confirmed {
            self.add_phrase_with_notice(&resolution.phrase)
        } else {
            ClickOutcome::Ignored
        };
        self.refresh_all(tree);
        outcome
    }

    /// Route a click on any element inside a decoration control
    pub fn click_target<T: RenderTree>(&mut self, tree: &mut T, target: &T::Node) -> ClickOutcome {
        let token_button = format!(".{}", CLASS_TOKEN_BUTTON);
        let phrase_button = format!(".{}", CLASS_PHRASE_BUTTON);

        if tree.closest(target, &token_button).is_some() {
            let raw = tree
                .closest(target, &format!(".{}", CLASS_TOKEN))
                .and_then(|token| tree.attr(&token, ATTR_WORD_RAW))
                .unwrap_or_default();
            return self.click_word(tree, &raw);
        }
        if tree.closest(target, &phrase_button).is_some() {
            let phrase = tree
                .closest(target, &format!(".{}", CLASS_PHRASE_ACTIONS))
                .and_then(|wrap| tree.attr(&wrap, ATTR_PHRASE))
                .unwrap_or_default();
            return self.click_phrase(tree, &phrase);
        }
        ClickOutcome::Ignored
    }

    fn add_phrase_with_notice(&mut self, key: &str) -> ClickOutcome {
        match self.store.add_phrase(key) {
            Ok(()) => ClickOutcome::Notice(Notice::Added),
            Err(e) => Notice::for_error(&e).map_or(ClickOutcome::Ignored, ClickOutcome::Notice),
        }
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Drain pending storage writes (collections, settings, widget)
    pub fn take_writes(&mut self) -> Vec<StorageWrite> {
        let mut writes = self.store.take_writes();
        writes.extend(self.widget.take_writes());
        writes
    }
}

// =============================================================================
// Tests
// =============================================================================

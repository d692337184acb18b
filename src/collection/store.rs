//! Collection Store: the phrases and minus-words lists
//!
//! # Invariants
//! - Every list mutation rebuilds its derived index before returning, so a
//!   reader can never observe an index that disagrees with its list.
//! - Each effective mutation queues exactly one storage write for the list
//!   it touched and bumps `revision`, the signal for a UI refresh.
//! - Phrases are unique by `normalize_phrase`, minus-words by `normalize_base`.

use serde_json::json;
use std::collections::{HashMap, HashSet};

use crate::collection::conflict;
use crate::collection::normalize::{apply_prefixes, normalize_base, normalize_phrase, strip_markers};
use crate::collection::persist::{
    StorageSnapshot, StorageWrite, KEY_MINUS, KEY_PHRASES, KEY_SETTINGS,
};
use crate::collection::settings::{Mode, SettingToggle, Settings};
use crate::error::{CollectorError, Result};
use crate::logging;

#[derive(Debug, Default)]
pub struct CollectionStore {
    phrases: Vec<String>,
    minus: Vec<String>,

    /// normalized phrase
    phrase_index: HashSet<String>,
    /// base key (no markers, lowercase)
    minus_index: HashSet<String>,
    /// base key -> exact stored form
    minus_to_stored: HashMap<String, String>,

    settings: Settings,

    outbox: Vec<StorageWrite>,
    revision: u64,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the startup snapshot, replacing all in-memory state.
    ///
    /// If the legacy single list exists and there are no minus-words yet, the
    /// legacy list becomes the minus-words list and is written under the new
    /// key. Returns whether that migration happened.
    pub fn hydrate(&mut self, snapshot: &StorageSnapshot) -> bool {
        self.phrases = snapshot.phrases.clone();
        self.minus = snapshot.minus.clone();
        self.settings = snapshot.settings.clone();

        let migrated = self.minus.is_empty() && !snapshot.legacy_words.is_empty();
        if migrated {
            logging::debug(&format!(
                "[CollectionStore] migrating {} legacy words to minus-words",
                snapshot.legacy_words.len()
            ));
            self.minus = snapshot.legacy_words.clone();
        }
        let collapsed = self.collapse_duplicate_minus();
        if migrated || collapsed {
            self.save_minus();
        }

        self.rebuild_phrase_index();
        self.rebuild_minus_index();
        self.revision += 1;
        migrated
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn exclusions(&self) -> &[String] {
        &self.minus
    }

    /// The list the given mode edits
    pub fn list(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Phrases => &self.phrases,
            Mode::Exclusions => &self.minus,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_phrase(&self, text: &str) -> bool {
        let key = normalize_phrase(text);
        !key.is_empty() && self.phrase_index.contains(&key)
    }

    pub fn has_exclusion(&self, raw: &str) -> bool {
        let key = normalize_base(raw);
        !key.is_empty() && self.minus_index.contains(&key)
    }

    /// Exact stored form of a minus-word, markers included
    pub fn stored_exclusion(&self, raw: &str) -> Option<&str> {
        self.minus_to_stored.get(&normalize_base(raw)).map(String::as_str)
    }

    /// Minus-words present in `phrase`, honoring the strip-plus setting
    pub fn conflicting_exclusions(&self, phrase: &str) -> Vec<String> {
        conflict::conflicting_exclusions(
            phrase,
            &self.minus_index,
            self.settings.strip_leading_plus_in_tokens,
        )
    }

    /// Bumped on every effective mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drain queued storage writes, oldest first
    pub fn take_writes(&mut self) -> Vec<StorageWrite> {
        std::mem::take(&mut self.outbox)
    }

    // -------------------------------------------------------------------------
    // Phrases
    // -------------------------------------------------------------------------

    pub fn add_phrase(&mut self, text: &str) -> Result<()> {
        let key = normalize_phrase(text);
        if key.is_empty() {
            return Err(CollectorError::EmptyInput);
        }
        if self.phrase_index.contains(&key) {
            return Err(CollectorError::Duplicate(key));
        }
        self.phrases.push(key);
        self.phrases_changed();
        Ok(())
    }

    /// Remove by normalized key. Returns false when absent.
    pub fn remove_phrase(&mut self, text: &str) -> bool {
        let key = normalize_phrase(text);
        if key.is_empty() || !self.phrase_index.contains(&key) {
            return false;
        }
        self.phrases.retain(|p| normalize_phrase(p) != key);
        self.phrases_changed();
        true
    }

    /// Remove by exact stored value. Returns false when absent.
    pub fn remove_phrase_exact(&mut self, stored: &str) -> bool {
        let before = self.phrases.len();
        self.phrases.retain(|p| p != stored);
        if self.phrases.len() == before {
            return false;
        }
        self.phrases_changed();
        true
    }

    /// Empty the phrases list. Also the only place the conflict-prompt
    /// suppression is lifted.
    pub fn clear_phrases(&mut self) {
        self.phrases.clear();
        self.phrases_changed();
        self.settings.suppress_conflict_prompt = false;
        self.save_settings();
    }

    // -------------------------------------------------------------------------
    // Minus-words
    // -------------------------------------------------------------------------

    /// Add a minus-word. The stored form gets the configured prefixes; the
    /// identity key does not.
    pub fn add_exclusion(&mut self, raw: &str) -> Result<()> {
        let key = normalize_base(raw);
        if key.is_empty() {
            return Err(CollectorError::EmptyInput);
        }
        if self.minus_index.contains(&key) {
            return Err(CollectorError::Duplicate(key));
        }
        let stored = apply_prefixes(strip_markers(raw), &self.settings);
        self.minus.push(stored);
        self.minus_changed();
        Ok(())
    }

    pub fn remove_exclusion_by_base(&mut self, base: &str) -> bool {
        let key = normalize_base(base);
        if key.is_empty() || !self.minus_index.contains(&key) {
            return false;
        }
        self.minus.retain(|w| normalize_base(w) != key);
        self.minus_changed();
        true
    }

    pub fn remove_exclusion_exact(&mut self, stored: &str) -> bool {
        let before = self.minus.len();
        self.minus.retain(|w| w != stored);
        if self.minus.len() == before {
            return false;
        }
        self.minus_changed();
        true
    }

    /// Empty the minus-words list. Leaves the suppression flag alone.
    pub fn clear_exclusions(&mut self) {
        self.minus.clear();
        self.minus_changed();
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: Mode) {
        if self.settings.active_mode == mode {
            return;
        }
        self.settings.active_mode = mode;
        self.settings_changed();
    }

    pub fn set_toggle(&mut self, toggle: SettingToggle, value: bool) {
        self.settings.apply_toggle(toggle, value);
        self.settings_changed();
    }

    pub fn set_suppress_conflict_prompt(&mut self, value: bool) {
        self.settings.suppress_conflict_prompt = value;
        self.settings_changed();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn rebuild_phrase_index(&mut self) {
        self.phrase_index = self
            .phrases
            .iter()
            .map(|p| normalize_phrase(p))
            .filter(|key| !key.is_empty())
            .collect();
    }

    /// Keeps the first stored form of each base key and drops entries with an
    /// empty key. Returns whether anything was dropped.
    fn collapse_duplicate_minus(&mut self) -> bool {
        let before = self.minus.len();
        let mut seen = HashSet::new();
        self.minus.retain(|w| {
            let key = normalize_base(w);
            !key.is_empty() && seen.insert(key)
        });
        let dropped = before - self.minus.len();
        if dropped > 0 {
            logging::warn(&format!(
                "[CollectionStore] dropped {} duplicate minus-words from storage",
                dropped
            ));
        }
        dropped > 0
    }

    fn rebuild_minus_index(&mut self) {
        self.minus_index.clear();
        self.minus_to_stored.clear();
        for stored in &self.minus {
            let key = normalize_base(stored);
            if key.is_empty() || self.minus_index.contains(&key) {
                continue;
            }
            self.minus_index.insert(key.clone());
            self.minus_to_stored.insert(key, stored.clone());
        }
    }

    fn phrases_changed(&mut self) {
        self.rebuild_phrase_index();
        self.outbox.push(StorageWrite::new(KEY_PHRASES, json!(self.phrases)));
        self.revision += 1;
    }

    fn minus_changed(&mut self) {
        self.rebuild_minus_index();
        self.save_minus();
        self.revision += 1;
    }

    fn settings_changed(&mut self) {
        self.save_settings();
        self.revision += 1;
    }

    fn save_minus(&mut self) {
        self.outbox.push(StorageWrite::new(KEY_MINUS, json!(self.minus)));
    }

    fn save_settings(&mut self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.outbox.push(StorageWrite::new(KEY_SETTINGS, value)),
            Err(e) => logging::warn(&format!("[CollectionStore] settings not saved: {}", e)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

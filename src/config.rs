// collector-core/src/config.rs
//
// Page selectors and timing constants for scanning and rescheduling

use serde::{Deserialize, Serialize};

/// Wordstat results wrapper; candidates outside it are never decorated
pub const RESULTS_CONTAINER_SELECTOR: &str = ".wordstat__search-result-content-wrapper";

/// Elements that may carry a phrase
pub const CANDIDATE_SELECTOR: &str = "a, span";

/// Root of the floating control panel
pub const WIDGET_SELECTOR: &str = "#wc-widget";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
    /// Selector of the container that holds result phrases
    pub results_selector: String,

    /// Selector for phrase-bearing candidates inside the container
    pub candidate_selector: String,

    /// Selector of the tool's own control surface
    pub widget_selector: String,

    /// Phrases longer than this (in chars) are not candidates
    pub max_phrase_chars: usize,

    /// Quiescence delay after the last tree mutation before a rescan (ms)
    pub debounce_ms: u64,

    /// Rescan delays after a virtual navigation (ms, relative to detection)
    pub burst_delays_ms: Vec<u64>,

    /// Fallback location polling interval (ms)
    pub location_poll_ms: u64,

    /// How long a notice stays visible (ms)
    pub notice_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            results_selector: RESULTS_CONTAINER_SELECTOR.to_string(),
            candidate_selector: CANDIDATE_SELECTOR.to_string(),
            widget_selector: WIDGET_SELECTOR.to_string(),
            max_phrase_chars: 120,
            debounce_ms: 120,
            burst_delays_ms: vec![0, 120, 300, 700, 1200],
            location_poll_ms: 1200,
            notice_ms: 900,
        }
    }
}

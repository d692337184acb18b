//! CollectorCore: Word Collector engine for Wordstat result pages
//!
//! A Rust/WASM implementation of the phrase / minus-word collector: the host
//! page keeps re-rendering its results, and the collector keeps per-word and
//! per-phrase controls on those results in sync with two persisted lists.
//!
//! # Architecture
//!
//! ## Collections
//! - `collection/normalize.rs` - Base keys, phrase keys, token keys, prefixes
//! - `collection/settings.rs` - Settings and Mode (stored wire format)
//! - `collection/conflict.rs` - Minus-words contained in a phrase
//! - `collection/store.rs` - CollectionStore: both lists + derived indexes
//! - `collection/persist.rs` - Storage keys, startup snapshot, write records
//!
//! ## Page
//! - `tree/` - RenderTree seam; `MemTree` (arena) and `DomTree` (web-sys)
//! - `extract.rs` - Current phrase of a result node
//! - `decorate.rs` - Decoration build + write-only-on-change refresh
//! - `scheduler.rs` - Debounce, navigation bursts, location polling
//!
//! ## Coordination
//! - `gate.rs` - ConfirmationGate for conflicting phrase adds
//! - `collector.rs` - Collector: Booting → Ready, scans, clicks, hotkey
//! - `panel.rs` - Control-panel actions and widget state
//! - `wasm.rs` - WordCollector JS binding
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { WordCollector } from 'collector-core';
//!
//! await init();
//!
//! const wc = new WordCollector();
//! wc.setPersist((key, value) => chrome.storage.local.set({ [key]: value }));
//! chrome.storage.local.get(WordCollector.storageKeys(), (res) => {
//!   wc.hydrate(res);
//!   new MutationObserver((ms) => {
//!     wc.onMutations(ms.map(m => ({
//!       type: m.type, added: m.addedNodes.length, removed: m.removedNodes.length,
//!     })));
//!     arm();
//!   }).observe(document.body, { childList: true, subtree: true, characterData: true });
//! });
//!
//! function arm() {
//!   const at = wc.nextWakeup();
//!   if (at !== undefined) setTimeout(() => { wc.tick(); arm(); }, Math.max(0, at - Date.now()));
//! }
//! ```

pub mod collection;
pub mod collector;
pub mod config;
pub mod decorate;
pub mod error;
pub mod extract;
pub mod gate;
pub mod logging;
pub mod panel;
pub mod scheduler;
pub mod tree;
pub mod wasm;

pub use collection::*;
pub use collector::{ClickOutcome, Collector, Notice, ScanReport};
pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use gate::{ConfirmationGate, ConflictPrompt, Decision};
pub use scheduler::{ScanScheduler, ScanTrigger};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install the panic hook so panics reach the browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("collector-core v{}", env!("CARGO_PKG_VERSION"))
}

//! WordCollector: JS binding over the live page
//!
//! The host script owns the event listeners (MutationObserver, history hooks,
//! key and click listeners, one timer) and forwards each event here. Storage
//! writes are pushed to the `persist(key, value)` callback when one is set,
//! otherwise they stay queued for `takeWrites()`.

use serde::Serialize;
use serde_json::json;
use wasm_bindgen::prelude::*;

use crate::collection::persist::{StorageSnapshot, ALL_KEYS};
use crate::collection::settings::{Mode, SettingToggle};
use crate::collector::{ClickOutcome, Collector};
use crate::config::CollectorConfig;
use crate::gate::Decision;
use crate::logging;
use crate::panel::Viewport;
use crate::tree::{DomTree, MutationRecord, RenderTree};

#[wasm_bindgen]
pub struct WordCollector {
    inner: Collector,
    tree: DomTree,
    persist: Option<js_sys::Function>,
}

fn now() -> u64 {
    js_sys::Date::now() as u64
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

/// `{ kind, text?, prompt? }` for the notice and confirmation surfaces
fn outcome_to_js(outcome: &ClickOutcome) -> JsValue {
    let value = match outcome {
        ClickOutcome::Ignored => json!({ "kind": "ignored" }),
        ClickOutcome::Updated => json!({ "kind": "updated" }),
        ClickOutcome::Notice(notice) => json!({
            "kind": "notice",
            "notice": notice,
            "text": notice.text(),
        }),
        ClickOutcome::Confirm(prompt) => json!({
            "kind": "confirm",
            "prompt": {
                "title": prompt.title(),
                "lead": prompt.lead(),
                "phrase": prompt.phrase,
                "hits": prompt.hits,
            },
        }),
    };
    to_js(&value)
}

fn toggle_from_wire(name: &str) -> Option<SettingToggle> {
    match name {
        "stripPlusInPhrases" => Some(SettingToggle::StripLeadingPlus),
        "addBangPrefix" => Some(SettingToggle::PrefixWithBang),
        "addPlusPrefix" => Some(SettingToggle::PrefixWithPlus),
        "shiftHotkeyEnabled" => Some(SettingToggle::ShiftHotkey),
        _ => None,
    }
}

impl WordCollector {
    fn flush(&mut self) {
        let Some(persist) = &self.persist else {
            return;
        };
        for write in self.inner.take_writes() {
            let key = JsValue::from_str(&write.key);
            if let Err(e) = persist.call2(&JsValue::NULL, &key, &to_js(&write.value)) {
                logging::warn(&format!("[WordCollector] persist({}) failed: {:?}", write.key, e));
            }
        }
    }
}

#[wasm_bindgen]
impl WordCollector {
    /// Create a collector bound to `window.document`.
    /// `config` may be `undefined`; missing fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WordCollector, JsValue> {
        let config: CollectorConfig = if config.is_undefined() || config.is_null() {
            CollectorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
        };
        let tree = DomTree::from_window().ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(WordCollector {
            inner: Collector::new(config),
            tree,
            persist: None,
        })
    }

    /// Keys to request from storage before `hydrate`
    #[wasm_bindgen(js_name = storageKeys)]
    pub fn storage_keys() -> JsValue {
        to_js(&ALL_KEYS)
    }

    /// `persist(key, value)` is called for every storage write
    #[wasm_bindgen(js_name = setPersist)]
    pub fn set_persist(&mut self, persist: js_sys::Function) {
        self.persist = Some(persist);
        self.flush();
    }

    #[wasm_bindgen(js_name = takeWrites)]
    pub fn take_writes(&mut self) -> JsValue {
        to_js(&self.inner.take_writes())
    }

    /// Storage `getAll` result; runs the first scan
    #[wasm_bindgen]
    pub fn hydrate(&mut self, snapshot: JsValue) -> Result<JsValue, JsValue> {
        let raw: serde_json::Value = serde_wasm_bindgen::from_value(snapshot)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse snapshot: {}", e)))?;
        let report = self
            .inner
            .hydrate(&mut self.tree, &StorageSnapshot::from_value(&raw), now());
        self.flush();
        Ok(to_js(&report))
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    #[wasm_bindgen(js_name = stateName)]
    pub fn state_name(&self) -> String {
        self.inner.state_name().to_string()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Array of `{ type, added, removed }` summarizing one observer batch
    #[wasm_bindgen(js_name = onMutations)]
    pub fn on_mutations(&mut self, records: JsValue) -> Result<bool, JsValue> {
        let records: Vec<MutationRecord> = serde_wasm_bindgen::from_value(records)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse mutations: {}", e)))?;
        Ok(self.inner.on_mutations(&records, now()))
    }

    /// pushState / replaceState / popstate
    #[wasm_bindgen(js_name = onLocation)]
    pub fn on_location(&mut self) -> bool {
        let location = self.tree.location();
        self.inner.on_location(&location, now())
    }

    #[wasm_bindgen(js_name = onSearchSubmit)]
    pub fn on_search_submit(&mut self) {
        self.inner.on_search_submit(now());
    }

    /// Timer callback. Returns the scan report, or null if nothing ran.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> JsValue {
        match self.inner.tick(&mut self.tree, now()) {
            Some(report) => to_js(&report),
            None => JsValue::NULL,
        }
    }

    /// Absolute time (ms since epoch) for the next `tick`
    #[wasm_bindgen(js_name = nextWakeup)]
    pub fn next_wakeup(&self) -> Option<f64> {
        self.inner.next_wakeup().map(|at| at as f64)
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Hotkey down (`true`) or up / window blur (`false`)
    #[wasm_bindgen(js_name = setHotkey)]
    pub fn set_hotkey(&mut self, held: bool) -> bool {
        self.inner.set_hotkey_held(&mut self.tree, held)
    }

    #[wasm_bindgen(js_name = effectiveMode)]
    pub fn effective_mode(&self) -> String {
        self.inner.effective_mode().to_string()
    }

    /// Click anywhere; only decoration controls react
    #[wasm_bindgen(js_name = clickTarget)]
    pub fn click_target(&mut self, target: web_sys::Element) -> JsValue {
        let outcome = self.inner.click_target(&mut self.tree, &target);
        self.flush();
        outcome_to_js(&outcome)
    }

    #[wasm_bindgen(js_name = clickWord)]
    pub fn click_word(&mut self, raw: &str) -> JsValue {
        let outcome = self.inner.click_word(&mut self.tree, raw);
        self.flush();
        outcome_to_js(&outcome)
    }

    #[wasm_bindgen(js_name = clickPhrase)]
    pub fn click_phrase(&mut self, phrase: &str) -> JsValue {
        let outcome = self.inner.click_phrase(&mut self.tree, phrase);
        self.flush();
        outcome_to_js(&outcome)
    }

    /// `{ confirmed, suppressFuture }` from the confirmation surface
    #[wasm_bindgen(js_name = resolveConfirmation)]
    pub fn resolve_confirmation(&mut self, decision: JsValue) -> Result<JsValue, JsValue> {
        let decision: Decision = serde_wasm_bindgen::from_value(decision)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse decision: {}", e)))?;
        let outcome = self.inner.resolve_confirmation(&mut self.tree, decision);
        self.flush();
        Ok(outcome_to_js(&outcome))
    }

    // ========================================================================
    // Panel
    // ========================================================================

    #[wasm_bindgen(js_name = listView)]
    pub fn list_view(&self) -> JsValue {
        to_js(&self.inner.list_view())
    }

    #[wasm_bindgen]
    pub fn settings(&self) -> JsValue {
        to_js(self.inner.store().settings())
    }

    #[wasm_bindgen(js_name = widgetState)]
    pub fn widget_state(&self) -> JsValue {
        let widget = self.inner.widget();
        let pos = widget.pos();
        to_js(&json!({ "x": pos.x, "y": pos.y, "collapsed": widget.collapsed() }))
    }

    /// Returns `{ added, duplicates, notice }` plus the notice text
    #[wasm_bindgen(js_name = submitBatch)]
    pub fn submit_batch(&mut self, raw: &str) -> JsValue {
        let report = self.inner.submit_batch(&mut self.tree, raw);
        self.flush();
        to_js(&json!({
            "added": report.added,
            "duplicates": report.duplicates,
            "notice": report.notice,
            "text": report.notice.text(),
        }))
    }

    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, stored: &str) -> bool {
        let removed = self.inner.remove_item(&mut self.tree, stored);
        self.flush();
        removed
    }

    /// Returns the notice text
    #[wasm_bindgen(js_name = clearActive)]
    pub fn clear_active(&mut self) -> String {
        let notice = self.inner.clear_active(&mut self.tree);
        self.flush();
        notice.text().to_string()
    }

    /// Clipboard text for the active list
    #[wasm_bindgen(js_name = exportActive)]
    pub fn export_active(&self) -> String {
        self.inner.export_active()
    }

    /// `"phrases"` or `"minus"`
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> bool {
        let changed = self.inner.switch_mode(&mut self.tree, Mode::from(mode.to_string()));
        self.flush();
        changed
    }

    /// `name` is the stored settings field, e.g. `"addBangPrefix"`.
    /// Returns the notice text.
    #[wasm_bindgen(js_name = setSetting)]
    pub fn set_setting(&mut self, name: &str, value: bool) -> Result<String, JsValue> {
        let toggle = toggle_from_wire(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown setting: {}", name)))?;
        let notice = self.inner.set_setting(&mut self.tree, toggle, value);
        self.flush();
        Ok(notice.text().to_string())
    }

    /// End of a drag. Returns the clamped `{ x, y }`.
    #[wasm_bindgen(js_name = moveWidget)]
    pub fn move_widget(
        &mut self,
        x: f64,
        y: f64,
        viewport_width: f64,
        viewport_height: f64,
        widget_width: f64,
        widget_height: f64,
    ) -> JsValue {
        let viewport = Viewport {
            width: viewport_width,
            height: viewport_height,
            widget_width,
            widget_height,
        };
        let pos = self.inner.move_widget(x, y, viewport);
        self.flush();
        to_js(&pos)
    }

    #[wasm_bindgen(js_name = toggleCollapsed)]
    pub fn toggle_collapsed(&mut self) -> bool {
        let collapsed = self.inner.toggle_collapsed();
        self.flush();
        collapsed
    }

    #[wasm_bindgen(js_name = noticeMs)]
    pub fn notice_ms(&self) -> f64 {
        self.inner.config().notice_ms as f64
    }
}

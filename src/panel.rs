//! Control-panel actions
//!
//! The panel holds no collection state of its own. Every action goes through
//! the collection store and ends with a refresh of the live decorations; the
//! only panel-local state is the widget's position and collapsed flag.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::collection::normalize::split_batch;
use crate::collection::persist::{StorageSnapshot, StorageWrite, WidgetPos, KEY_COLLAPSED, KEY_POSITION};
use crate::collection::settings::{Mode, SettingToggle};
use crate::collector::{Collector, Notice};
use crate::tree::RenderTree;

// =============================================================================
// Widget state
// =============================================================================

#[derive(Debug, Default)]
pub struct WidgetState {
    pos: WidgetPos,
    collapsed: bool,
    outbox: Vec<StorageWrite>,
}

impl WidgetState {
    pub fn load(&mut self, snapshot: &StorageSnapshot) {
        self.pos = snapshot.position.unwrap_or_default();
        self.collapsed = snapshot.collapsed;
    }

    pub fn pos(&self) -> WidgetPos {
        self.pos
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn take_writes(&mut self) -> Vec<StorageWrite> {
        std::mem::take(&mut self.outbox)
    }

    /// Place the widget, keeping it fully inside the viewport
    fn move_to(&mut self, x: f64, y: f64, viewport: Viewport) -> WidgetPos {
        let pos = WidgetPos {
            x: clamp_axis(x, viewport.width - viewport.widget_width),
            y: clamp_axis(y, viewport.height - viewport.widget_height),
        };
        if pos != self.pos {
            self.pos = pos;
            self.outbox.push(StorageWrite::new(KEY_POSITION, json!({ "x": pos.x, "y": pos.y })));
        }
        pos
    }

    fn toggle_collapsed(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.outbox.push(StorageWrite::new(KEY_COLLAPSED, json!(self.collapsed)));
        self.collapsed
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0).round()
}

/// Window and widget size at the end of a drag, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub widget_width: f64,
    pub widget_height: f64,
}

// =============================================================================
// List view
// =============================================================================

/// What the panel renders for the active list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub mode: Mode,
    pub items: Vec<String>,
    pub count: usize,
}

/// Outcome of a batch add from the text box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub added: usize,
    pub duplicates: usize,
    pub notice: Notice,
}

// =============================================================================
// Panel actions
// =============================================================================

impl Collector {
    pub fn widget(&self) -> &WidgetState {
        &self.widget
    }

    pub fn list_view(&self) -> ListView {
        let mode = self.store.settings().active_mode;
        let items = self.store.list(mode).to_vec();
        ListView { mode, count: items.len(), items }
    }

    /// Add every item of a newline/comma/semicolon separated batch to the
    /// active list
    pub fn submit_batch<T: RenderTree>(&mut self, tree: &mut T, raw: &str) -> BatchReport {
        let items = split_batch(raw);
        if items.is_empty() {
            return BatchReport { added: 0, duplicates: 0, notice: Notice::Empty };
        }

        let mode = self.store.settings().active_mode;
        let mut report = BatchReport { added: 0, duplicates: 0, notice: Notice::Added };
        for item in &items {
            let result = match mode {
                Mode::Phrases => self.store.add_phrase(item),
                Mode::Exclusions => self.store.add_exclusion(item),
            };
            match result {
                Ok(()) => report.added += 1,
                Err(e) if Notice::for_error(&e).is_some() => report.duplicates += 1,
                Err(_) => {}
            }
        }
        if report.added == 0 && report.duplicates > 0 {
            report.notice = Notice::AlreadyAdded;
        }
        self.refresh_all(tree);
        report
    }

    /// Remove an item of the active list by its exact stored value
    pub fn remove_item<T: RenderTree>(&mut self, tree: &mut T, stored: &str) -> bool {
        let removed = match self.store.settings().active_mode {
            Mode::Phrases => self.store.remove_phrase_exact(stored),
            Mode::Exclusions => self.store.remove_exclusion_exact(stored),
        };
        if removed {
            self.refresh_all(tree);
        }
        removed
    }

    pub fn clear_active<T: RenderTree>(&mut self, tree: &mut T) -> Notice {
        match self.store.settings().active_mode {
            Mode::Phrases => self.store.clear_phrases(),
            Mode::Exclusions => self.store.clear_exclusions(),
        }
        self.refresh_all(tree);
        Notice::Cleared
    }

    /// Active list as clipboard text, one item per line
    pub fn export_active(&self) -> String {
        self.store.list(self.store.settings().active_mode).join("\n")
    }

    pub fn switch_mode<T: RenderTree>(&mut self, tree: &mut T, mode: Mode) -> bool {
        if self.store.settings().active_mode == mode {
            return false;
        }
        self.store.set_mode(mode);
        self.refresh_all(tree);
        true
    }

    pub fn set_setting<T: RenderTree>(&mut self, tree: &mut T, toggle: SettingToggle, value: bool) -> Notice {
        self.store.set_toggle(toggle, value);
        match toggle {
            SettingToggle::ShiftHotkey => {
                if !value {
                    self.release_hotkey();
                }
                self.refresh_words(tree);
            }
            // Prefixes only shape future insertions; the refresh finds nothing
            // to write unless the page is stale
            SettingToggle::StripLeadingPlus
            | SettingToggle::PrefixWithBang
            | SettingToggle::PrefixWithPlus => {
                self.refresh_all(tree);
            }
        }
        Notice::Saved
    }

    /// End of a drag: clamp, store and persist the new position
    pub fn move_widget(&mut self, x: f64, y: f64, viewport: Viewport) -> WidgetPos {
        self.widget.move_to(x, y, viewport)
    }

    pub fn toggle_collapsed(&mut self) -> bool {
        self.widget.toggle_collapsed()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::persist::KEY_SETTINGS;
    use crate::tree::MemTree;

    const PAGE: &str = "https://wordstat.yandex.ru/";

    fn setup() -> (MemTree, Collector) {
        let mut tree = MemTree::new(PAGE);
        let mut c = Collector::default();
        c.hydrate(&mut tree, &StorageSnapshot::default(), 0);
        (tree, c)
    }

    fn viewport() -> Viewport {
        Viewport { width: 1280.0, height: 800.0, widget_width: 320.0, widget_height: 400.0 }
    }

    // -------------------------------------------------------------------------
    // Batch add
    // -------------------------------------------------------------------------

    #[test]
    fn test_batch_splits_on_all_separators() {
        let (mut tree, mut c) = setup();
        let report = c.submit_batch(&mut tree, "купить чехол gopro\nкрепление на шлем; аквабокс 45м,  ,");
        assert_eq!(report.added, 3);
        assert_eq!(report.notice, Notice::Added);
        assert_eq!(
            c.list_view().items,
            vec!["купить чехол gopro", "крепление на шлем", "аквабокс 45м"]
        );
    }

    #[test]
    fn test_empty_batch_reports_empty() {
        let (mut tree, mut c) = setup();
        let report = c.submit_batch(&mut tree, "  \n ; ");
        assert_eq!(report.notice, Notice::Empty);
        assert!(c.take_writes().is_empty());
    }

    #[test]
    fn test_batch_goes_to_active_list() {
        let (mut tree, mut c) = setup();
        c.switch_mode(&mut tree, Mode::Exclusions);
        c.submit_batch(&mut tree, "дешево\nбесплатно\nДешево");
        let view = c.list_view();
        assert_eq!(view.mode, Mode::Exclusions);
        assert_eq!(view.items, vec!["дешево", "бесплатно"]);
        assert_eq!(view.count, 2);
        assert!(c.store().phrases().is_empty());

        let again = c.submit_batch(&mut tree, "бесплатно");
        assert_eq!(again.notice, Notice::AlreadyAdded);
    }

    #[test]
    fn test_batch_applies_prefixes_to_new_words_only() {
        let (mut tree, mut c) = setup();
        c.switch_mode(&mut tree, Mode::Exclusions);
        c.submit_batch(&mut tree, "бу");
        c.set_setting(&mut tree, SettingToggle::PrefixWithBang, true);
        c.submit_batch(&mut tree, "даром");
        assert_eq!(c.export_active(), "бу\n!даром");
    }

    // -------------------------------------------------------------------------
    // Remove / clear / export
    // -------------------------------------------------------------------------

    #[test]
    fn test_remove_item_is_exact() {
        let (mut tree, mut c) = setup();
        c.switch_mode(&mut tree, Mode::Exclusions);
        c.set_setting(&mut tree, SettingToggle::PrefixWithPlus, true);
        c.submit_batch(&mut tree, "в");
        assert!(!c.remove_item(&mut tree, "в"));
        assert!(c.remove_item(&mut tree, "+в"));
        assert!(c.list_view().items.is_empty());
    }

    #[test]
    fn test_clear_active_only_touches_active_list() {
        let (mut tree, mut c) = setup();
        c.submit_batch(&mut tree, "купить чехол");
        c.switch_mode(&mut tree, Mode::Exclusions);
        c.submit_batch(&mut tree, "дешево");

        assert_eq!(c.clear_active(&mut tree), Notice::Cleared);
        assert!(c.store().exclusions().is_empty());
        assert_eq!(c.store().phrases().len(), 1);
    }

    #[test]
    fn test_export_joins_lines() {
        let (mut tree, mut c) = setup();
        c.submit_batch(&mut tree, "a b, c d");
        assert_eq!(c.export_active(), "a b\nc d");
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    #[test]
    fn test_disabling_hotkey_releases_it() {
        let (mut tree, mut c) = setup();
        c.set_hotkey_held(&mut tree, true);
        assert_eq!(c.effective_mode(), Mode::Exclusions);

        assert_eq!(c.set_setting(&mut tree, SettingToggle::ShiftHotkey, false), Notice::Saved);
        assert!(!c.hotkey_held());
        assert_eq!(c.effective_mode(), Mode::Phrases);
        assert!(c.take_writes().iter().any(|w| w.key == KEY_SETTINGS));
    }

    #[test]
    fn test_prefix_toggle_refreshes_page() {
        let mut tree = MemTree::new(PAGE);
        let root = tree.root();
        let wrapper = tree.element(root, "div", "wordstat__search-result-content-wrapper");
        let link = tree.element(wrapper, "a", "");
        tree.text_node(link, "купить дешево");
        let mut c = Collector::default();
        c.hydrate(&mut tree, &StorageSnapshot::default(), 0);
        c.switch_mode(&mut tree, Mode::Exclusions);

        c.store.add_exclusion("дешево").unwrap();
        let token = tree.query_document(".wc-token")[1];
        assert!(!tree.has_class(&token, "wc-token--selected"));

        assert_eq!(c.set_setting(&mut tree, SettingToggle::PrefixWithBang, true), Notice::Saved);
        assert!(tree.has_class(&token, "wc-token--selected"));

        tree.take_mutations();
        c.set_setting(&mut tree, SettingToggle::PrefixWithPlus, true);
        assert_eq!(tree.mutation_count(), 0);
    }

    #[test]
    fn test_switch_mode_same_mode_is_a_no_op() {
        let (mut tree, mut c) = setup();
        assert!(!c.switch_mode(&mut tree, Mode::Phrases));
        assert!(c.take_writes().is_empty());
    }

    // -------------------------------------------------------------------------
    // Widget
    // -------------------------------------------------------------------------

    #[test]
    fn test_widget_move_is_clamped_and_persisted() {
        let (_tree, mut c) = setup();
        let pos = c.move_widget(1500.4, -20.0, viewport());
        assert_eq!(pos, WidgetPos { x: 960.0, y: 0.0 });

        let writes = c.take_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].key, KEY_POSITION);
        assert_eq!(writes[0].value, json!({ "x": 960.0, "y": 0.0 }));

        // Same spot again writes nothing
        c.move_widget(2000.0, -1.0, viewport());
        assert!(c.take_writes().is_empty());
    }

    #[test]
    fn test_widget_larger_than_viewport_pins_to_origin() {
        let (_tree, mut c) = setup();
        let small = Viewport { width: 200.0, height: 200.0, widget_width: 320.0, widget_height: 400.0 };
        assert_eq!(c.move_widget(50.0, 50.0, small), WidgetPos { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_collapse_toggle_persists() {
        let (_tree, mut c) = setup();
        assert!(c.toggle_collapsed());
        assert!(!c.toggle_collapsed());
        let writes = c.take_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].value, json!(false));
    }

    #[test]
    fn test_widget_state_from_snapshot() {
        let mut tree = MemTree::new(PAGE);
        let snapshot = StorageSnapshot {
            position: Some(WidgetPos { x: 10.0, y: 20.0 }),
            collapsed: true,
            ..Default::default()
        };
        let mut c = Collector::default();
        c.hydrate(&mut tree, &snapshot, 0);
        assert_eq!(c.widget().pos(), WidgetPos { x: 10.0, y: 20.0 });
        assert!(c.widget().collapsed());
    }
}

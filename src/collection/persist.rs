//! Storage wire format
//!
//! The host key-value store is read once at startup (`StorageSnapshot`) and
//! written fire-and-forget (`StorageWrite`). In-memory state stays the source
//! of truth for the session whatever happens to a write.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::settings::Settings;
use crate::error::{CollectorError, Result};
use crate::logging;

// =============================================================================
// Keys
// =============================================================================

/// Single word list used by versions up to 0.3.5
pub const KEY_LEGACY_WORDS: &str = "wc_words";
pub const KEY_PHRASES: &str = "wc_phrases";
pub const KEY_MINUS: &str = "wc_minus";
pub const KEY_POSITION: &str = "wc_pos";
pub const KEY_COLLAPSED: &str = "wc_collapsed";
pub const KEY_SETTINGS: &str = "wc_settings";

/// Every key requested from the store on startup
pub const ALL_KEYS: [&str; 6] = [
    KEY_PHRASES,
    KEY_MINUS,
    KEY_LEGACY_WORDS,
    KEY_POSITION,
    KEY_COLLAPSED,
    KEY_SETTINGS,
];

// =============================================================================
// Types
// =============================================================================

/// Top-left corner of the floating panel, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPos {
    pub x: f64,
    pub y: f64,
}

impl Default for WidgetPos {
    fn default() -> Self {
        Self { x: 24.0, y: 120.0 }
    }
}

/// One pending `set(key, value)` for the host store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageWrite {
    pub key: String,
    pub value: Value,
}

impl StorageWrite {
    pub fn new(key: &str, value: Value) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

/// Decoded result of the startup bulk read.
///
/// Decoding is lenient: a value of the wrong shape is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageSnapshot {
    pub phrases: Vec<String>,
    pub minus: Vec<String>,
    pub legacy_words: Vec<String>,
    pub position: Option<WidgetPos>,
    pub collapsed: bool,
    pub settings: Settings,
}

impl StorageSnapshot {
    /// Decode a `getAll` result (`{ key: value }`)
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            phrases: string_list(map.get(KEY_PHRASES)),
            minus: string_list(map.get(KEY_MINUS)),
            legacy_words: string_list(map.get(KEY_LEGACY_WORDS)),
            position: map.get(KEY_POSITION).and_then(position),
            collapsed: map.get(KEY_COLLAPSED).map(truthy).unwrap_or(false),
            settings: map.get(KEY_SETTINGS).map(settings).unwrap_or_default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(map) => Self::from_map(map),
            None => Self::default(),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn position(value: &Value) -> Option<WidgetPos> {
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    Some(WidgetPos { x, y })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn settings(value: &Value) -> Settings {
    decode_settings(value).unwrap_or_else(|e| {
        logging::warn(&format!("[Storage] settings ignored: {}", e));
        Settings::default()
    })
}

/// Strict decode of the stored settings object
pub fn decode_settings(value: &Value) -> Result<Settings> {
    if !value.is_object() {
        return Err(CollectorError::Storage(format!(
            "{} is not an object",
            KEY_SETTINGS
        )));
    }
    Ok(serde_json::from_value::<Settings>(value.clone())?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::settings::Mode;
    use serde_json::json;

    #[test]
    fn test_full_snapshot() {
        let snap = StorageSnapshot::from_value(&json!({
            "wc_phrases": ["купить чехол gopro"],
            "wc_minus": ["!дешево"],
            "wc_pos": { "x": 10, "y": 300.5 },
            "wc_collapsed": true,
            "wc_settings": { "mode": "minus", "addPlusPrefix": true }
        }));
        assert_eq!(snap.phrases, vec!["купить чехол gopro"]);
        assert_eq!(snap.minus, vec!["!дешево"]);
        assert_eq!(snap.position, Some(WidgetPos { x: 10.0, y: 300.5 }));
        assert!(snap.collapsed);
        assert_eq!(snap.settings.active_mode, Mode::Exclusions);
        assert!(snap.settings.prefix_with_plus);
    }

    #[test]
    fn test_malformed_values_are_absent() {
        let snap = StorageSnapshot::from_value(&json!({
            "wc_phrases": "not a list",
            "wc_pos": { "x": "10", "y": 5 },
            "wc_settings": 42
        }));
        assert!(snap.phrases.is_empty());
        assert!(snap.position.is_none());
        assert_eq!(snap.settings, Settings::default());
    }

    #[test]
    fn test_decode_settings_reports_storage_errors() {
        assert!(matches!(
            decode_settings(&json!(42)),
            Err(CollectorError::Storage(_))
        ));
        assert!(matches!(
            decode_settings(&json!({ "addBangPrefix": "yes" })),
            Err(CollectorError::Storage(_))
        ));
        let parsed = decode_settings(&json!({ "addBangPrefix": true })).unwrap();
        assert!(parsed.prefix_with_bang);
    }

    #[test]
    fn test_empty_store() {
        let snap = StorageSnapshot::from_value(&json!({}));
        assert_eq!(snap, StorageSnapshot::default());
    }
}

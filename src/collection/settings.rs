//! User settings and collection mode.
//!
//! Field names on the wire are the ones already present in users' storage,
//! so renaming a Rust field must never change its serde name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection the panel and decorations are editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Key phrases ("include" collection)
    #[default]
    Phrases,
    /// Minus-words ("exclude" collection)
    Exclusions,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phrases => "phrases",
            Self::Exclusions => "minus",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown values fall back to `Phrases`
impl From<String> for Mode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "minus" => Self::Exclusions,
            _ => Self::Phrases,
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// Persisted settings object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remove leading `+` from tokens taken from rendered phrases
    #[serde(rename = "stripPlusInPhrases")]
    pub strip_leading_plus_in_tokens: bool,

    /// Prepend `!` to newly added minus-words
    #[serde(rename = "addBangPrefix")]
    pub prefix_with_bang: bool,

    /// Prepend `+` to newly added minus-words
    #[serde(rename = "addPlusPrefix")]
    pub prefix_with_plus: bool,

    #[serde(rename = "mode")]
    pub active_mode: Mode,

    /// "Don't ask again until phrases are cleared"
    #[serde(rename = "dontAskUntilPhrasesCleared")]
    pub suppress_conflict_prompt: bool,

    /// Holding Shift in phrases mode temporarily collects minus-words
    #[serde(rename = "shiftHotkeyEnabled")]
    pub shift_hotkey_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strip_leading_plus_in_tokens: false,
            prefix_with_bang: false,
            prefix_with_plus: false,
            active_mode: Mode::Phrases,
            suppress_conflict_prompt: false,
            shift_hotkey_enabled: true,
        }
    }
}

/// A single user-facing settings toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingToggle {
    StripLeadingPlus,
    PrefixWithBang,
    PrefixWithPlus,
    ShiftHotkey,
}

impl Settings {
    pub fn apply_toggle(&mut self, toggle: SettingToggle, value: bool) {
        match toggle {
            SettingToggle::StripLeadingPlus => self.strip_leading_plus_in_tokens = value,
            SettingToggle::PrefixWithBang => self.prefix_with_bang = value,
            SettingToggle::PrefixWithPlus => self.prefix_with_plus = value,
            SettingToggle::ShiftHotkey => self.shift_hotkey_enabled = value,
        }
    }
}

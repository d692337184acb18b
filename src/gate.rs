//! ConfirmationGate: blocking choice before adding a conflicting phrase
//!
//! # State machine
//! Idle → AwaitingDecision (phrase has minus-word hits, prompt not suppressed)
//! AwaitingDecision → Idle (exactly one `resolve`)
//!
//! The gate blocks one logical add-phrase operation, not global input. It
//! holds no queue: opening while a decision is pending is refused.

use serde::{Deserialize, Serialize};

use crate::error::{CollectorError, Result};

/// What the confirmation surface renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPrompt {
    /// Normalized phrase awaiting the decision
    pub phrase: String,
    /// Conflicting minus-word base keys
    pub hits: Vec<String>,
}

impl ConflictPrompt {
    pub fn title(&self) -> &'static str {
        "Фраза содержит минус-слово"
    }

    pub fn lead(&self) -> &'static str {
        if self.hits.len() == 1 {
            "В этой ключевой фразе найдено минус-слово:"
        } else {
            "В этой ключевой фразе найдены минус-слова:"
        }
    }
}

/// Answer returned by the confirmation surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub confirmed: bool,
    /// "Don't ask again until phrases are cleared"; honored on cancel too
    pub suppress_future: bool,
}

/// A resolved gate: the caller adds `phrase` iff `confirmed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub phrase: String,
    pub confirmed: bool,
    pub suppress_future: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingDecision(ConflictPrompt),
}

#[derive(Debug)]
pub struct ConfirmationGate {
    state: State,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, State::AwaitingDecision(_))
    }

    pub fn pending(&self) -> Option<&ConflictPrompt> {
        match &self.state {
            State::AwaitingDecision(prompt) => Some(prompt),
            State::Idle => None,
        }
    }

    /// Enter AwaitingDecision. Refused while another decision is pending.
    pub fn open(&mut self, phrase: String, hits: Vec<String>) -> Result<&ConflictPrompt> {
        if self.is_awaiting() {
            return Err(CollectorError::GateBusy);
        }
        self.state = State::AwaitingDecision(ConflictPrompt { phrase, hits });
        match &self.state {
            State::AwaitingDecision(prompt) => Ok(prompt),
            State::Idle => Err(CollectorError::GateBusy),
        }
    }

    /// Resolve the pending decision and return to Idle.
    /// `None` when nothing was pending.
    pub fn resolve(&mut self, decision: Decision) -> Option<Resolution> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::AwaitingDecision(prompt) => Some(Resolution {
                phrase: prompt.phrase,
                confirmed: decision.confirmed,
                suppress_future: decision.suppress_future,
            }),
            State::Idle => None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::AwaitingDecision(_) => "awaiting-decision",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

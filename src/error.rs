//! Error taxonomy for the collector engine.
//!
//! Nothing here is fatal: every variant is recovered by the caller, either as
//! a transient notice or a silent skip.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    /// Attempted add of a key that is already in the collection
    #[error("already collected: {0}")]
    Duplicate(String),

    /// Normalization produced an empty key
    #[error("input is empty after normalization")]
    EmptyInput,

    /// A confirmation is already awaiting a decision
    #[error("a confirmation is already pending")]
    GateBusy,

    /// Storage snapshot or write payload could not be (de)serialized
    #[error("storage: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

impl From<serde_json::Error> for CollectorError {
    fn from(e: serde_json::Error) -> Self {
        CollectorError::Storage(e.to_string())
    }
}

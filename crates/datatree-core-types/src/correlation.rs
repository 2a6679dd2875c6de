//! Correlation types for transaction tracking
//!
//! Every transaction carries a `TransactionId` so that the start, end and
//! error events it emits can be tied together, and so that undo groups can
//! report which transactions they were built from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single tree transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a new TransactionId using UUIDv7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

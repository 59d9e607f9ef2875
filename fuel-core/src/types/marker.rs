//! Completion markers
//!
//! A marker's existence is the sole idempotency proof that a one-time
//! action has been paid. Markers live as long as the user's account and
//! are never deleted.

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, UserId};

/// Idempotency marker for a one-time action
///
/// Unique on `(user_id, action_id)`; inserting a duplicate is how a replay
/// is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub user_id: UserId,
    pub action_id: String,

    /// Amount that was awarded when the marker was created
    pub amount: u64,

    pub created_at: Timestamp,
}

impl CompletionMarker {
    pub fn new(
        user_id: UserId,
        action_id: impl Into<String>,
        amount: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            action_id: action_id.into(),
            amount,
            created_at: now,
        }
    }

    /// Storage key for the uniqueness constraint
    pub fn key(user_id: &UserId, action_id: &str) -> String {
        format!("{}:{}", user_id, action_id)
    }
}

//! Idempotency guard for one-time actions
//!
//! "At most once per user per action, ever" is enforced here: the claim is
//! a storage-level insert-if-absent on the completion marker, so of N
//! concurrent claims for the same pair exactly one is granted.

use std::sync::Arc;

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{CompletionMarker, Timestamp, UserId};

use crate::storage::RewardStorage;

/// Claim check result
///
/// `AlreadyClaimed` is an expected outcome, not an error: callers report
/// it as "already completed" rather than a failure.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The claim was granted; proceed to credit
    Claimed,
    /// The action was already paid for this user
    AlreadyClaimed(CompletionMarker),
}

/// One-time action claim guard
pub struct IdempotencyGuard<S: RewardStorage> {
    storage: Arc<S>,
}

impl<S: RewardStorage> IdempotencyGuard<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Attempt to claim `(user, action)`
    ///
    /// Inserts the completion marker under its uniqueness constraint. A
    /// collision means the action was already paid; the existing marker is
    /// returned so callers can surface when and how much.
    pub async fn try_claim(
        &self,
        user_id: &UserId,
        action_id: &str,
        amount: u64,
        now: Timestamp,
    ) -> LedgerResult<ClaimOutcome> {
        let marker = CompletionMarker::new(user_id.clone(), action_id, amount, now);

        if self.storage.try_insert_marker(&marker).await? {
            tracing::debug!(
                "Claim granted: user={}, action={}",
                user_id,
                action_id
            );
            return Ok(ClaimOutcome::Claimed);
        }

        // Markers are never deleted, so a collision implies the row exists
        let existing = self
            .storage
            .get_marker(user_id, action_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Storage(format!(
                    "completion marker vanished for {}:{}",
                    user_id, action_id
                ))
            })?;

        tracing::debug!(
            "Claim rejected, already paid: user={}, action={}",
            user_id,
            action_id
        );
        Ok(ClaimOutcome::AlreadyClaimed(existing))
    }
}

//! Window counter for capped recurring actions
//!
//! Admission is a storage-level atomic check-and-increment keyed on
//! `(user, action, period)`. Monthly windows additionally roll over
//! inline: when the balance row's reset stamp differs from the current
//! month, the user's stale monthly counters are cleared as part of the
//! admission check itself - there is no background job to go stale.

use std::sync::Arc;

use fuel_core::error::LedgerResult;
use fuel_core::types::{PeriodKey, PeriodKind, Timestamp, UserId};

use crate::storage::{RewardStorage, WindowAdmission};

/// Capped-action admission counter
pub struct WindowCounter<S: RewardStorage> {
    storage: Arc<S>,
}

impl<S: RewardStorage> WindowCounter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Attempt to take an admission slot
    ///
    /// The cap supplied here is authoritative: counters written under an
    /// earlier cap are compared against this one, never re-validated.
    pub async fn try_admit(
        &self,
        user_id: &UserId,
        action_id: &str,
        cap: u32,
        kind: PeriodKind,
        now: Timestamp,
    ) -> LedgerResult<WindowAdmission> {
        if kind == PeriodKind::Monthly {
            self.rollover_if_needed(user_id, now).await?;
        }

        let period_key = PeriodKey::for_kind(kind, now);
        let admission = self
            .storage
            .try_increment_window(user_id, action_id, &period_key, cap, now)
            .await?;

        match &admission {
            WindowAdmission::Admitted { count } => {
                tracing::debug!(
                    "Window admitted: user={}, action={}, period={}, count={}/{}",
                    user_id,
                    action_id,
                    period_key,
                    count,
                    cap
                );
            }
            WindowAdmission::CapReached { current, max } => {
                tracing::debug!(
                    "Window cap reached: user={}, action={}, period={}, count={}/{}",
                    user_id,
                    action_id,
                    period_key,
                    current,
                    max
                );
            }
        }

        Ok(admission)
    }

    /// Clear stale monthly counters when the calendar month has moved on
    /// since the user's last reset.
    async fn rollover_if_needed(&self, user_id: &UserId, now: Timestamp) -> LedgerResult<()> {
        let current_month = PeriodKey::month(now);

        let stale = match self.storage.get_balance(user_id).await? {
            Some(balance) => balance.last_window_reset_period.as_ref() != Some(&current_month),
            None => true,
        };

        if stale {
            self.storage
                .reset_monthly_windows(user_id, &current_month, now)
                .await?;
            tracing::info!(
                "Monthly windows reset: user={}, period={}",
                user_id,
                current_month
            );
        }

        Ok(())
    }
}

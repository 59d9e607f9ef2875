//! User balance
//!
//! One record per user, split into two pools. Both pools are unsigned
//! integers, so non-negativity holds by construction; debits go through
//! checked math and fail instead of wrapping.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::types::{PeriodKey, Pool, Timestamp, UserId};

/// Durable per-user balance record
///
/// Created lazily on first reward or by explicit provisioning. Never
/// hard-deleted: account deletion flips `disabled` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: UserId,

    /// Replenishing pool (periodic allowance)
    pub ephemeral_pool: u64,

    /// Permanent pool (earned rewards, never auto-expires)
    pub permanent_pool: u64,

    /// Month key of the last monthly window-counter reset
    pub last_window_reset_period: Option<PeriodKey>,

    /// Soft-disable flag
    pub disabled: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserBalance {
    /// Fresh zero balance
    pub fn new(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            ephemeral_pool: 0,
            permanent_pool: 0,
            last_window_reset_period: None,
            disabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of the given pool
    pub fn pool(&self, pool: Pool) -> u64 {
        match pool {
            Pool::Ephemeral => self.ephemeral_pool,
            Pool::Permanent => self.permanent_pool,
        }
    }

    /// Apply a signed delta to a pool
    ///
    /// Fails with `BalanceUnderflow` if the delta would push the pool below
    /// zero; the record is left untouched in that case.
    pub fn apply(&mut self, pool: Pool, delta: i64, now: Timestamp) -> LedgerResult<()> {
        let current = self.pool(pool);
        let next = if delta >= 0 {
            current.saturating_add(delta as u64)
        } else {
            current
                .checked_sub(delta.unsigned_abs())
                .ok_or(LedgerError::BalanceUnderflow {
                    pool,
                    balance: current,
                    delta,
                })?
        };

        match pool {
            Pool::Ephemeral => self.ephemeral_pool = next,
            Pool::Permanent => self.permanent_pool = next,
        }
        self.updated_at = now;
        Ok(())
    }

    /// Snapshot of both pools for returning to callers
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            ephemeral: self.ephemeral_pool,
            permanent: self.permanent_pool,
        }
    }
}

/// Point-in-time view of both pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BalanceSnapshot {
    pub ephemeral: u64,
    pub permanent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance() -> UserBalance {
        UserBalance::new(UserId::from("u1"), Timestamp::from_millis(1_000))
    }

    #[test]
    fn test_apply_credit() {
        let mut b = balance();
        b.apply(Pool::Permanent, 100, Timestamp::from_millis(2_000))
            .unwrap();
        assert_eq!(b.permanent_pool, 100);
        assert_eq!(b.ephemeral_pool, 0);
        assert_eq!(b.updated_at, Timestamp::from_millis(2_000));
    }

    #[test]
    fn test_apply_debit() {
        let mut b = balance();
        b.apply(Pool::Ephemeral, 50, Timestamp::from_millis(2_000))
            .unwrap();
        b.apply(Pool::Ephemeral, -20, Timestamp::from_millis(3_000))
            .unwrap();
        assert_eq!(b.ephemeral_pool, 30);
    }

    #[test]
    fn test_underflow_rejected() {
        let mut b = balance();
        b.apply(Pool::Permanent, 10, Timestamp::from_millis(2_000))
            .unwrap();

        let err = b
            .apply(Pool::Permanent, -11, Timestamp::from_millis(3_000))
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceUnderflow { .. }));
        // record untouched
        assert_eq!(b.permanent_pool, 10);
        assert_eq!(b.updated_at, Timestamp::from_millis(2_000));
    }

    #[test]
    fn test_snapshot() {
        let mut b = balance();
        b.apply(Pool::Ephemeral, 5, Timestamp::from_millis(2_000))
            .unwrap();
        b.apply(Pool::Permanent, 7, Timestamp::from_millis(2_000))
            .unwrap();

        let snap = b.snapshot();
        assert_eq!(snap.ephemeral, 5);
        assert_eq!(snap.permanent, 7);
    }
}

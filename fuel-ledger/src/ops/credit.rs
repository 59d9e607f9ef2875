//! Ledger core - the only balance mutation path
//!
//! Every credit increments the targeted pool and appends the matching
//! transaction record as one atomic storage step, so the per-pool log sum
//! always equals the stored balance. All other components merely decide
//! whether to call into here.

use std::sync::Arc;

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{
    digest_to_hex, Pool, Timestamp, TransactionRecord, UserBalance, UserId,
};

use crate::storage::RewardStorage;

/// Atomic credit writer
pub struct LedgerCore<S: RewardStorage> {
    storage: Arc<S>,
}

impl<S: RewardStorage> LedgerCore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Credit `amount` fuel to a pool and log it
    ///
    /// Returns the resulting balance (both pools) so callers can display
    /// totals without a second read. The balance row is created lazily on
    /// first credit.
    pub async fn credit(
        &self,
        user_id: &UserId,
        pool: Pool,
        amount: u64,
        action: &str,
        description: impl Into<String>,
        now: Timestamp,
    ) -> LedgerResult<UserBalance> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }

        self.apply(user_id, pool, amount as i64, action, description, now)
            .await
    }

    /// Apply a signed delta and log it
    ///
    /// Used by the periodic ephemeral refresh, which may debit. Debits
    /// that would underflow are rejected atomically by the store.
    pub async fn apply(
        &self,
        user_id: &UserId,
        pool: Pool,
        delta: i64,
        action: &str,
        description: impl Into<String>,
        now: Timestamp,
    ) -> LedgerResult<UserBalance> {
        if delta == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }

        let tx = TransactionRecord::new(
            user_id.clone(),
            delta,
            pool,
            action,
            description,
            now,
        );

        let balance = self.storage.apply_credit(&tx).await?;

        tracing::debug!(
            "Ledger credit: user={}, pool={}, delta={}, tx={}",
            user_id,
            pool,
            delta,
            &digest_to_hex(&tx.tx_id)[..16]
        );

        Ok(balance)
    }
}

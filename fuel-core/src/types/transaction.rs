//! Transaction records
//!
//! Append-only log of every balance mutation. The per-pool sum of a user's
//! records must equal that pool's stored balance at all times, which makes
//! the log the authoritative source for reconciliation.

use serde::{Deserialize, Serialize};

use crate::types::{generate_tx_id, Pool, Timestamp, TxId, UserId};

/// One immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: TxId,
    pub user_id: UserId,

    /// Signed amount: positive for credits, negative for debits/resets
    pub amount: i64,

    /// Pool the amount was applied to
    pub pool: Pool,

    /// Action type that produced this entry
    pub action: String,

    /// Free-text description for the audit trail
    pub description: String,

    pub created_at: Timestamp,
}

impl TransactionRecord {
    pub fn new(
        user_id: UserId,
        amount: i64,
        pool: Pool,
        action: impl Into<String>,
        description: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            tx_id: generate_tx_id(),
            user_id,
            amount,
            pool,
            action: action.into(),
            description: description.into(),
            created_at: now,
        }
    }
}

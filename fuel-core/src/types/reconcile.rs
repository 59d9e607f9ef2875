//! Reconciliation reports
//!
//! Outcome of an integrity pass comparing the stored balance against the
//! transaction-log sum. The log is authoritative; a report is persisted
//! whenever a correction is applied so no balance changes without an
//! audit trail.

use serde::{Deserialize, Serialize};

use crate::types::{Pool, Timestamp, UserId};

/// Per-pool comparison result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCheck {
    pub pool: Pool,

    /// Sum of transaction amounts for this pool
    pub ledger_sum: i64,

    /// Balance column value at check time
    pub stored: u64,
}

impl PoolCheck {
    pub fn matches(&self) -> bool {
        self.ledger_sum >= 0 && self.ledger_sum as u64 == self.stored
    }
}

/// Result of reconciling one user's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub user_id: UserId,
    pub ephemeral: PoolCheck,
    pub permanent: PoolCheck,

    /// Whether the stored balance was rewritten from the log
    pub corrected: bool,

    pub checked_at: Timestamp,
}

impl ReconcileReport {
    /// Whether both pools matched the log
    pub fn consistent(&self) -> bool {
        self.ephemeral.matches() && self.permanent.matches()
    }
}

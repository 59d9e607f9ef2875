//! Error types for the fuel ledger
//!
//! Admission rejections (already claimed, cap reached, already referred,
//! self referral) are NOT errors - they are typed outcome variants returned
//! by the operations so callers can render a friendly message. Everything
//! in here is either a caller mistake, a storage fault, or an integrity
//! failure.

use thiserror::Error;

use crate::types::Pool;

/// Ledger operation errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Unknown action id - caller mistake, no state touched
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Zero or otherwise unusable credit amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// No balance row exists for the user
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The user's balance is soft-disabled
    #[error("User disabled: {0}")]
    UserDisabled(String),

    /// A debit would push a pool below zero
    #[error("Balance underflow on {pool} pool: balance {balance}, delta {delta}")]
    BalanceUnderflow { pool: Pool, balance: u64, delta: i64 },

    /// Stored balance diverges from the transaction-log sum
    #[error("Integrity mismatch for {user_id} on {pool} pool: ledger sum {ledger_sum}, stored {stored}")]
    IntegrityMismatch {
        user_id: String,
        pool: Pool,
        ledger_sum: i64,
        stored: u64,
    },

    /// Transient storage fault - safe to retry the whole operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl LedgerError {
    /// Whether retrying the whole operation can succeed.
    ///
    /// Admission checks are idempotent, so a retried call is a no-op where
    /// the first attempt already applied.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LedgerError::Storage("timeout".to_string()).is_retryable());
        assert!(!LedgerError::InvalidAction("nope".to_string()).is_retryable());
        assert!(!LedgerError::UserNotFound("u1".to_string()).is_retryable());
    }

    #[test]
    fn test_display_contains_context() {
        let err = LedgerError::IntegrityMismatch {
            user_id: "u1".to_string(),
            pool: Pool::Permanent,
            ledger_sum: 100,
            stored: 90,
        };
        let msg = err.to_string();
        assert!(msg.contains("u1"));
        assert!(msg.contains("100"));
        assert!(msg.contains("90"));
    }
}

//! Balance reconciliation
//!
//! The transaction log is ground truth; the balance row is a derived view
//! that must always equal the per-pool log sums. This pass recomputes the
//! sums, reports drift, and - when asked to repair - rewrites the stored
//! balance from the log. A report is persisted for every correction, so
//! no user-visible balance ever changes without an audit trail entry.

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{PoolCheck, Pool, ReconcileReport, Timestamp, UserId};

use crate::storage::RewardStorage;

/// Compare one user's stored balance against the transaction log
pub async fn reconcile<S: RewardStorage>(
    storage: &S,
    user_id: &UserId,
    repair: bool,
    now: Timestamp,
) -> LedgerResult<ReconcileReport> {
    let mut balance = storage
        .get_balance(user_id)
        .await?
        .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

    let transactions = storage.list_transactions(user_id).await?;
    let mut ephemeral_sum: i64 = 0;
    let mut permanent_sum: i64 = 0;
    for tx in &transactions {
        match tx.pool {
            Pool::Ephemeral => ephemeral_sum += tx.amount,
            Pool::Permanent => permanent_sum += tx.amount,
        }
    }

    let mut report = ReconcileReport {
        user_id: user_id.clone(),
        ephemeral: PoolCheck {
            pool: Pool::Ephemeral,
            ledger_sum: ephemeral_sum,
            stored: balance.ephemeral_pool,
        },
        permanent: PoolCheck {
            pool: Pool::Permanent,
            ledger_sum: permanent_sum,
            stored: balance.permanent_pool,
        },
        corrected: false,
        checked_at: now,
    };

    if report.consistent() {
        return Ok(report);
    }

    for check in [&report.ephemeral, &report.permanent] {
        if !check.matches() {
            tracing::error!(
                "Integrity mismatch: user={}, pool={}, ledger_sum={}, stored={}",
                user_id,
                check.pool,
                check.ledger_sum,
                check.stored
            );
        }
    }

    if repair {
        // A negative log sum cannot be materialized into a balance; that
        // is corruption beyond what this pass can fix.
        if ephemeral_sum < 0 || permanent_sum < 0 {
            let check = if ephemeral_sum < 0 {
                &report.ephemeral
            } else {
                &report.permanent
            };
            return Err(LedgerError::IntegrityMismatch {
                user_id: user_id.to_string(),
                pool: check.pool,
                ledger_sum: check.ledger_sum,
                stored: check.stored,
            });
        }

        balance.ephemeral_pool = ephemeral_sum as u64;
        balance.permanent_pool = permanent_sum as u64;
        balance.updated_at = now;
        storage.save_balance(&balance).await?;

        report.corrected = true;
        tracing::warn!(
            "Balance rebuilt from transaction log: user={}, ephemeral={}, permanent={}",
            user_id,
            ephemeral_sum,
            permanent_sum
        );
    }

    storage.save_reconcile_report(&report).await?;
    Ok(report)
}

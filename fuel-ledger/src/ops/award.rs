//! Award orchestration
//!
//! The public entry point that external collaborators call: resolve the
//! action's rule, run the matching admission check, and credit through the
//! ledger core. The whole call is safe to retry - every admission check is
//! idempotent, and a replayed request settles as a no-op outcome instead
//! of a second payment.

use std::sync::Arc;

use fuel_core::catalog::{ActionCatalog, RewardRule};
use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{BalanceSnapshot, PeriodKind, Pool, Timestamp, UserId};

use crate::ops::credit::LedgerCore;
use crate::ops::idempotency::{ClaimOutcome, IdempotencyGuard};
use crate::ops::window::WindowCounter;
use crate::storage::{RewardStorage, WindowAdmission};

/// Award result
///
/// `AlreadyCompleted` and `CapReached` are expected outcomes, reported
/// distinctly so the caller can render "already completed" or "try again
/// tomorrow" instead of a generic failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardOutcome {
    /// Fuel was credited
    Granted {
        action: String,
        awarded: u64,
        pool: Pool,
        balances: BalanceSnapshot,
    },
    /// One-time action already paid; no credit happened
    AlreadyCompleted {
        action: String,
        pool: Pool,
        balances: BalanceSnapshot,
    },
    /// The rate window for the action is saturated
    CapReached {
        action: String,
        period: PeriodKind,
        current: u32,
        max: u32,
    },
}

/// Run one award request through admission and credit
pub async fn execute_award<S: RewardStorage>(
    catalog: &ActionCatalog,
    storage: &Arc<S>,
    user_id: &UserId,
    action_id: &str,
    description: Option<String>,
    now: Timestamp,
) -> LedgerResult<AwardOutcome> {
    let rule = catalog
        .resolve(action_id)
        .cloned()
        .ok_or_else(|| LedgerError::InvalidAction(action_id.to_string()))?;

    // Soft-disabled accounts are refused before any admission state moves
    if let Some(balance) = storage.get_balance(user_id).await? {
        if balance.disabled {
            return Err(LedgerError::UserDisabled(user_id.to_string()));
        }
    }

    let description =
        description.unwrap_or_else(|| format!("Reward for {}", action_id));
    let core = LedgerCore::new(storage.clone());

    match rule {
        RewardRule::OneTime { amount, pool } => {
            let guard = IdempotencyGuard::new(storage.clone());
            match guard.try_claim(user_id, action_id, amount, now).await? {
                ClaimOutcome::Claimed => {
                    let balance = core
                        .credit(user_id, pool, amount, action_id, description, now)
                        .await?;
                    Ok(AwardOutcome::Granted {
                        action: action_id.to_string(),
                        awarded: amount,
                        pool,
                        balances: balance.snapshot(),
                    })
                }
                ClaimOutcome::AlreadyClaimed(_) => {
                    let balances = storage
                        .get_balance(user_id)
                        .await?
                        .map(|b| b.snapshot())
                        .unwrap_or_default();
                    Ok(AwardOutcome::AlreadyCompleted {
                        action: action_id.to_string(),
                        pool,
                        balances,
                    })
                }
            }
        }

        RewardRule::Recurring {
            amount,
            pool,
            daily_cap,
            monthly_cap,
        } => {
            let windows = WindowCounter::new(storage.clone());

            for (cap, kind) in [
                (daily_cap, PeriodKind::Daily),
                (monthly_cap, PeriodKind::Monthly),
            ] {
                if let Some(cap) = cap {
                    if let WindowAdmission::CapReached { current, max } = windows
                        .try_admit(user_id, action_id, cap, kind, now)
                        .await?
                    {
                        return Ok(AwardOutcome::CapReached {
                            action: action_id.to_string(),
                            period: kind,
                            current,
                            max,
                        });
                    }
                }
            }

            let balance = core
                .credit(user_id, pool, amount, action_id, description, now)
                .await?;
            Ok(AwardOutcome::Granted {
                action: action_id.to_string(),
                awarded: amount,
                pool,
                balances: balance.snapshot(),
            })
        }

        // Referral rewards flow through redemption, not the award call
        RewardRule::Referral { .. } => {
            Err(LedgerError::InvalidAction(action_id.to_string()))
        }
    }
}

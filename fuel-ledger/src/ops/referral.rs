//! Referral attribution
//!
//! Records a referrer/referred relationship exactly once per referred user
//! and settles the rewards for both sides. The referral-record insert is
//! the real uniqueness guard; the payouts reuse the idempotency guard so a
//! retried redemption never double-pays, even when the insert step itself
//! is retried after a partial failure.

use std::sync::Arc;

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{Pool, ReferralRecord, ReferralSide, Timestamp, UserId};

use crate::ops::credit::LedgerCore;
use crate::ops::idempotency::{ClaimOutcome, IdempotencyGuard};
use crate::storage::RewardStorage;

/// Redemption result
///
/// Everything except `Attributed` is an expected business outcome; none of
/// these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// The relationship was recorded (or an earlier recording was settled)
    Attributed {
        referrer_id: UserId,
        /// Fuel paid to the referrer by this call (0 on an idempotent retry)
        referrer_awarded: u64,
        /// Fuel paid to the referred user by this call
        referred_awarded: u64,
    },
    /// The code does not resolve to any referrer
    InvalidCode,
    /// The user already has a referral record under a different redemption
    AlreadyReferred,
    /// Users cannot refer themselves
    SelfReferral,
}

/// Referral redemption pipeline
pub struct ReferralAttributor<S: RewardStorage> {
    storage: Arc<S>,
    guard: IdempotencyGuard<S>,
    core: LedgerCore<S>,
}

impl<S: RewardStorage> ReferralAttributor<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            guard: IdempotencyGuard::new(storage.clone()),
            core: LedgerCore::new(storage.clone()),
            storage,
        }
    }

    /// Redeem a referral code for a newly signed-up user
    pub async fn redeem(
        &self,
        code: &str,
        new_user: &UserId,
        referrer_amount: u64,
        referred_bonus: Option<u64>,
        now: Timestamp,
    ) -> LedgerResult<ReferralOutcome> {
        let referrer = match self.storage.resolve_referral_code(code).await? {
            Some(referrer) => referrer,
            None => return Ok(ReferralOutcome::InvalidCode),
        };

        if referrer == *new_user {
            return Ok(ReferralOutcome::SelfReferral);
        }

        let record = ReferralRecord::new(referrer.clone(), new_user.clone(), code, now);
        if !self.storage.try_insert_referral(&record).await? {
            let existing = self
                .storage
                .get_referral_by_referred(new_user)
                .await?
                .ok_or_else(|| {
                    LedgerError::Storage(format!("referral record missing for {}", new_user))
                })?;

            // A different referrer or code means a genuine second referral
            // attempt. The same pair is a retried redemption: fall through
            // so the guarded payouts can settle anything left unpaid.
            if existing.referrer_id != referrer || existing.code != code {
                tracing::debug!(
                    "Referral rejected, user already referred: user={}",
                    new_user
                );
                return Ok(ReferralOutcome::AlreadyReferred);
            }
        }

        let referrer_awarded = self
            .settle_referrer(&referrer, new_user, referrer_amount, now)
            .await?;

        let referred_awarded = match referred_bonus {
            Some(bonus) => self.settle_referred(&referrer, new_user, bonus, now).await?,
            None => 0,
        };

        tracing::info!(
            "Referral attributed: referrer={}, referred={}, paid={}+{}",
            referrer,
            new_user,
            referrer_awarded,
            referred_awarded
        );

        Ok(ReferralOutcome::Attributed {
            referrer_id: referrer,
            referrer_awarded,
            referred_awarded,
        })
    }

    /// Pay the referrer exactly once per referred user
    async fn settle_referrer(
        &self,
        referrer: &UserId,
        referred: &UserId,
        amount: u64,
        now: Timestamp,
    ) -> LedgerResult<u64> {
        let claim_action = format!("referral:{}", referred);
        match self
            .guard
            .try_claim(referrer, &claim_action, amount, now)
            .await?
        {
            ClaimOutcome::Claimed => {
                self.core
                    .credit(
                        referrer,
                        Pool::Permanent,
                        amount,
                        "referral_signup",
                        format!("Referral reward for signing up {}", referred),
                        now,
                    )
                    .await?;
                self.storage
                    .mark_referral_paid(referred, ReferralSide::Referrer)
                    .await?;
                Ok(amount)
            }
            ClaimOutcome::AlreadyClaimed(_) => Ok(0),
        }
    }

    /// Pay the referred user's signup bonus exactly once
    async fn settle_referred(
        &self,
        referrer: &UserId,
        referred: &UserId,
        bonus: u64,
        now: Timestamp,
    ) -> LedgerResult<u64> {
        let claim_action = format!("referral_bonus:{}", referrer);
        match self
            .guard
            .try_claim(referred, &claim_action, bonus, now)
            .await?
        {
            ClaimOutcome::Claimed => {
                self.core
                    .credit(
                        referred,
                        Pool::Permanent,
                        bonus,
                        "referral_signup",
                        format!("Signup bonus via referral from {}", referrer),
                        now,
                    )
                    .await?;
                self.storage
                    .mark_referral_paid(referred, ReferralSide::Referred)
                    .await?;
                Ok(bonus)
            }
            ClaimOutcome::AlreadyClaimed(_) => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    async fn attributor_with_code(code: &str, referrer: &str) -> ReferralAttributor<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put_referral_code(code, &UserId::from(referrer))
            .await
            .unwrap();
        ReferralAttributor::new(storage)
    }

    #[tokio::test]
    async fn test_invalid_code() {
        let attributor = attributor_with_code("CODE_X", "referrer").await;
        let outcome = attributor
            .redeem("WRONG", &UserId::from("new_user"), 10, None, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(outcome, ReferralOutcome::InvalidCode);
    }

    #[tokio::test]
    async fn test_self_referral_rejected() {
        let attributor = attributor_with_code("CODE_X", "referrer").await;
        let outcome = attributor
            .redeem("CODE_X", &UserId::from("referrer"), 10, None, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(outcome, ReferralOutcome::SelfReferral);
    }

    #[tokio::test]
    async fn test_successful_redemption_pays_both_sides() {
        let attributor = attributor_with_code("CODE_X", "referrer").await;
        let new_user = UserId::from("new_user");

        let outcome = attributor
            .redeem("CODE_X", &new_user, 10, Some(25), Timestamp::now())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReferralOutcome::Attributed {
                referrer_id: UserId::from("referrer"),
                referrer_awarded: 10,
                referred_awarded: 25,
            }
        );

        let referrer_balance = attributor
            .storage
            .get_balance(&UserId::from("referrer"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(referrer_balance.permanent_pool, 10);

        let referred_balance = attributor
            .storage
            .get_balance(&new_user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(referred_balance.permanent_pool, 25);

        let record = attributor
            .storage
            .get_referral_by_referred(&new_user)
            .await
            .unwrap()
            .unwrap();
        assert!(record.referrer_paid);
        assert!(record.referred_paid);
    }

    #[tokio::test]
    async fn test_second_redemption_any_code_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put_referral_code("CODE_A", &UserId::from("a"))
            .await
            .unwrap();
        storage
            .put_referral_code("CODE_B", &UserId::from("b"))
            .await
            .unwrap();
        let attributor = ReferralAttributor::new(storage.clone());
        let new_user = UserId::from("c");

        attributor
            .redeem("CODE_A", &new_user, 10, None, Timestamp::now())
            .await
            .unwrap();

        // same code again and a different code both reject
        let retry_other = attributor
            .redeem("CODE_B", &new_user, 10, None, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(retry_other, ReferralOutcome::AlreadyReferred);

        // the referrer was paid exactly once
        let balance = storage.get_balance(&UserId::from("a")).await.unwrap().unwrap();
        assert_eq!(balance.permanent_pool, 10);
    }

    #[tokio::test]
    async fn test_retried_redemption_is_idempotent() {
        let attributor = attributor_with_code("CODE_X", "referrer").await;
        let new_user = UserId::from("new_user");

        attributor
            .redeem("CODE_X", &new_user, 10, Some(25), Timestamp::now())
            .await
            .unwrap();

        // a full retry of the same redemption settles to zero new payouts
        let retry = attributor
            .redeem("CODE_X", &new_user, 10, Some(25), Timestamp::now())
            .await
            .unwrap();
        assert_eq!(
            retry,
            ReferralOutcome::Attributed {
                referrer_id: UserId::from("referrer"),
                referrer_awarded: 0,
                referred_awarded: 0,
            }
        );

        let balance = attributor
            .storage
            .get_balance(&UserId::from("referrer"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.permanent_pool, 10);
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_pay_once() {
        let attributor = Arc::new(attributor_with_code("CODE_X", "referrer").await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let attributor = attributor.clone();
            handles.push(tokio::spawn(async move {
                attributor
                    .redeem(
                        "CODE_X",
                        &UserId::from("new_user"),
                        10,
                        None,
                        Timestamp::now(),
                    )
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let balance = attributor
            .storage
            .get_balance(&UserId::from("referrer"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.permanent_pool, 10);
    }
}

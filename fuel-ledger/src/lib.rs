//! Fuel Ledger - Reward Engine
//!
//! This crate implements the reward ledger that issues fuel (platform
//! credit) for user actions: social-task completion, referrals, vouching,
//! sharing.
//!
//! # Architecture
//!
//! - **Action Catalog** (`fuel-core`): declarative action-id to rule table
//! - **Idempotency Guard**: one-time actions paid at most once, ever
//! - **Window Counter**: daily/monthly caps with inline monthly rollover
//! - **Referral Attributor**: one referral per referred user, guarded payouts
//! - **Ledger Core**: the only balance mutation path - credit plus
//!   transaction-log append as one atomic step
//! - **Storage**: async trait with in-memory and sled backends; all
//!   uniqueness and cap checks are storage-level atomic operations
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fuel_ledger::{FuelLedger, MemoryStorage};
//! use fuel_core::types::UserId;
//!
//! async fn example() {
//!     let ledger = FuelLedger::new(Arc::new(MemoryStorage::new()));
//!
//!     let outcome = ledger
//!         .award(&UserId::from("user_1"), "github_star", None)
//!         .await
//!         .unwrap();
//!     println!("{:?}", outcome);
//! }
//! ```

pub mod config;
pub mod metrics;
pub mod ops;
pub mod storage;

pub use config::{LedgerConfig, StorageBackend};
pub use metrics::{LedgerMetrics, MetricsSnapshot};
pub use ops::{
    execute_award, AwardOutcome, ClaimOutcome, IdempotencyGuard, LedgerCore, ReferralAttributor,
    ReferralOutcome, WindowCounter,
};
pub use storage::{
    MemoryStorage, RewardStorage, SledStorage, StorageConfig, StorageStats, WindowAdmission,
};

use std::sync::Arc;

use fuel_core::catalog::{ActionCatalog, RewardRule};
use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{
    Pool, ReconcileReport, Timestamp, TransactionRecord, UserBalance, UserId,
};

/// Action id the referral program is configured under in the catalog
pub const REFERRAL_ACTION: &str = "referral_signup";

/// Reward ledger client
///
/// Main interface for award, referral and balance operations. Cheap to
/// share: wrap it in an `Arc` and clone across request handlers.
pub struct FuelLedger<S: RewardStorage> {
    catalog: ActionCatalog,
    storage: Arc<S>,
    metrics: Arc<LedgerMetrics>,
}

impl<S: RewardStorage> FuelLedger<S> {
    /// Create a ledger over the builtin action catalog
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_catalog(storage, ActionCatalog::builtin())
    }

    /// Create a ledger with a custom action catalog
    pub fn with_catalog(storage: Arc<S>, catalog: ActionCatalog) -> Self {
        Self {
            catalog,
            storage,
            metrics: Arc::new(LedgerMetrics::new()),
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn metrics(&self) -> &Arc<LedgerMetrics> {
        &self.metrics
    }

    /// Award fuel for an action
    ///
    /// The public entry point external collaborators call. Replays and
    /// saturated windows come back as distinct outcomes, not errors.
    pub async fn award(
        &self,
        user_id: &UserId,
        action_id: &str,
        description: Option<String>,
    ) -> LedgerResult<AwardOutcome> {
        let result = ops::execute_award(
            &self.catalog,
            &self.storage,
            user_id,
            action_id,
            description,
            Timestamp::now(),
        )
        .await;

        match &result {
            Ok(AwardOutcome::Granted { awarded, .. }) => self.metrics.award_granted(*awarded),
            Ok(AwardOutcome::AlreadyCompleted { .. }) => self.metrics.already_completed(),
            Ok(AwardOutcome::CapReached { period, .. }) => self.metrics.cap_rejected(*period),
            Err(LedgerError::InvalidAction(_)) => self.metrics.invalid_action(),
            Err(_) => {}
        }

        result
    }

    /// Redeem a referral code for a newly signed-up user
    pub async fn redeem_referral(
        &self,
        code: &str,
        new_user: &UserId,
    ) -> LedgerResult<ReferralOutcome> {
        let (referrer_amount, referred_bonus) = match self.catalog.resolve(REFERRAL_ACTION) {
            Some(RewardRule::Referral {
                referrer_amount,
                referred_bonus,
            }) => (*referrer_amount, *referred_bonus),
            _ => return Err(LedgerError::InvalidAction(REFERRAL_ACTION.to_string())),
        };

        let attributor = ReferralAttributor::new(self.storage.clone());
        let result = attributor
            .redeem(code, new_user, referrer_amount, referred_bonus, Timestamp::now())
            .await;

        match &result {
            Ok(ReferralOutcome::Attributed { .. }) => self.metrics.referral_attributed(),
            Ok(_) => self.metrics.referral_rejected(),
            Err(_) => {}
        }

        result
    }

    /// Register a referral code pointing at a referrer
    pub async fn register_referral_code(
        &self,
        referrer: &UserId,
        code: &str,
    ) -> LedgerResult<()> {
        self.storage.put_referral_code(code, referrer).await?;
        tracing::info!("Referral code registered: referrer={}, code={}", referrer, code);
        Ok(())
    }

    /// Read-only snapshot of a user's balance
    pub async fn balance(&self, user_id: &UserId) -> LedgerResult<UserBalance> {
        self.storage
            .get_balance(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// A user's full transaction history, oldest first
    pub async fn transactions(&self, user_id: &UserId) -> LedgerResult<Vec<TransactionRecord>> {
        self.storage.list_transactions(user_id).await
    }

    /// Explicitly provision a balance row, optionally with a starting
    /// ephemeral allowance. Idempotent: an existing row is returned as-is.
    pub async fn provision(
        &self,
        user_id: &UserId,
        initial_ephemeral: u64,
    ) -> LedgerResult<UserBalance> {
        if let Some(existing) = self.storage.get_balance(user_id).await? {
            return Ok(existing);
        }

        let now = Timestamp::now();
        let balance = UserBalance::new(user_id.clone(), now);
        self.storage.save_balance(&balance).await?;

        if initial_ephemeral == 0 {
            return Ok(balance);
        }

        let core = LedgerCore::new(self.storage.clone());
        core.credit(
            user_id,
            Pool::Ephemeral,
            initial_ephemeral,
            "provision",
            "Initial fuel allowance",
            now,
        )
        .await
    }

    /// Reset the ephemeral pool to the given allowance
    ///
    /// The signed delta is written to the transaction log first, so the
    /// per-pool log sum stays equal to the stored balance.
    pub async fn refresh_ephemeral(
        &self,
        user_id: &UserId,
        allowance: u64,
    ) -> LedgerResult<UserBalance> {
        let balance = self.balance(user_id).await?;
        if balance.disabled {
            return Err(LedgerError::UserDisabled(user_id.to_string()));
        }

        let delta = allowance as i64 - balance.ephemeral_pool as i64;
        if delta == 0 {
            return Ok(balance);
        }

        let core = LedgerCore::new(self.storage.clone());
        core.apply(
            user_id,
            Pool::Ephemeral,
            delta,
            "allowance_refresh",
            format!("Ephemeral pool refreshed to {}", allowance),
            Timestamp::now(),
        )
        .await
    }

    /// Soft-disable a user's balance (account deletion)
    pub async fn disable_user(&self, user_id: &UserId) -> LedgerResult<UserBalance> {
        let mut balance = self.balance(user_id).await?;
        balance.disabled = true;
        balance.updated_at = Timestamp::now();
        self.storage.save_balance(&balance).await?;

        tracing::info!("User balance disabled: user={}", user_id);
        Ok(balance)
    }

    /// Run the integrity pass for one user
    pub async fn reconcile(
        &self,
        user_id: &UserId,
        repair: bool,
    ) -> LedgerResult<ReconcileReport> {
        let report =
            ops::reconcile(self.storage.as_ref(), user_id, repair, Timestamp::now()).await?;

        if !report.consistent() {
            self.metrics.integrity_mismatch();
        }
        if report.corrected {
            self.metrics.integrity_corrected();
        }

        Ok(report)
    }

    /// Storage row counts
    pub async fn storage_stats(&self) -> LedgerResult<StorageStats> {
        self.storage.get_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_core::types::BalanceSnapshot;

    fn ledger() -> FuelLedger<MemoryStorage> {
        FuelLedger::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_award_and_balance() {
        let ledger = ledger();
        let user = UserId::from("u1");

        let outcome = ledger.award(&user, "github_star", None).await.unwrap();
        assert!(matches!(outcome, AwardOutcome::Granted { awarded: 100, .. }));

        let balance = ledger.balance(&user).await.unwrap();
        assert_eq!(balance.permanent_pool, 100);

        let snapshot = ledger.metrics().snapshot();
        assert_eq!(snapshot.awards_granted, 1);
        assert_eq!(snapshot.fuel_awarded, 100);
    }

    #[tokio::test]
    async fn test_replay_counts_metric() {
        let ledger = ledger();
        let user = UserId::from("u1");

        ledger.award(&user, "github_star", None).await.unwrap();
        ledger.award(&user, "github_star", None).await.unwrap();

        let snapshot = ledger.metrics().snapshot();
        assert_eq!(snapshot.awards_granted, 1);
        assert_eq!(snapshot.already_completed, 1);
    }

    #[tokio::test]
    async fn test_balance_unknown_user() {
        let ledger = ledger();
        let err = ledger.balance(&UserId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_provision_idempotent() {
        let ledger = ledger();
        let user = UserId::from("u1");

        let first = ledger.provision(&user, 50).await.unwrap();
        assert_eq!(first.ephemeral_pool, 50);

        // a second provision call does not add more fuel
        let second = ledger.provision(&user, 50).await.unwrap();
        assert_eq!(second.ephemeral_pool, 50);

        let log = ledger.transactions(&user).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_ephemeral_keeps_log_consistent() {
        let ledger = ledger();
        let user = UserId::from("u1");

        ledger.provision(&user, 50).await.unwrap();
        ledger.award(&user, "career_page_visit", None).await.unwrap();

        let refreshed = ledger.refresh_ephemeral(&user, 50).await.unwrap();
        assert_eq!(refreshed.ephemeral_pool, 50);

        let report = ledger.reconcile(&user, false).await.unwrap();
        assert!(report.consistent());
    }

    #[tokio::test]
    async fn test_disable_then_award_refused() {
        let ledger = ledger();
        let user = UserId::from("u1");

        ledger.provision(&user, 0).await.unwrap();
        ledger.disable_user(&user).await.unwrap();

        let err = ledger.award(&user, "github_star", None).await.unwrap_err();
        assert!(matches!(err, LedgerError::UserDisabled(_)));
    }

    #[tokio::test]
    async fn test_referral_end_to_end() {
        let ledger = ledger();
        let referrer = UserId::from("referrer");
        let new_user = UserId::from("new_user");

        ledger.register_referral_code(&referrer, "CODE_X").await.unwrap();

        let outcome = ledger.redeem_referral("CODE_X", &new_user).await.unwrap();
        assert_eq!(
            outcome,
            ReferralOutcome::Attributed {
                referrer_id: referrer.clone(),
                referrer_awarded: 10,
                referred_awarded: 25,
            }
        );

        assert_eq!(
            ledger.balance(&referrer).await.unwrap().snapshot(),
            BalanceSnapshot {
                ephemeral: 0,
                permanent: 10
            }
        );
    }

    #[tokio::test]
    async fn test_reconcile_after_awards() {
        let ledger = ledger();
        let user = UserId::from("u1");

        ledger.award(&user, "github_star", None).await.unwrap();
        for _ in 0..3 {
            ledger.award(&user, "job_share", None).await.unwrap();
        }

        let report = ledger.reconcile(&user, false).await.unwrap();
        assert!(report.consistent());
        assert_eq!(report.permanent.ledger_sum, 115);
    }
}

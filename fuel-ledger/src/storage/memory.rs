//! In-memory storage implementation
//!
//! Backend for tests and development. All tables live behind a single
//! `RwLock` so that each guarded check-and-write in the trait holds the
//! write lock for the whole step - the admission checks span tables and
//! must be atomic with respect to concurrent callers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{
    CompletionMarker, PeriodKey, ReconcileReport, ReferralRecord, ReferralSide, Timestamp,
    TransactionRecord, UserBalance, UserId, WindowCount,
};

use super::{RewardStorage, StorageStats, WindowAdmission};

#[derive(Debug, Default)]
struct Inner {
    balances: HashMap<UserId, UserBalance>,
    /// Transaction log per user, append order preserved
    transactions: HashMap<UserId, Vec<TransactionRecord>>,
    /// Keyed by `CompletionMarker::key`
    markers: HashMap<String, CompletionMarker>,
    /// Keyed by `WindowCount::key`
    windows: HashMap<String, WindowCount>,
    /// Keyed by referred user
    referrals: HashMap<UserId, ReferralRecord>,
    /// Code to referrer
    codes: HashMap<String, UserId>,
    reconciles: Vec<ReconcileReport>,
}

/// Thread-safe in-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all data
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

/// Monthly period keys are `YYYY-MM`; daily keys are `YYYY-MM-DD`
fn is_month_key(key: &PeriodKey) -> bool {
    key.as_str().len() == 7
}

#[async_trait]
impl RewardStorage for MemoryStorage {
    // ==================== Balance operations ====================

    async fn get_balance(&self, user_id: &UserId) -> LedgerResult<Option<UserBalance>> {
        let inner = self.inner.read().await;
        Ok(inner.balances.get(user_id).cloned())
    }

    async fn save_balance(&self, balance: &UserBalance) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .balances
            .insert(balance.user_id.clone(), balance.clone());
        Ok(())
    }

    async fn apply_credit(&self, tx: &TransactionRecord) -> LedgerResult<UserBalance> {
        let mut inner = self.inner.write().await;

        let mut balance = inner
            .balances
            .get(&tx.user_id)
            .cloned()
            .unwrap_or_else(|| UserBalance::new(tx.user_id.clone(), tx.created_at));

        if balance.disabled {
            return Err(LedgerError::UserDisabled(tx.user_id.to_string()));
        }

        balance.apply(tx.pool, tx.amount, tx.created_at)?;

        // Both writes under the same lock guard: all-or-nothing
        inner
            .balances
            .insert(tx.user_id.clone(), balance.clone());
        inner
            .transactions
            .entry(tx.user_id.clone())
            .or_default()
            .push(tx.clone());

        Ok(balance)
    }

    // ==================== Transaction log ====================

    async fn list_transactions(&self, user_id: &UserId) -> LedgerResult<Vec<TransactionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.get(user_id).cloned().unwrap_or_default())
    }

    // ==================== Completion markers ====================

    async fn try_insert_marker(&self, marker: &CompletionMarker) -> LedgerResult<bool> {
        let mut inner = self.inner.write().await;
        let key = CompletionMarker::key(&marker.user_id, &marker.action_id);

        if inner.markers.contains_key(&key) {
            return Ok(false);
        }
        inner.markers.insert(key, marker.clone());
        Ok(true)
    }

    async fn get_marker(
        &self,
        user_id: &UserId,
        action_id: &str,
    ) -> LedgerResult<Option<CompletionMarker>> {
        let inner = self.inner.read().await;
        Ok(inner
            .markers
            .get(&CompletionMarker::key(user_id, action_id))
            .cloned())
    }

    // ==================== Window counts ====================

    async fn try_increment_window(
        &self,
        user_id: &UserId,
        action_id: &str,
        period_key: &PeriodKey,
        cap: u32,
        now: Timestamp,
    ) -> LedgerResult<WindowAdmission> {
        let mut inner = self.inner.write().await;
        let key = WindowCount::key(user_id, action_id, period_key);

        match inner.windows.get_mut(&key) {
            Some(window) => {
                if window.count >= cap {
                    return Ok(WindowAdmission::CapReached {
                        current: window.count,
                        max: cap,
                    });
                }
                window.count += 1;
                window.updated_at = now;
                Ok(WindowAdmission::Admitted {
                    count: window.count,
                })
            }
            None => {
                if cap == 0 {
                    return Ok(WindowAdmission::CapReached {
                        current: 0,
                        max: 0,
                    });
                }
                inner.windows.insert(
                    key,
                    WindowCount::first(user_id.clone(), action_id, period_key.clone(), now),
                );
                Ok(WindowAdmission::Admitted { count: 1 })
            }
        }
    }

    async fn get_window_count(
        &self,
        user_id: &UserId,
        action_id: &str,
        period_key: &PeriodKey,
    ) -> LedgerResult<Option<u32>> {
        let inner = self.inner.read().await;
        Ok(inner
            .windows
            .get(&WindowCount::key(user_id, action_id, period_key))
            .map(|w| w.count))
    }

    async fn reset_monthly_windows(
        &self,
        user_id: &UserId,
        current_month: &PeriodKey,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;

        inner.windows.retain(|_, w| {
            !(w.user_id == *user_id && is_month_key(&w.period_key) && w.period_key != *current_month)
        });

        let balance = inner
            .balances
            .entry(user_id.clone())
            .or_insert_with(|| UserBalance::new(user_id.clone(), now));
        balance.last_window_reset_period = Some(current_month.clone());
        balance.updated_at = now;

        Ok(())
    }

    // ==================== Referrals ====================

    async fn try_insert_referral(&self, record: &ReferralRecord) -> LedgerResult<bool> {
        let mut inner = self.inner.write().await;

        if inner.referrals.contains_key(&record.referred_id) {
            return Ok(false);
        }
        inner
            .referrals
            .insert(record.referred_id.clone(), record.clone());
        Ok(true)
    }

    async fn get_referral_by_referred(
        &self,
        referred_id: &UserId,
    ) -> LedgerResult<Option<ReferralRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.referrals.get(referred_id).cloned())
    }

    async fn mark_referral_paid(
        &self,
        referred_id: &UserId,
        side: ReferralSide,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner.referrals.get_mut(referred_id).ok_or_else(|| {
            LedgerError::Storage(format!("referral record missing for {}", referred_id))
        })?;
        record.mark_paid(side);
        Ok(())
    }

    // ==================== Referral codes ====================

    async fn put_referral_code(&self, code: &str, referrer_id: &UserId) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;
        inner.codes.insert(code.to_string(), referrer_id.clone());
        Ok(())
    }

    async fn resolve_referral_code(&self, code: &str) -> LedgerResult<Option<UserId>> {
        let inner = self.inner.read().await;
        Ok(inner.codes.get(code).cloned())
    }

    // ==================== Reconcile reports ====================

    async fn save_reconcile_report(&self, report: &ReconcileReport) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;
        inner.reconciles.push(report.clone());
        Ok(())
    }

    // ==================== Stats ====================

    async fn get_stats(&self) -> LedgerResult<StorageStats> {
        let inner = self.inner.read().await;
        Ok(StorageStats {
            balances: inner.balances.len() as u64,
            disabled_balances: inner.balances.values().filter(|b| b.disabled).count() as u64,
            transactions: inner.transactions.values().map(|v| v.len() as u64).sum(),
            markers: inner.markers.len() as u64,
            windows: inner.windows.len() as u64,
            referrals: inner.referrals.len() as u64,
            referral_codes: inner.codes.len() as u64,
            reconcile_reports: inner.reconciles.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_core::types::Pool;

    fn tx(user: &str, amount: i64, pool: Pool) -> TransactionRecord {
        TransactionRecord::new(
            UserId::from(user),
            amount,
            pool,
            "test_action",
            "test",
            Timestamp::from_millis(1_000),
        )
    }

    #[tokio::test]
    async fn test_apply_credit_creates_balance() {
        let storage = MemoryStorage::new();

        let balance = storage.apply_credit(&tx("u1", 100, Pool::Permanent)).await.unwrap();
        assert_eq!(balance.permanent_pool, 100);

        let log = storage.list_transactions(&UserId::from("u1")).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].amount, 100);
    }

    #[tokio::test]
    async fn test_apply_credit_underflow_writes_nothing() {
        let storage = MemoryStorage::new();
        storage.apply_credit(&tx("u1", 10, Pool::Ephemeral)).await.unwrap();

        let err = storage
            .apply_credit(&tx("u1", -20, Pool::Ephemeral))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceUnderflow { .. }));

        let balance = storage.get_balance(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(balance.ephemeral_pool, 10);
        let log = storage.list_transactions(&UserId::from("u1")).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_credit_disabled_user() {
        let storage = MemoryStorage::new();
        let mut balance = UserBalance::new(UserId::from("u1"), Timestamp::from_millis(1));
        balance.disabled = true;
        storage.save_balance(&balance).await.unwrap();

        let err = storage
            .apply_credit(&tx("u1", 100, Pool::Permanent))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UserDisabled(_)));
    }

    #[tokio::test]
    async fn test_marker_insert_if_absent() {
        let storage = MemoryStorage::new();
        let marker = CompletionMarker::new(
            UserId::from("u1"),
            "github_star",
            100,
            Timestamp::from_millis(1_000),
        );

        assert!(storage.try_insert_marker(&marker).await.unwrap());
        assert!(!storage.try_insert_marker(&marker).await.unwrap());

        let stored = storage
            .get_marker(&UserId::from("u1"), "github_star")
            .await
            .unwrap();
        assert_eq!(stored.unwrap().amount, 100);
    }

    #[tokio::test]
    async fn test_window_increment_to_cap() {
        let storage = MemoryStorage::new();
        let user = UserId::from("u1");
        let period = PeriodKey("2026-08-07".to_string());

        for expected in 1..=3u32 {
            let admission = storage
                .try_increment_window(&user, "job_share", &period, 3, Timestamp::now())
                .await
                .unwrap();
            assert_eq!(admission, WindowAdmission::Admitted { count: expected });
        }

        let admission = storage
            .try_increment_window(&user, "job_share", &period, 3, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(admission, WindowAdmission::CapReached { current: 3, max: 3 });
    }

    #[tokio::test]
    async fn test_window_concurrent_never_overshoots() {
        let storage = Arc::new(MemoryStorage::new());
        let user = UserId::from("u1");
        let period = PeriodKey("2026-08-07".to_string());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let storage = storage.clone();
            let user = user.clone();
            let period = period.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .try_increment_window(&user, "job_share", &period, 5, Timestamp::now())
                    .await
                    .unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), WindowAdmission::Admitted { .. }) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);

        let count = storage
            .get_window_count(&user, "job_share", &period)
            .await
            .unwrap();
        assert_eq!(count, Some(5));
    }

    #[tokio::test]
    async fn test_reset_monthly_windows_keeps_daily() {
        let storage = MemoryStorage::new();
        let user = UserId::from("u1");
        let old_month = PeriodKey("2026-07".to_string());
        let day = PeriodKey("2026-08-07".to_string());
        let new_month = PeriodKey("2026-08".to_string());

        storage
            .try_increment_window(&user, "vouch_sent", &old_month, 5, Timestamp::now())
            .await
            .unwrap();
        storage
            .try_increment_window(&user, "job_share", &day, 5, Timestamp::now())
            .await
            .unwrap();

        storage
            .reset_monthly_windows(&user, &new_month, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(
            storage
                .get_window_count(&user, "vouch_sent", &old_month)
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            storage.get_window_count(&user, "job_share", &day).await.unwrap(),
            Some(1)
        );

        let balance = storage.get_balance(&user).await.unwrap().unwrap();
        assert_eq!(balance.last_window_reset_period, Some(new_month));
    }

    #[tokio::test]
    async fn test_referral_unique_on_referred() {
        let storage = MemoryStorage::new();
        let first = ReferralRecord::new(
            UserId::from("a"),
            UserId::from("c"),
            "CODE_A",
            Timestamp::from_millis(1_000),
        );
        let second = ReferralRecord::new(
            UserId::from("b"),
            UserId::from("c"),
            "CODE_B",
            Timestamp::from_millis(2_000),
        );

        assert!(storage.try_insert_referral(&first).await.unwrap());
        assert!(!storage.try_insert_referral(&second).await.unwrap());

        let stored = storage
            .get_referral_by_referred(&UserId::from("c"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.referrer_id, UserId::from("a"));
    }

    #[tokio::test]
    async fn test_referral_codes() {
        let storage = MemoryStorage::new();
        storage
            .put_referral_code("CODE_X", &UserId::from("referrer"))
            .await
            .unwrap();

        assert_eq!(
            storage.resolve_referral_code("CODE_X").await.unwrap(),
            Some(UserId::from("referrer"))
        );
        assert_eq!(storage.resolve_referral_code("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats() {
        let storage = MemoryStorage::new();
        storage.apply_credit(&tx("u1", 100, Pool::Permanent)).await.unwrap();
        storage.apply_credit(&tx("u1", 5, Pool::Ephemeral)).await.unwrap();

        let stats = storage.get_stats().await.unwrap();
        assert_eq!(stats.balances, 1);
        assert_eq!(stats.transactions, 2);
    }
}

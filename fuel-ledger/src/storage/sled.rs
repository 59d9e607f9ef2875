//! Sled persistent storage implementation
//!
//! Durable backend on the Sled embedded database. The uniqueness
//! constraints the admission checks rely on are enforced at the storage
//! level: `compare_and_swap` for insert-if-absent (markers, referrals)
//! and serializable transactions for check-and-increment and for the
//! balance-plus-log credit.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Transactional;

use fuel_core::error::{LedgerError, LedgerResult};
use fuel_core::types::{
    digest_to_hex, CompletionMarker, PeriodKey, ReconcileReport, ReferralRecord, ReferralSide,
    Timestamp, TransactionRecord, UserBalance, UserId, WindowCount,
};

use super::{RewardStorage, StorageConfig, StorageStats, WindowAdmission};

/// Tree name constants
const BALANCES_TREE: &str = "balances";
const TRANSACTIONS_TREE: &str = "transactions";
const MARKERS_TREE: &str = "markers";
const WINDOWS_TREE: &str = "windows";
const REFERRALS_TREE: &str = "referrals";
const CODES_TREE: &str = "referral_codes";
const RECONCILES_TREE: &str = "reconciles";

/// Sled-backed reward storage
#[derive(Debug, Clone)]
pub struct SledStorage {
    db: sled::Db,
    balances: sled::Tree,
    transactions: sled::Tree,
    markers: sled::Tree,
    windows: sled::Tree,
    referrals: sled::Tree,
    codes: sled::Tree,
    reconciles: sled::Tree,
}

impl SledStorage {
    /// Open storage from configuration. An empty data dir opens a
    /// temporary database (test mode).
    pub fn new(config: &StorageConfig) -> LedgerResult<Self> {
        let sled_config = if config.data_dir.is_empty() {
            sled::Config::new().temporary(true)
        } else {
            sled::Config::new()
                .path(&config.data_dir)
                .cache_capacity(config.cache_size)
        };

        let db = sled_config
            .open()
            .map_err(|e| LedgerError::Storage(format!("Failed to open sled db: {}", e)))?;
        Self::from_db(db)
    }

    /// Open or create a Sled database at the given path
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> LedgerResult<Self> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::Storage(format!("Failed to open sled db: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> LedgerResult<Self> {
        let open_tree = |name: &str| {
            db.open_tree(name)
                .map_err(|e| LedgerError::Storage(format!("Failed to open {} tree: {}", name, e)))
        };

        Ok(Self {
            balances: open_tree(BALANCES_TREE)?,
            transactions: open_tree(TRANSACTIONS_TREE)?,
            markers: open_tree(MARKERS_TREE)?,
            windows: open_tree(WINDOWS_TREE)?,
            referrals: open_tree(REFERRALS_TREE)?,
            codes: open_tree(CODES_TREE)?,
            reconciles: open_tree(RECONCILES_TREE)?,
            db,
        })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> LedgerResult<()> {
        self.db
            .flush()
            .map_err(|e| LedgerError::Storage(format!("Failed to flush db: {}", e)))?;
        Ok(())
    }

    // ==================== Helpers ====================

    fn serialize<T: Serialize>(value: &T) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> LedgerResult<T> {
        serde_json::from_slice(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Transaction-log key: user prefix, then millisecond timestamp and a
    /// tx-id fragment so a prefix scan yields chronological order
    fn tx_key(tx: &TransactionRecord) -> Vec<u8> {
        format!(
            "{}|{:016x}|{}",
            tx.user_id,
            tx.created_at.as_millis(),
            &digest_to_hex(&tx.tx_id)[..16]
        )
        .into_bytes()
    }

    fn storage_err(context: &str, e: impl std::fmt::Display) -> LedgerError {
        LedgerError::Storage(format!("{}: {}", context, e))
    }

    /// Monthly period keys are `YYYY-MM`; daily keys are `YYYY-MM-DD`
    fn is_month_key(key: &PeriodKey) -> bool {
        key.as_str().len() == 7
    }
}

#[async_trait]
impl RewardStorage for SledStorage {
    // ==================== Balance operations ====================

    async fn get_balance(&self, user_id: &UserId) -> LedgerResult<Option<UserBalance>> {
        let raw = self
            .balances
            .get(user_id.as_str().as_bytes())
            .map_err(|e| Self::storage_err("Failed to get balance", e))?;
        raw.map(|bytes| Self::deserialize(&bytes)).transpose()
    }

    async fn save_balance(&self, balance: &UserBalance) -> LedgerResult<()> {
        let value = Self::serialize(balance)?;
        self.balances
            .insert(balance.user_id.as_str().as_bytes(), value)
            .map_err(|e| Self::storage_err("Failed to save balance", e))?;
        Ok(())
    }

    async fn apply_credit(&self, tx: &TransactionRecord) -> LedgerResult<UserBalance> {
        let balance_key = tx.user_id.as_str().as_bytes().to_vec();
        let tx_key = Self::tx_key(tx);

        let result = (&self.balances, &self.transactions).transaction(
            |(balances, txlog)| -> ConflictableTransactionResult<UserBalance, LedgerError> {
                let mut balance = match balances.get(&balance_key)? {
                    Some(raw) => Self::deserialize::<UserBalance>(&raw)
                        .map_err(ConflictableTransactionError::Abort)?,
                    None => UserBalance::new(tx.user_id.clone(), tx.created_at),
                };

                if balance.disabled {
                    return Err(ConflictableTransactionError::Abort(
                        LedgerError::UserDisabled(tx.user_id.to_string()),
                    ));
                }

                balance
                    .apply(tx.pool, tx.amount, tx.created_at)
                    .map_err(ConflictableTransactionError::Abort)?;

                let balance_raw = Self::serialize(&balance)
                    .map_err(ConflictableTransactionError::Abort)?;
                let tx_raw =
                    Self::serialize(tx).map_err(ConflictableTransactionError::Abort)?;

                balances.insert(balance_key.as_slice(), balance_raw)?;
                txlog.insert(tx_key.as_slice(), tx_raw)?;

                Ok(balance)
            },
        );

        match result {
            Ok(balance) => Ok(balance),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => {
                Err(Self::storage_err("Credit transaction failed", e))
            }
        }
    }

    // ==================== Transaction log ====================

    async fn list_transactions(&self, user_id: &UserId) -> LedgerResult<Vec<TransactionRecord>> {
        let prefix = format!("{}|", user_id);
        let mut records = Vec::new();

        for item in self.transactions.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item.map_err(|e| Self::storage_err("Failed to scan transactions", e))?;
            records.push(Self::deserialize(&raw)?);
        }

        Ok(records)
    }

    // ==================== Completion markers ====================

    async fn try_insert_marker(&self, marker: &CompletionMarker) -> LedgerResult<bool> {
        let key = CompletionMarker::key(&marker.user_id, &marker.action_id);
        let value = Self::serialize(marker)?;

        let outcome = self
            .markers
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(|e| Self::storage_err("Failed to insert marker", e))?;

        Ok(outcome.is_ok())
    }

    async fn get_marker(
        &self,
        user_id: &UserId,
        action_id: &str,
    ) -> LedgerResult<Option<CompletionMarker>> {
        let key = CompletionMarker::key(user_id, action_id);
        let raw = self
            .markers
            .get(key.as_bytes())
            .map_err(|e| Self::storage_err("Failed to get marker", e))?;
        raw.map(|bytes| Self::deserialize(&bytes)).transpose()
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
        let key = WindowCount::key(user_id, action_id, period_key);

        let result = self.windows.transaction(
            |tree| -> ConflictableTransactionResult<WindowAdmission, LedgerError> {
                match tree.get(key.as_bytes())? {
                    Some(raw) => {
                        let mut window: WindowCount = Self::deserialize(&raw)
                            .map_err(ConflictableTransactionError::Abort)?;
                        if window.count >= cap {
                            return Ok(WindowAdmission::CapReached {
                                current: window.count,
                                max: cap,
                            });
                        }
                        window.count += 1;
                        window.updated_at = now;
                        let raw = Self::serialize(&window)
                            .map_err(ConflictableTransactionError::Abort)?;
                        tree.insert(key.as_bytes(), raw)?;
                        Ok(WindowAdmission::Admitted {
                            count: window.count,
                        })
                    }
                    None => {
                        if cap == 0 {
                            return Ok(WindowAdmission::CapReached { current: 0, max: 0 });
                        }
                        let window = WindowCount::first(
                            user_id.clone(),
                            action_id,
                            period_key.clone(),
                            now,
                        );
                        let raw = Self::serialize(&window)
                            .map_err(ConflictableTransactionError::Abort)?;
                        tree.insert(key.as_bytes(), raw)?;
                        Ok(WindowAdmission::Admitted { count: 1 })
                    }
                }
            },
        );

        match result {
            Ok(admission) => Ok(admission),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => {
                Err(Self::storage_err("Window transaction failed", e))
            }
        }
    }

    async fn get_window_count(
        &self,
        user_id: &UserId,
        action_id: &str,
        period_key: &PeriodKey,
    ) -> LedgerResult<Option<u32>> {
        let key = WindowCount::key(user_id, action_id, period_key);
        let raw = self
            .windows
            .get(key.as_bytes())
            .map_err(|e| Self::storage_err("Failed to get window", e))?;
        Ok(raw
            .map(|bytes| Self::deserialize::<WindowCount>(&bytes))
            .transpose()?
            .map(|w| w.count))
    }

    async fn reset_monthly_windows(
        &self,
        user_id: &UserId,
        current_month: &PeriodKey,
        now: Timestamp,
    ) -> LedgerResult<()> {
        // Collect stale monthly keys outside the transaction; admissions
        // only ever write the current month, so the stale set cannot grow
        // concurrently.
        let prefix = format!("{}:", user_id);
        let mut stale_keys = Vec::new();

        for item in self.windows.scan_prefix(prefix.as_bytes()) {
            let (key, raw) = item.map_err(|e| Self::storage_err("Failed to scan windows", e))?;
            let window: WindowCount = Self::deserialize(&raw)?;
            if window.user_id == *user_id
                && Self::is_month_key(&window.period_key)
                && window.period_key != *current_month
            {
                stale_keys.push(key.to_vec());
            }
        }

        let balance_key = user_id.as_str().as_bytes().to_vec();

        let result = (&self.balances, &self.windows).transaction(
            |(balances, windows)| -> ConflictableTransactionResult<(), LedgerError> {
                for key in &stale_keys {
                    windows.remove(key.as_slice())?;
                }

                let mut balance = match balances.get(&balance_key)? {
                    Some(raw) => Self::deserialize::<UserBalance>(&raw)
                        .map_err(ConflictableTransactionError::Abort)?,
                    None => UserBalance::new(user_id.clone(), now),
                };
                balance.last_window_reset_period = Some(current_month.clone());
                balance.updated_at = now;

                let raw = Self::serialize(&balance)
                    .map_err(ConflictableTransactionError::Abort)?;
                balances.insert(balance_key.as_slice(), raw)?;

                Ok(())
            },
        );

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => {
                Err(Self::storage_err("Rollover transaction failed", e))
            }
        }
    }

    // ==================== Referrals ====================

    async fn try_insert_referral(&self, record: &ReferralRecord) -> LedgerResult<bool> {
        let value = Self::serialize(record)?;

        let outcome = self
            .referrals
            .compare_and_swap(
                record.referred_id.as_str().as_bytes(),
                None as Option<&[u8]>,
                Some(value),
            )
            .map_err(|e| Self::storage_err("Failed to insert referral", e))?;

        Ok(outcome.is_ok())
    }

    async fn get_referral_by_referred(
        &self,
        referred_id: &UserId,
    ) -> LedgerResult<Option<ReferralRecord>> {
        let raw = self
            .referrals
            .get(referred_id.as_str().as_bytes())
            .map_err(|e| Self::storage_err("Failed to get referral", e))?;
        raw.map(|bytes| Self::deserialize(&bytes)).transpose()
    }

    async fn mark_referral_paid(
        &self,
        referred_id: &UserId,
        side: ReferralSide,
    ) -> LedgerResult<()> {
        let key = referred_id.as_str().as_bytes().to_vec();

        let result = self.referrals.transaction(
            |tree| -> ConflictableTransactionResult<(), LedgerError> {
                let raw = tree.get(&key)?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(LedgerError::Storage(format!(
                        "referral record missing for {}",
                        referred_id
                    )))
                })?;

                let mut record: ReferralRecord =
                    Self::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
                record.mark_paid(side);

                let raw =
                    Self::serialize(&record).map_err(ConflictableTransactionError::Abort)?;
                tree.insert(key.as_slice(), raw)?;
                Ok(())
            },
        );

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => {
                Err(Self::storage_err("Referral update failed", e))
            }
        }
    }

    // ==================== Referral codes ====================

    async fn put_referral_code(&self, code: &str, referrer_id: &UserId) -> LedgerResult<()> {
        self.codes
            .insert(code.as_bytes(), referrer_id.as_str().as_bytes())
            .map_err(|e| Self::storage_err("Failed to put referral code", e))?;
        Ok(())
    }

    async fn resolve_referral_code(&self, code: &str) -> LedgerResult<Option<UserId>> {
        let raw = self
            .codes
            .get(code.as_bytes())
            .map_err(|e| Self::storage_err("Failed to resolve referral code", e))?;
        Ok(raw.map(|bytes| UserId::new(String::from_utf8_lossy(&bytes).to_string())))
    }

    // ==================== Reconcile reports ====================

    async fn save_reconcile_report(&self, report: &ReconcileReport) -> LedgerResult<()> {
        let key = format!("{}|{:016x}", report.user_id, report.checked_at.as_millis());
        let value = Self::serialize(report)?;
        self.reconciles
            .insert(key.as_bytes(), value)
            .map_err(|e| Self::storage_err("Failed to save reconcile report", e))?;
        Ok(())
    }

    // ==================== Stats ====================

    async fn get_stats(&self) -> LedgerResult<StorageStats> {
        let mut disabled = 0u64;
        for item in self.balances.iter() {
            let (_, raw) = item.map_err(|e| Self::storage_err("Failed to scan balances", e))?;
            let balance: UserBalance = Self::deserialize(&raw)?;
            if balance.disabled {
                disabled += 1;
            }
        }

        Ok(StorageStats {
            balances: self.balances.len() as u64,
            disabled_balances: disabled,
            transactions: self.transactions.len() as u64,
            markers: self.markers.len() as u64,
            windows: self.windows.len() as u64,
            referrals: self.referrals.len() as u64,
            referral_codes: self.codes.len() as u64,
            reconcile_reports: self.reconciles.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_core::types::Pool;

    fn temp_storage() -> SledStorage {
        SledStorage::new(&StorageConfig::test()).unwrap()
    }

    fn tx(user: &str, amount: i64, pool: Pool, at: u64) -> TransactionRecord {
        TransactionRecord::new(
            UserId::from(user),
            amount,
            pool,
            "test_action",
            "test",
            Timestamp::from_millis(at),
        )
    }

    #[tokio::test]
    async fn test_credit_and_log_atomicity() {
        let storage = temp_storage();

        let balance = storage
            .apply_credit(&tx("u1", 100, Pool::Permanent, 1_000))
            .await
            .unwrap();
        assert_eq!(balance.permanent_pool, 100);

        let log = storage.list_transactions(&UserId::from("u1")).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].amount, 100);
    }

    #[tokio::test]
    async fn test_underflow_aborts_whole_transaction() {
        let storage = temp_storage();
        storage
            .apply_credit(&tx("u1", 10, Pool::Ephemeral, 1_000))
            .await
            .unwrap();

        let err = storage
            .apply_credit(&tx("u1", -20, Pool::Ephemeral, 2_000))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceUnderflow { .. }));

        // neither the balance nor the log moved
        let balance = storage.get_balance(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(balance.ephemeral_pool, 10);
        let log = storage.list_transactions(&UserId::from("u1")).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_transactions_chronological() {
        let storage = temp_storage();
        storage
            .apply_credit(&tx("u1", 1, Pool::Permanent, 3_000))
            .await
            .unwrap();
        storage
            .apply_credit(&tx("u1", 2, Pool::Permanent, 1_000))
            .await
            .unwrap();
        storage
            .apply_credit(&tx("u1", 3, Pool::Permanent, 2_000))
            .await
            .unwrap();

        let log = storage.list_transactions(&UserId::from("u1")).await.unwrap();
        let amounts: Vec<i64> = log.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_marker_cas() {
        let storage = temp_storage();
        let marker = CompletionMarker::new(
            UserId::from("u1"),
            "github_star",
            100,
            Timestamp::from_millis(1_000),
        );

        assert!(storage.try_insert_marker(&marker).await.unwrap());
        assert!(!storage.try_insert_marker(&marker).await.unwrap());
    }

    #[tokio::test]
    async fn test_window_cap_under_transaction() {
        let storage = temp_storage();
        let user = UserId::from("u1");
        let period = PeriodKey("2026-08-07".to_string());

        for _ in 0..5 {
            let admission = storage
                .try_increment_window(&user, "job_share", &period, 5, Timestamp::now())
                .await
                .unwrap();
            assert!(matches!(admission, WindowAdmission::Admitted { .. }));
        }

        let admission = storage
            .try_increment_window(&user, "job_share", &period, 5, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(admission, WindowAdmission::CapReached { current: 5, max: 5 });
    }

    #[tokio::test]
    async fn test_monthly_rollover() {
        let storage = temp_storage();
        let user = UserId::from("u1");
        let old_month = PeriodKey("2026-07".to_string());
        let new_month = PeriodKey("2026-08".to_string());
        let day = PeriodKey("2026-08-07".to_string());

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
    async fn test_referral_cas_and_flags() {
        let storage = temp_storage();
        let record = ReferralRecord::new(
            UserId::from("a"),
            UserId::from("c"),
            "CODE_A",
            Timestamp::from_millis(1_000),
        );

        assert!(storage.try_insert_referral(&record).await.unwrap());
        let dup = ReferralRecord::new(
            UserId::from("b"),
            UserId::from("c"),
            "CODE_B",
            Timestamp::from_millis(2_000),
        );
        assert!(!storage.try_insert_referral(&dup).await.unwrap());

        storage
            .mark_referral_paid(&UserId::from("c"), ReferralSide::Referrer)
            .await
            .unwrap();
        let stored = storage
            .get_referral_by_referred(&UserId::from("c"))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.referrer_paid);
        assert!(!stored.referred_paid);
    }

    #[tokio::test]
    async fn test_codes_roundtrip() {
        let storage = temp_storage();
        storage
            .put_referral_code("CODE_X", &UserId::from("referrer"))
            .await
            .unwrap();
        assert_eq!(
            storage.resolve_referral_code("CODE_X").await.unwrap(),
            Some(UserId::from("referrer"))
        );
        assert_eq!(storage.resolve_referral_code("other").await.unwrap(), None);
    }
}

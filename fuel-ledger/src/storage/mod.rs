//! Ledger storage layer
//!
//! All coordination state - balances, transaction log, completion markers,
//! window counts, referral records - lives behind this trait so every
//! service instance shares one durable store.
//!
//! The trait exposes the admission checks as single atomic operations:
//! insert-if-absent for markers and referrals, check-and-increment for
//! window counts, balance-plus-log for credits. Callers never get to
//! read-then-write around a guard.

pub mod memory;
pub mod sled;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fuel_core::error::LedgerResult;
use fuel_core::types::{
    CompletionMarker, PeriodKey, ReconcileReport, ReferralRecord, ReferralSide, Timestamp,
    TransactionRecord, UserBalance, UserId,
};

/// Outcome of an atomic window check-and-increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAdmission {
    /// Slot taken; `count` is the new admission count in the period
    Admitted { count: u32 },
    /// The cap was already reached; nothing was incremented
    CapReached { current: u32, max: u32 },
}

/// Reward storage interface
///
/// Four logical tables plus referral codes and reconcile reports, each
/// indexed on its uniqueness key.
#[async_trait]
pub trait RewardStorage: Send + Sync {
    // ==================== Balance operations ====================

    /// Fetch a user's balance row
    async fn get_balance(&self, user_id: &UserId) -> LedgerResult<Option<UserBalance>>;

    /// Write a balance row (create or replace)
    async fn save_balance(&self, balance: &UserBalance) -> LedgerResult<()>;

    /// Apply a signed credit/debit and append the transaction record as
    /// one atomic unit. Creates the balance row lazily if absent; fails
    /// with `UserDisabled` for soft-disabled accounts and with
    /// `BalanceUnderflow` if a debit would go below zero.
    async fn apply_credit(&self, tx: &TransactionRecord) -> LedgerResult<UserBalance>;

    // ==================== Transaction log ====================

    /// All transaction records for a user, oldest first
    async fn list_transactions(&self, user_id: &UserId) -> LedgerResult<Vec<TransactionRecord>>;

    // ==================== Completion markers ====================

    /// Insert-if-absent on `(user, action)`. Returns `false` when the
    /// marker already exists - exactly one of N concurrent inserts for
    /// the same pair returns `true`.
    async fn try_insert_marker(&self, marker: &CompletionMarker) -> LedgerResult<bool>;

    /// Fetch a marker
    async fn get_marker(
        &self,
        user_id: &UserId,
        action_id: &str,
    ) -> LedgerResult<Option<CompletionMarker>>;

    // ==================== Window counts ====================

    /// Atomic check-and-increment for `(user, action, period)`. Two
    /// concurrent callers can never both take the last slot under `cap`.
    async fn try_increment_window(
        &self,
        user_id: &UserId,
        action_id: &str,
        period_key: &PeriodKey,
        cap: u32,
        now: Timestamp,
    ) -> LedgerResult<WindowAdmission>;

    /// Current count for a window, if any
    async fn get_window_count(
        &self,
        user_id: &UserId,
        action_id: &str,
        period_key: &PeriodKey,
    ) -> LedgerResult<Option<u32>>;

    /// Drop all of the user's monthly counters from periods other than
    /// `current_month` and stamp `last_window_reset_period` on the
    /// balance row. Creates the balance row if absent so the stamp has
    /// somewhere to live.
    async fn reset_monthly_windows(
        &self,
        user_id: &UserId,
        current_month: &PeriodKey,
        now: Timestamp,
    ) -> LedgerResult<()>;

    // ==================== Referrals ====================

    /// Insert-if-absent on the referred user. Returns `false` when the
    /// user already has a referral record, regardless of code.
    async fn try_insert_referral(&self, record: &ReferralRecord) -> LedgerResult<bool>;

    /// Fetch the referral record for a referred user
    async fn get_referral_by_referred(
        &self,
        referred_id: &UserId,
    ) -> LedgerResult<Option<ReferralRecord>>;

    /// Flip a payment flag on an existing referral record
    async fn mark_referral_paid(
        &self,
        referred_id: &UserId,
        side: ReferralSide,
    ) -> LedgerResult<()>;

    // ==================== Referral codes ====================

    /// Register (or re-point) a referral code
    async fn put_referral_code(&self, code: &str, referrer_id: &UserId) -> LedgerResult<()>;

    /// Resolve a code to its referrer
    async fn resolve_referral_code(&self, code: &str) -> LedgerResult<Option<UserId>>;

    // ==================== Reconcile reports ====================

    /// Persist an integrity-pass report
    async fn save_reconcile_report(&self, report: &ReconcileReport) -> LedgerResult<()>;

    // ==================== Stats ====================

    /// Row counts for observability
    async fn get_stats(&self) -> LedgerResult<StorageStats>;
}

/// Storage row counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageStats {
    pub balances: u64,
    pub disabled_balances: u64,
    pub transactions: u64,
    pub markers: u64,
    pub windows: u64,
    pub referrals: u64,
    pub referral_codes: u64,
    pub reconcile_reports: u64,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Data directory for the sled backend; empty means in-memory
    pub data_dir: String,
    /// sled cache size in bytes
    pub cache_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./fuel_data".to_string(),
            cache_size: 64 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    /// Development configuration
    pub fn development() -> Self {
        Self {
            data_dir: "./fuel_dev_data".to_string(),
            cache_size: 16 * 1024 * 1024,
        }
    }

    /// Test configuration (in-memory)
    pub fn test() -> Self {
        Self {
            data_dir: String::new(),
            cache_size: 4 * 1024 * 1024,
        }
    }
}

pub use self::sled::SledStorage;
pub use memory::MemoryStorage;

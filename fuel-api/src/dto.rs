//! External wire DTOs
//!
//! The HTTP contract uses camelCase field names; internal types stay in
//! `fuel-core`. Conversions live next to the handlers.

use serde::{Deserialize, Serialize};

use fuel_core::types::BalanceSnapshot;

// ============ Award ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub user_id: String,
    pub action_id: String,
    /// Free-text description carried into the transaction record
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    pub action: String,
    pub awarded: u64,
    pub pool: String,
    pub balances: BalancesDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_completed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalancesDto {
    pub ephemeral: u64,
    pub permanent: u64,
}

impl From<BalanceSnapshot> for BalancesDto {
    fn from(snapshot: BalanceSnapshot) -> Self {
        Self {
            ephemeral: snapshot.ephemeral,
            permanent: snapshot.permanent,
        }
    }
}

// ============ Referrals ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemReferralRequest {
    pub referral_code: String,
    pub new_user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemReferralResponse {
    pub referrer_id: String,
    pub referrer_awarded: u64,
    pub referred_awarded: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCodeRequest {
    pub user_id: String,
    pub code: String,
}

// ============ Balance and history ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: String,
    pub balances: BalancesDto,
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub tx_id: String,
    pub amount: i64,
    pub pool: String,
    pub action: String,
    pub description: String,
    pub created_at: u64,
}

// ============ Provisioning ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub user_id: String,
    #[serde(default)]
    pub initial_ephemeral: u64,
}

// ============ Reconciliation ============

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    #[serde(default)]
    pub repair: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCheckDto {
    pub ledger_sum: i64,
    pub stored: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub user_id: String,
    pub consistent: bool,
    pub corrected: bool,
    pub ephemeral: PoolCheckDto,
    pub permanent: PoolCheckDto,
    pub checked_at: u64,
}

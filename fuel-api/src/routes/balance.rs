//! Balance and transaction-history endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use fuel_core::types::{digest_to_hex, UserBalance};
use fuel_ledger::RewardStorage;

use crate::dto::{BalanceResponse, BalancesDto, TransactionDto};
use crate::error::ApiResult;
use crate::routes::reward::parse_user_id;
use crate::state::AppState;

/// Read-only snapshot of both pools
pub async fn get_balance<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    let user_id = parse_user_id(&user_id)?;
    let balance = state.ledger.balance(&user_id).await?;
    Ok(Json(balance_to_response(&balance)))
}

/// A user's transaction history, oldest first
pub async fn list_transactions<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<TransactionDto>>> {
    let user_id = parse_user_id(&user_id)?;
    let transactions = state.ledger.transactions(&user_id).await?;

    Ok(Json(
        transactions
            .iter()
            .map(|tx| TransactionDto {
                tx_id: digest_to_hex(&tx.tx_id),
                amount: tx.amount,
                pool: tx.pool.to_string(),
                action: tx.action.clone(),
                description: tx.description.clone(),
                created_at: tx.created_at.as_millis(),
            })
            .collect(),
    ))
}

// ============ Helper Functions ============

pub(crate) fn balance_to_response(balance: &UserBalance) -> BalanceResponse {
    BalanceResponse {
        user_id: balance.user_id.0.clone(),
        balances: BalancesDto {
            ephemeral: balance.ephemeral_pool,
            permanent: balance.permanent_pool,
        },
        disabled: balance.disabled,
    }
}

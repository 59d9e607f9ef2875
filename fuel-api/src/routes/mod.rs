//! API route handlers

pub mod balance;
pub mod health;
pub mod reward;

use axum::{routing::get, routing::post, Router};

use fuel_ledger::RewardStorage;

use crate::state::AppState;

/// Create the API router
pub fn create_router<S: RewardStorage + 'static>(state: AppState<S>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check::<S>))
        // Award pipeline
        .route("/rewards/award", post(reward::award::<S>))
        .route("/rewards/redeem-referral", post(reward::redeem_referral::<S>))
        .route("/rewards/referral-code", post(reward::register_referral_code::<S>))
        .route("/rewards/provision", post(reward::provision::<S>))
        .route("/rewards/reconcile/:user_id", post(reward::reconcile::<S>))
        // Read-only views
        .route("/rewards/balance/:user_id", get(balance::get_balance::<S>))
        .route("/rewards/transactions/:user_id", get(balance::list_transactions::<S>))
        // State
        .with_state(state)
}

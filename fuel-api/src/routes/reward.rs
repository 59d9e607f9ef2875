//! Award and referral endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use fuel_core::types::UserId;
use fuel_ledger::{AwardOutcome, ReferralOutcome, RewardStorage};

use crate::dto::{
    AwardRequest, AwardResponse, ProvisionRequest, ReconcileRequest, ReconcileResponse,
    RedeemReferralRequest, RedeemReferralResponse, RegisterCodeRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::balance::balance_to_response;
use crate::state::AppState;

/// Award fuel for a user action
pub async fn award<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Json(req): Json<AwardRequest>,
) -> ApiResult<Json<AwardResponse>> {
    let user_id = parse_user_id(&req.user_id)?;

    let outcome = state
        .ledger
        .award(&user_id, &req.action_id, req.metadata)
        .await?;

    match outcome {
        AwardOutcome::Granted {
            action,
            awarded,
            pool,
            balances,
        } => Ok(Json(AwardResponse {
            action,
            awarded,
            pool: pool.to_string(),
            balances: balances.into(),
            already_completed: None,
        })),
        AwardOutcome::AlreadyCompleted {
            action,
            pool,
            balances,
        } => Ok(Json(AwardResponse {
            action,
            awarded: 0,
            pool: pool.to_string(),
            balances: balances.into(),
            already_completed: Some(true),
        })),
        AwardOutcome::CapReached {
            period,
            current,
            max,
            ..
        } => Err(ApiError::CapReached {
            period,
            current,
            max,
        }),
    }
}

/// Redeem a referral code for a newly signed-up user
pub async fn redeem_referral<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Json(req): Json<RedeemReferralRequest>,
) -> ApiResult<Json<RedeemReferralResponse>> {
    let new_user = parse_user_id(&req.new_user_id)?;

    let outcome = state
        .ledger
        .redeem_referral(&req.referral_code, &new_user)
        .await?;

    match outcome {
        ReferralOutcome::Attributed {
            referrer_id,
            referrer_awarded,
            referred_awarded,
        } => Ok(Json(RedeemReferralResponse {
            referrer_id: referrer_id.0,
            referrer_awarded,
            referred_awarded,
        })),
        ReferralOutcome::InvalidCode => Err(ApiError::InvalidCode(req.referral_code)),
        ReferralOutcome::AlreadyReferred => Err(ApiError::AlreadyReferred),
        ReferralOutcome::SelfReferral => Err(ApiError::SelfReferral),
    }
}

/// Register a referral code for a user
pub async fn register_referral_code<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Json(req): Json<RegisterCodeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = parse_user_id(&req.user_id)?;
    if req.code.trim().is_empty() {
        return Err(ApiError::BadRequest("Referral code must not be empty".to_string()));
    }

    state
        .ledger
        .register_referral_code(&user_id, &req.code)
        .await?;

    Ok(Json(serde_json::json!({ "status": "registered" })))
}

/// Explicitly provision a balance row
pub async fn provision<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Json(req): Json<ProvisionRequest>,
) -> ApiResult<Json<crate::dto::BalanceResponse>> {
    let user_id = parse_user_id(&req.user_id)?;

    let balance = state
        .ledger
        .provision(&user_id, req.initial_ephemeral)
        .await?;

    Ok(Json(balance_to_response(&balance)))
}

/// Run the integrity pass for one user
pub async fn reconcile<S: RewardStorage>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    body: Option<Json<ReconcileRequest>>,
) -> ApiResult<Json<ReconcileResponse>> {
    let user_id = parse_user_id(&user_id)?;
    let repair = body.map(|Json(req)| req.repair).unwrap_or(false);

    let report = state.ledger.reconcile(&user_id, repair).await?;

    Ok(Json(ReconcileResponse {
        user_id: report.user_id.0.clone(),
        consistent: report.consistent(),
        corrected: report.corrected,
        ephemeral: crate::dto::PoolCheckDto {
            ledger_sum: report.ephemeral.ledger_sum,
            stored: report.ephemeral.stored,
        },
        permanent: crate::dto::PoolCheckDto {
            ledger_sum: report.permanent.ledger_sum,
            stored: report.permanent.stored,
        },
        checked_at: report.checked_at.as_millis(),
    }))
}

/// Reject empty/whitespace user ids before they reach storage
pub(crate) fn parse_user_id(raw: &str) -> ApiResult<UserId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("User id must not be empty".to_string()));
    }
    Ok(UserId::new(trimmed))
}

//! CLI command implementations

use std::sync::Arc;

use fuel_api::{run_server, ApiConfig, AppState};
use fuel_core::types::UserId;
use fuel_ledger::{AwardOutcome, FuelLedger, ReferralOutcome, RewardStorage};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Initialize the store and print its current shape
pub async fn init<S: RewardStorage>(ledger: &FuelLedger<S>) -> CliResult {
    let stats = ledger.storage_stats().await?;
    println!("Store initialized");
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Start the reward API server
pub async fn start<S: RewardStorage + 'static>(
    ledger: Arc<FuelLedger<S>>,
    host: String,
    port: u16,
) -> CliResult {
    let config = ApiConfig {
        host,
        port,
        ..ApiConfig::default()
    };
    run_server(&config, AppState::new(ledger)).await
}

/// Award fuel for an action
pub async fn award<S: RewardStorage>(
    ledger: &FuelLedger<S>,
    user_id: &str,
    action_id: &str,
    description: Option<String>,
) -> CliResult {
    let outcome = ledger
        .award(&UserId::new(user_id), action_id, description)
        .await?;

    match outcome {
        AwardOutcome::Granted {
            awarded,
            pool,
            balances,
            ..
        } => {
            println!(
                "Awarded {} fuel to {} pool (ephemeral={}, permanent={})",
                awarded, pool, balances.ephemeral, balances.permanent
            );
        }
        AwardOutcome::AlreadyCompleted { action, .. } => {
            println!("Action {} already completed, nothing awarded", action);
        }
        AwardOutcome::CapReached {
            period,
            current,
            max,
            ..
        } => {
            println!("Cap reached ({} window): {}/{}", period, current, max);
        }
    }
    Ok(())
}

/// Show a user's balance
pub async fn balance<S: RewardStorage>(ledger: &FuelLedger<S>, user_id: &str) -> CliResult {
    let balance = ledger.balance(&UserId::new(user_id)).await?;
    println!(
        "{}: ephemeral={}, permanent={}{}",
        balance.user_id,
        balance.ephemeral_pool,
        balance.permanent_pool,
        if balance.disabled { " (disabled)" } else { "" }
    );
    Ok(())
}

/// Redeem a referral code
pub async fn redeem<S: RewardStorage>(
    ledger: &FuelLedger<S>,
    code: &str,
    user_id: &str,
) -> CliResult {
    let outcome = ledger
        .redeem_referral(code, &UserId::new(user_id))
        .await?;

    match outcome {
        ReferralOutcome::Attributed {
            referrer_id,
            referrer_awarded,
            referred_awarded,
        } => {
            println!(
                "Attributed to {}: referrer +{}, referred +{}",
                referrer_id, referrer_awarded, referred_awarded
            );
        }
        ReferralOutcome::InvalidCode => println!("Invalid referral code"),
        ReferralOutcome::AlreadyReferred => println!("User was already referred"),
        ReferralOutcome::SelfReferral => println!("Self-referral is not allowed"),
    }
    Ok(())
}

/// Register a referral code
pub async fn register_code<S: RewardStorage>(
    ledger: &FuelLedger<S>,
    user_id: &str,
    code: &str,
) -> CliResult {
    ledger
        .register_referral_code(&UserId::new(user_id), code)
        .await?;
    println!("Code {} registered for {}", code, user_id);
    Ok(())
}

/// Provision a balance row
pub async fn provision<S: RewardStorage>(
    ledger: &FuelLedger<S>,
    user_id: &str,
    ephemeral: u64,
) -> CliResult {
    let balance = ledger.provision(&UserId::new(user_id), ephemeral).await?;
    println!(
        "Provisioned {}: ephemeral={}, permanent={}",
        balance.user_id, balance.ephemeral_pool, balance.permanent_pool
    );
    Ok(())
}

/// Run the integrity pass
pub async fn reconcile<S: RewardStorage>(
    ledger: &FuelLedger<S>,
    user_id: &str,
    repair: bool,
) -> CliResult {
    let report = ledger.reconcile(&UserId::new(user_id), repair).await?;

    if report.consistent() {
        println!("Balance consistent with transaction log");
    } else {
        println!(
            "Drift detected: ephemeral log={} stored={}, permanent log={} stored={}{}",
            report.ephemeral.ledger_sum,
            report.ephemeral.stored,
            report.permanent.ledger_sum,
            report.permanent.stored,
            if report.corrected { " (corrected)" } else { "" }
        );
    }
    Ok(())
}

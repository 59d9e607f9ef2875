//! Fuel Ledger Command Line Interface
//!
//! Usage:
//!   fuel init                  - Initialize the local store
//!   fuel start                 - Start the reward API server
//!   fuel award ...             - Award fuel for an action
//!   fuel balance <user>        - Show a user's balance
//!   fuel redeem ...            - Redeem a referral code
//!   fuel register-code ...     - Register a referral code
//!   fuel provision ...         - Provision a balance row
//!   fuel reconcile <user>      - Run the integrity pass

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fuel_ledger::{FuelLedger, MemoryStorage, RewardStorage, SledStorage, StorageConfig};

mod commands;

#[derive(Parser)]
#[command(name = "fuel")]
#[command(about = "Fuel reward ledger CLI")]
#[command(version)]
struct Cli {
    /// Data directory for the sled store
    #[arg(long, default_value = "./fuel_data")]
    data_dir: String,

    /// Use the in-memory backend instead of sled
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local store
    Init,

    /// Start the reward API server
    Start {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Award fuel for a user action
    Award {
        /// User ID
        #[arg(short, long)]
        user_id: String,
        /// Action ID (e.g. github_star, job_share)
        #[arg(short, long)]
        action_id: String,
        /// Optional transaction description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show a user's balance
    Balance {
        /// User ID
        user_id: String,
    },

    /// Redeem a referral code for a new user
    Redeem {
        /// Referral code
        #[arg(short, long)]
        code: String,
        /// Newly signed-up user ID
        #[arg(short, long)]
        user_id: String,
    },

    /// Register a referral code for a user
    RegisterCode {
        /// Referrer user ID
        #[arg(short, long)]
        user_id: String,
        /// Code to register
        #[arg(short, long)]
        code: String,
    },

    /// Provision a balance row
    Provision {
        /// User ID
        user_id: String,
        /// Starting ephemeral allowance
        #[arg(long, default_value = "0")]
        ephemeral: u64,
    },

    /// Run the integrity pass for a user
    Reconcile {
        /// User ID
        user_id: String,
        /// Rewrite the stored balance from the transaction log on drift
        #[arg(long)]
        repair: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.memory {
        let ledger = Arc::new(FuelLedger::new(Arc::new(MemoryStorage::new())));
        dispatch(cli.command, ledger).await
    } else {
        let storage_config = StorageConfig {
            data_dir: cli.data_dir.clone(),
            ..StorageConfig::default()
        };
        let storage = SledStorage::new(&storage_config)?;
        let ledger = Arc::new(FuelLedger::new(Arc::new(storage)));
        dispatch(cli.command, ledger).await
    }
}

async fn dispatch<S: RewardStorage + 'static>(
    command: Commands,
    ledger: Arc<FuelLedger<S>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match command {
        Commands::Init => commands::init(&ledger).await,
        Commands::Start { host, port } => commands::start(ledger, host, port).await,
        Commands::Award {
            user_id,
            action_id,
            description,
        } => commands::award(&ledger, &user_id, &action_id, description).await,
        Commands::Balance { user_id } => commands::balance(&ledger, &user_id).await,
        Commands::Redeem { code, user_id } => commands::redeem(&ledger, &code, &user_id).await,
        Commands::RegisterCode { user_id, code } => {
            commands::register_code(&ledger, &user_id, &code).await
        }
        Commands::Provision { user_id, ephemeral } => {
            commands::provision(&ledger, &user_id, ephemeral).await
        }
        Commands::Reconcile { user_id, repair } => {
            commands::reconcile(&ledger, &user_id, repair).await
        }
    }
}

//! Application state for the API server

use std::sync::Arc;

use fuel_ledger::{FuelLedger, RewardStorage};

/// API server state
pub struct AppState<S: RewardStorage> {
    /// The reward ledger
    pub ledger: Arc<FuelLedger<S>>,
    /// API version
    pub version: String,
}

impl<S: RewardStorage> AppState<S> {
    pub fn new(ledger: Arc<FuelLedger<S>>) -> Self {
        Self {
            ledger,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl<S: RewardStorage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            version: self.version.clone(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
        }
    }
}

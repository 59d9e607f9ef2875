//! Ledger configuration
//!
//! Supports loading from environment variables with the FUEL_ prefix.

use serde::{Deserialize, Serialize};
use std::env;

use crate::storage::StorageConfig;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory (tests and development)
    Memory,
    /// Sled embedded database
    #[default]
    Sled,
}

impl StorageBackend {
    /// Parse from string (for environment variables)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "sled" | "disk" => Some(Self::Sled),
            _ => None,
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Which storage backend to run on
    pub backend: StorageBackend,
    /// Storage tuning
    pub storage: StorageConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            storage: StorageConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Development configuration: sled in a local dev directory
    pub fn development() -> Self {
        Self {
            backend: StorageBackend::Sled,
            storage: StorageConfig::development(),
        }
    }

    /// Test configuration: in-memory
    pub fn test() -> Self {
        Self {
            backend: StorageBackend::Memory,
            storage: StorageConfig::test(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - FUEL_STORAGE: backend (memory/sled)
    /// - FUEL_DATA_DIR: sled data directory
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(backend) = env::var("FUEL_STORAGE")
            .ok()
            .and_then(|s| StorageBackend::from_str(&s))
        {
            config.backend = backend;
        }

        if let Ok(data_dir) = env::var("FUEL_DATA_DIR") {
            config.storage.data_dir = data_dir;
        }

        config
    }
}

//! Fuel Core - Reward Ledger Domain Types
//!
//! This crate provides the domain model for the fuel reward ledger:
//!
//! - **Action Catalog**: declarative table mapping action ids to reward rules
//! - **Balance / Transaction types**: the dual-pool user balance and its
//!   append-only transaction log
//! - **Admission types**: completion markers and window counts that gate
//!   whether a reward may be issued
//! - **Referral types**: referrer/referred attribution records
//! - **Error taxonomy**: client errors vs. storage faults vs. integrity
//!   failures
//!
//! The crate is purely declarative: no storage, no IO. The companion
//! `fuel-ledger` crate implements the operations on top of these types.

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{ActionCatalog, RewardRule};
pub use error::{LedgerError, LedgerResult};
pub use types::*;

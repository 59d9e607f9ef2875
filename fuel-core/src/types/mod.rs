//! Domain types for the fuel reward ledger

pub mod balance;
pub mod common;
pub mod marker;
pub mod reconcile;
pub mod referral;
pub mod transaction;
pub mod window;

pub use balance::{BalanceSnapshot, UserBalance};
pub use common::{
    digest_from_hex, digest_to_hex, generate_tx_id, PeriodKey, PeriodKind, Pool, Timestamp,
    TxId, UserId,
};
pub use marker::CompletionMarker;
pub use reconcile::{PoolCheck, ReconcileReport};
pub use referral::{ReferralRecord, ReferralSide};
pub use transaction::TransactionRecord;
pub use window::WindowCount;

//! Ledger operations
//!
//! The admission and mutation pipeline behind the public `award` call:
//!
//! - `idempotency` - one-time action claim guard
//! - `window` - capped recurring-action admission
//! - `credit` - the only balance mutation path
//! - `referral` - referral attribution and two-sided payout
//! - `award` - orchestration of the above
//! - `reconcile` - balance reconstruction from the transaction log
//!
//! Every component decides *whether* to credit; only `credit` actually
//! mutates a balance.

pub mod award;
pub mod credit;
pub mod idempotency;
pub mod reconcile;
pub mod referral;
pub mod window;

pub use award::{execute_award, AwardOutcome};
pub use credit::LedgerCore;
pub use idempotency::{ClaimOutcome, IdempotencyGuard};
pub use reconcile::reconcile;
pub use referral::{ReferralAttributor, ReferralOutcome};
pub use window::WindowCounter;

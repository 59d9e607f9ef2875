//! Fuel API - HTTP interface for the reward ledger
//!
//! Exposes the award pipeline over HTTP:
//!
//! - `POST /rewards/award` - award fuel for an action
//! - `POST /rewards/redeem-referral` - redeem a referral code
//! - `POST /rewards/referral-code` - register a referral code
//! - `POST /rewards/provision` - explicitly provision a balance
//! - `POST /rewards/reconcile/:user_id` - integrity pass
//! - `GET /rewards/balance/:user_id` - balance snapshot
//! - `GET /rewards/transactions/:user_id` - transaction history
//! - `GET /health`, `GET /ready` - probes
//!
//! Admission rejections map to structured 409 responses; unknown actions
//! and malformed payloads to 400; missing users to 404. Storage faults
//! surface as 500 and are safe to retry end-to-end.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use server::{create_server, run_server, start_background_server};
pub use state::{ApiConfig, AppState};

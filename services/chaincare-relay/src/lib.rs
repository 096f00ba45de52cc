//! # ChainCare Relay
//!
//! HTTP service that authenticates users, flattens ledger reads into
//! transport records and relays administrative writes signed with a single
//! configured admin key.

pub mod auth;
pub mod config;
pub mod error;
mod extract;
pub mod records;
pub mod relay;
mod routes;
pub mod state;
pub mod users;

pub use config::{RelayArgs, RelayConfig};
pub use relay::Relay;
pub use routes::create_app;
pub use state::AppState;

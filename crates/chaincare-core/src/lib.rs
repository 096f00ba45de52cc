//! # ChainCare Core
//!
//! Core types shared by the ChainCare ledger contract, the relay service and
//! the client tooling.
//!
//! ## Ledger
//! - Policies and claims are owned by the ledger; everything else holds copies
//! - Currency is always carried as [`Wei`], never as floating point
//!
//! ## Relay
//! - Administrative writes are signed by a single configured admin identity
//! - Ledger reads are flattened into transport records with string ids

pub mod address;
pub mod amount;
pub mod claim;
pub mod error;
pub mod policy;

pub use address::Address;
pub use amount::{Wei, ETHER_DECIMALS, WEI_PER_ETHER};
pub use claim::{Claim, ClaimId, ClaimStatus};
pub use error::{ChaincareError, ErrorKind, Result};
pub use policy::{Policy, PolicyId};

/// Current ChainCare version for compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ChainCare build information for telemetry and debugging
pub const BUILD_INFO: &str = concat!(
    "ChainCare ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);

/// Standard API endpoints for ChainCare services
pub mod endpoints {
    pub const HEALTH: &str = "/health";
    pub const METRICS: &str = "/metrics";
    pub const API_AUTH_REGISTER: &str = "/api/auth/register";
    pub const API_AUTH_LOGIN: &str = "/api/auth/login";
    pub const API_AUTH_ME: &str = "/api/auth/me";
    pub const API_AUTH_USERS: &str = "/api/auth/users";
    pub const API_POLICIES: &str = "/api/policies";
    pub const API_POLICY_CANCEL: &str = "/api/policies/{id}/cancel";
    pub const API_CLAIMS: &str = "/api/claims";
    pub const API_CLAIM_APPROVE: &str = "/api/claims/{id}/approve";
    pub const API_CLAIM_REJECT: &str = "/api/claims/{id}/reject";

    pub const LEDGER_CONTRACT: &str = "/ledger/contract";
    pub const LEDGER_ESTIMATE_GAS: &str = "/ledger/estimate-gas";
    pub const LEDGER_GAS_PRICE: &str = "/ledger/gas-price";
    pub const LEDGER_NONCE: &str = "/ledger/accounts/{address}/nonce";
    pub const LEDGER_TRANSACTIONS: &str = "/ledger/transactions";
    pub const LEDGER_RECEIPT: &str = "/ledger/receipts/{hash}";
    pub const LEDGER_POLICY_COUNT: &str = "/ledger/policies/count";
    pub const LEDGER_POLICY: &str = "/ledger/policies/{id}";
    pub const LEDGER_CLAIM_COUNT: &str = "/ledger/claims/count";
    pub const LEDGER_CLAIM: &str = "/ledger/claims/{id}";
}

//! # Admin Signer
//!
//! Holds signing credentials and submits signed registry calls to a ledger,
//! one at a time per signing identity.

pub use policy_ledger;

mod credential;
mod http;
mod sender;

pub use credential::Credential;
pub use http::HttpLedgerClient;
pub use sender::TransactionSender;

pub use chaincare_core;

mod client;
pub mod gas;
mod memory;
mod registry;
mod transaction;
pub mod wire;

pub use client::{ContractInfo, LedgerClient};
pub use memory::{InMemoryLedger, DEFAULT_GAS_PRICE};
pub use registry::{PolicyRegistry, RegistryEvent};
pub use transaction::{
    address_from_verifying_key, keccak256, ContractCall, Receipt, SignedTransaction, TransactionRequest,
    TxHash,
};

// Re-export core types for convenience
pub use chaincare_core::{Address, ChaincareError, Claim, ClaimStatus, Policy, Result, Wei};

//! Error types for ChainCare

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChaincareError>;

/// Coarse classification used to pick transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    Validation,
    State,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum ChaincareError {
    #[error("Only admin can perform this action")]
    Unauthorized,

    #[error("Policy with this ID does not exist")]
    PolicyNotFound { policy_id: u64 },

    #[error("Claim with this ID does not exist")]
    ClaimNotFound { claim_id: u64 },

    #[error("claim already resolved")]
    ClaimAlreadyResolved { claim_id: u64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Username or Ethereum address already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Invalid address: {input}")]
    InvalidAddress { input: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Transaction rejected: {reason}")]
    TransactionRejected { reason: String },

    #[error("Ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    #[error("{message}")]
    Remote { kind: ErrorKind, message: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl ChaincareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChaincareError::InvalidCredentials | ChaincareError::Unauthenticated { .. } => {
                ErrorKind::Authentication
            }
            ChaincareError::Unauthorized | ChaincareError::Forbidden { .. } => {
                ErrorKind::Authorization
            }
            ChaincareError::PolicyNotFound { .. }
            | ChaincareError::ClaimNotFound { .. }
            | ChaincareError::UserNotFound { .. } => ErrorKind::NotFound,
            ChaincareError::UserExists
            | ChaincareError::Validation { .. }
            | ChaincareError::InvalidAddress { .. }
            | ChaincareError::InvalidAmount { .. } => ErrorKind::Validation,
            ChaincareError::ClaimAlreadyResolved { .. } => ErrorKind::State,
            ChaincareError::Remote { kind, .. } => *kind,
            ChaincareError::TransactionRejected { .. }
            | ChaincareError::LedgerUnavailable { .. }
            | ChaincareError::Config { .. }
            | ChaincareError::Internal { .. }
            | ChaincareError::SerializationError { .. } => ErrorKind::Infrastructure,
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        ChaincareError::Validation {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        ChaincareError::Config {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        ChaincareError::Internal {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        ChaincareError::TransactionRejected {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ChaincareError::LedgerUnavailable {
            reason: reason.into(),
        }
    }
}

//! JSON bodies exchanged with a remote ledger node

use crate::transaction::ContractCall;
use chaincare_core::{Address, ChaincareError, ErrorKind, Wei};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateGasRequest {
    pub from: Address,
    pub call: ContractCall,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GasEstimate {
    pub gas: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPrice {
    pub gas_price: Wei,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Nonce {
    pub nonce: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Count {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ChaincareError> for ErrorBody {
    fn from(err: &ChaincareError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ErrorBody> for ChaincareError {
    fn from(body: ErrorBody) -> Self {
        ChaincareError::Remote {
            kind: body.kind,
            message: body.message,
        }
    }
}

//! Gas schedule for registry calls

use crate::transaction::ContractCall;

pub const BASE_TRANSACTION: u64 = 21_000;
pub const PER_PAYLOAD_BYTE: u64 = 16;

const CREATE_POLICY: u64 = 90_000;
const CANCEL_POLICY: u64 = 28_000;
const SUBMIT_CLAIM: u64 = 95_000;
const RESOLVE_CLAIM: u64 = 30_000;

/// Gas a call consumes when included.
pub fn cost(call: &ContractCall) -> u64 {
    let execution = match call {
        ContractCall::CreatePolicy { .. } => CREATE_POLICY,
        ContractCall::CancelPolicy { .. } => CANCEL_POLICY,
        ContractCall::SubmitClaim { .. } => SUBMIT_CLAIM,
        ContractCall::ApproveClaim { .. } | ContractCall::RejectClaim { .. } => RESOLVE_CLAIM,
    };
    BASE_TRANSACTION + execution + PER_PAYLOAD_BYTE * call.payload_len() as u64
}

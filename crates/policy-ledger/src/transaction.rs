//! Signed transaction format
//!
//! A request is hashed with Keccak-256 over its canonical JSON encoding and
//! signed with a recoverable secp256k1 signature, so the ledger can recover
//! the sender address without a separate public key.

use crate::registry::RegistryEvent;
use chaincare_core::{Address, ChaincareError, ClaimId, PolicyId, Result, Wei};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Ledger address of a public key: last 20 bytes of keccak256 over the
/// uncompressed point without its 0x04 tag.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_digest(&keccak256(&point.as_bytes()[1..]))
}

/// The contract ABI: one variant per mutating registry function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ContractCall {
    #[serde(rename_all = "camelCase")]
    CreatePolicy {
        holder: Address,
        details: String,
        premium: Wei,
    },
    #[serde(rename_all = "camelCase")]
    CancelPolicy { id: PolicyId },
    #[serde(rename_all = "camelCase")]
    SubmitClaim {
        policy_id: PolicyId,
        reason: String,
        amount: Wei,
    },
    #[serde(rename_all = "camelCase")]
    ApproveClaim { id: ClaimId },
    #[serde(rename_all = "camelCase")]
    RejectClaim { id: ClaimId },
}

impl ContractCall {
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::CreatePolicy { .. } => "createPolicy",
            ContractCall::CancelPolicy { .. } => "cancelPolicy",
            ContractCall::SubmitClaim { .. } => "submitClaim",
            ContractCall::ApproveClaim { .. } => "approveClaim",
            ContractCall::RejectClaim { .. } => "rejectClaim",
        }
    }

    /// Length of free-text arguments, charged per byte.
    pub fn payload_len(&self) -> usize {
        match self {
            ContractCall::CreatePolicy { details, .. } => details.len(),
            ContractCall::SubmitClaim { reason, .. } => reason.len(),
            _ => 0,
        }
    }
}

/// 32-byte transaction hash, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

impl FromStr for TxHash {
    type Err = ChaincareError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ChaincareError::validation(format!("invalid transaction hash: {s}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: Wei,
    pub call: ContractCall,
}

impl TransactionRequest {
    /// Digest the signature commits to.
    pub fn signing_hash(&self) -> Result<[u8; 32]> {
        let encoded = serde_json::to_vec(self)?;
        Ok(keccak256(&encoded))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub request: TransactionRequest,
    /// Hex encoded `r || s`.
    pub signature: String,
    pub recovery_id: u8,
}

impl SignedTransaction {
    /// Sign `request` with `key`.
    pub fn sign(request: TransactionRequest, key: &SigningKey) -> Result<Self> {
        let hash = request.signing_hash()?;
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| ChaincareError::rejected(format!("signing failed: {e}")))?;

        Ok(Self {
            request,
            signature: hex::encode(signature.to_bytes()),
            recovery_id: recovery_id.to_byte(),
        })
    }

    /// Recover the address that produced the signature.
    pub fn recover_signer(&self) -> Result<Address> {
        let invalid = || ChaincareError::rejected("invalid transaction signature");

        let bytes = hex::decode(self.signature.trim_start_matches("0x")).map_err(|_| invalid())?;
        let signature = Signature::from_slice(&bytes).map_err(|_| invalid())?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id).ok_or_else(invalid)?;
        let hash = self.request.signing_hash()?;

        let key = VerifyingKey::recover_from_prehash(&hash, &signature, recovery_id)
            .map_err(|_| invalid())?;
        Ok(address_from_verifying_key(&key))
    }

    pub fn hash(&self) -> Result<TxHash> {
        let mut preimage = self.request.signing_hash()?.to_vec();
        preimage.extend_from_slice(self.signature.as_bytes());
        preimage.push(self.recovery_id);
        Ok(TxHash(keccak256(&preimage)))
    }
}

/// Confirmation that a transaction was included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub gas_used: u64,
    pub events: Vec<RegistryEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SigningKey {
        SigningKey::from_slice(&[0x42; 32]).unwrap()
    }

    fn request(from: Address) -> TransactionRequest {
        TransactionRequest {
            from,
            to: Address::new([0x99; 20]),
            nonce: 0,
            gas_limit: 200_000,
            gas_price: Wei::from(1u64),
            call: ContractCall::ApproveClaim { id: 0 },
        }
    }

    #[test]
    fn recovers_the_signing_address() {
        let key = test_key();
        let from = address_from_verifying_key(key.verifying_key());
        let tx = SignedTransaction::sign(request(from), &key).unwrap();

        assert_eq!(tx.recover_signer().unwrap(), from);
    }

    #[test]
    fn tampering_changes_the_recovered_address() {
        let key = test_key();
        let from = address_from_verifying_key(key.verifying_key());
        let mut tx = SignedTransaction::sign(request(from), &key).unwrap();
        tx.request.nonce = 5;

        let recovered = tx.recover_signer();
        assert!(recovered.map(|a| a != from).unwrap_or(true));
    }

    #[test]
    fn call_encoding_uses_abi_names() {
        let call = ContractCall::SubmitClaim {
            policy_id: 3,
            reason: "Flood".to_string(),
            amount: Wei::from(7u64),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["method"], "submitClaim");
        assert_eq!(json["policyId"], 3);
        assert_eq!(json["amount"], "7");
    }

    #[test]
    fn tx_hash_parses_its_display() {
        let key = test_key();
        let from = address_from_verifying_key(key.verifying_key());
        let hash = SignedTransaction::sign(request(from), &key).unwrap().hash().unwrap();
        assert_eq!(hash.to_string().parse::<TxHash>().unwrap(), hash);
    }
}

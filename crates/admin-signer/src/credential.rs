//! Signing credentials

use chaincare_core::{Address, ChaincareError, Result};
use k256::ecdsa::SigningKey;
use policy_ledger::{address_from_verifying_key, SignedTransaction, TransactionRequest};

/// A secp256k1 private key together with the ledger address it controls.
#[derive(Clone)]
pub struct Credential {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(key: SigningKey) -> Self {
        let address = address_from_verifying_key(key.verifying_key());
        Self { key, address }
    }

    /// Parse a 32-byte hex private key, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ChaincareError::config("private key must be 32 bytes of hex"))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| ChaincareError::config("private key is not a valid secp256k1 scalar"))?;

        Ok(Self::new(key))
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    pub fn sign(&self, request: TransactionRequest) -> Result<SignedTransaction> {
        if request.from != self.address {
            return Err(ChaincareError::rejected(format!(
                "credential for {} cannot sign for {}",
                self.address, request.from
            )));
        }
        SignedTransaction::sign(request, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (first account of the default dev mnemonic).
    const DEV_KEY: &str = "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
    const DEV_ADDRESS: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";

    #[test]
    fn derives_the_expected_address() {
        let credential = Credential::from_hex(DEV_KEY).unwrap();
        assert_eq!(credential.address().to_string(), DEV_ADDRESS);
    }

    #[test]
    fn accepts_keys_without_prefix() {
        let with = Credential::from_hex(DEV_KEY).unwrap();
        let without = Credential::from_hex(DEV_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(with.address(), without.address());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(Credential::from_hex("0x1234").is_err());
        assert!(Credential::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn generated_keys_round_trip_through_hex() {
        let credential = Credential::generate();
        let restored = Credential::from_hex(&credential.secret_hex()).unwrap();
        assert_eq!(restored.address(), credential.address());
    }

    #[test]
    fn debug_output_hides_the_key() {
        let credential = Credential::from_hex(DEV_KEY).unwrap();
        let printed = format!("{:?}", credential);
        assert!(printed.contains("redacted"));
        assert!(!printed.contains(DEV_KEY.trim_start_matches("0x")));
    }
}

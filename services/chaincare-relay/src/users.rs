//! Relay user accounts
//!
//! Passwords are kept as salted PBKDF2-HMAC-SHA256 digests. Usernames and
//! ledger addresses are each unique across the directory.

use chaincare_core::{Address, ChaincareError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = digest::SHA256_OUTPUT_LEN;

#[derive(Clone)]
struct PasswordHash {
    iterations: NonZeroU32,
    salt: [u8; SALT_LEN],
    digest: [u8; DIGEST_LEN],
}

impl PasswordHash {
    fn derive(password: &str, iterations: NonZeroU32) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| ChaincareError::internal("system randomness unavailable"))?;

        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &mut digest,
        );

        Ok(Self {
            iterations,
            salt,
            digest,
        })
    }

    fn verify(&self, password: &str) -> bool {
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &self.salt,
            password.as_bytes(),
            &self.digest,
        )
        .is_ok()
    }
}

#[derive(Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub eth_address: Address,
    pub created_at: DateTime<Utc>,
    password: PasswordHash,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("eth_address", &self.eth_address)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            eth_address: self.eth_address,
        }
    }
}

/// A user as shown over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub eth_address: Address,
}

#[derive(Default)]
struct Directory {
    users: HashMap<Uuid, UserRecord>,
    by_username: HashMap<String, Uuid>,
    by_address: HashMap<Address, Uuid>,
}

impl Directory {
    fn is_taken(&self, username: &str, address: &Address) -> bool {
        self.by_username.contains_key(username) || self.by_address.contains_key(address)
    }
}

#[derive(Clone)]
pub struct UserStore {
    directory: Arc<RwLock<Directory>>,
    iterations: NonZeroU32,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("users", &self.len())
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_PBKDF2_ITERATIONS)
    }

    /// Store using `iterations` PBKDF2 rounds per password (at least one).
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            directory: Arc::new(RwLock::new(Directory::default())),
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
        }
    }

    pub fn len(&self) -> usize {
        self.directory.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        eth_address: Address,
    ) -> Result<PublicUser> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ChaincareError::validation(
                "Username and password are required",
            ));
        }

        if self.directory.read().is_taken(username, &eth_address) {
            return Err(ChaincareError::UserExists);
        }

        let iterations = self.iterations;
        let secret = password.to_string();
        let password = tokio::task::spawn_blocking(move || PasswordHash::derive(&secret, iterations))
            .await
            .map_err(|e| ChaincareError::internal(format!("password hashing failed: {e}")))??;

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            eth_address,
            created_at: Utc::now(),
            password,
        };

        let mut directory = self.directory.write();
        // Re-check under the write lock; another registration may have won.
        if directory.is_taken(username, &eth_address) {
            return Err(ChaincareError::UserExists);
        }
        directory.by_username.insert(record.username.clone(), record.id);
        directory.by_address.insert(eth_address, record.id);
        let public = record.public();
        directory.users.insert(record.id, record);

        info!("Registered user {} bound to {}", public.username, eth_address);
        Ok(public)
    }

    /// Check a username and password pair. Unknown users and wrong
    /// passwords fail the same way.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserRecord> {
        let record = self
            .find_by_username(username)
            .ok_or(ChaincareError::InvalidCredentials)?;

        let hash = record.password.clone();
        let secret = password.to_string();
        let valid = tokio::task::spawn_blocking(move || hash.verify(&secret))
            .await
            .map_err(|e| ChaincareError::internal(format!("password check failed: {e}")))?;

        if valid {
            debug!("Authenticated {}", record.username);
            Ok(record)
        } else {
            Err(ChaincareError::InvalidCredentials)
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<UserRecord> {
        self.directory.read().users.get(id).cloned()
    }

    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let directory = self.directory.read();
        directory
            .by_username
            .get(username.trim())
            .and_then(|id| directory.users.get(id))
            .cloned()
    }

    /// All users, oldest first.
    pub fn list(&self) -> Vec<PublicUser> {
        let directory = self.directory.read();
        let mut records: Vec<&UserRecord> = directory.users.values().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        records.into_iter().map(UserRecord::public).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn store() -> UserStore {
        UserStore::with_iterations(1_000)
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let users = store();
        let registered = users.register("alice", "hunter2", address(1)).await.unwrap();

        let record = users.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(record.id, registered.id);
        assert_eq!(record.eth_address, address(1));
    }

    #[tokio::test]
    async fn test_padded_usernames_log_in_as_registered() {
        let users = store();
        let registered = users.register(" bob ", "hunter2", address(3)).await.unwrap();
        assert_eq!(registered.username, "bob");

        let padded = users.authenticate(" bob ", "hunter2").await.unwrap();
        let bare = users.authenticate("bob", "hunter2").await.unwrap();
        assert_eq!(padded.id, registered.id);
        assert_eq!(bare.id, registered.id);
        assert!(users.find_by_username("\tbob\n").is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let users = store();
        users.register("alice", "hunter2", address(1)).await.unwrap();

        let wrong = users.authenticate("alice", "nope").await.unwrap_err();
        let unknown = users.authenticate("mallory", "hunter2").await.unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid credentials");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_duplicate_username_or_address_is_refused() {
        let users = store();
        users.register("alice", "pw", address(1)).await.unwrap();

        let same_name = users.register("alice", "pw", address(2)).await.unwrap_err();
        let same_address = users.register("bob", "pw", address(1)).await.unwrap_err();
        assert!(matches!(same_name, ChaincareError::UserExists));
        assert!(matches!(same_address, ChaincareError::UserExists));
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fields_are_validation_errors() {
        let users = store();
        let err = users.register("  ", "pw", address(1)).await.unwrap_err();
        assert_eq!(err.kind(), chaincare_core::ErrorKind::Validation);
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_public_view_has_no_password_material() {
        let users = store();
        users.register("alice", "hunter2", address(1)).await.unwrap();

        let json = serde_json::to_value(users.list()).unwrap();
        let user = &json[0];
        assert_eq!(user["username"], "alice");
        assert_eq!(user["ethAddress"], address(1).to_string());
        assert_eq!(user.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_hashes_are_salted() {
        let iterations = NonZeroU32::new(10).unwrap();
        let a = PasswordHash::derive("same", iterations).unwrap();
        let b = PasswordHash::derive("same", iterations).unwrap();
        assert_ne!(a.digest, b.digest);
        assert!(a.verify("same"));
        assert!(b.verify("same"));
        assert!(!a.verify("other"));
    }
}

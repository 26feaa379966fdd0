//! Legacy API-key tokens.
//!
//! Each user owns at most one key. Keys are 40 lowercase hex characters and
//! never expire; they are looked up directly rather than verified.

use std::collections::HashMap;
use std::sync::RwLock;

use super::UserId;
use crate::random::random_hex;

const KEY_BYTES: usize = 20;

/// Error returned when an API key cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyError {
    /// The store lock was poisoned.
    LockPoisoned,
}

impl std::fmt::Display for ApiKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockPoisoned => write!(f, "API key store lock poisoned"),
        }
    }
}

impl std::error::Error for ApiKeyError {}

/// Storage for API keys.
pub trait ApiKeyStore: Send + Sync {
    /// The user's key, creating one on first use.
    fn get_or_create(&self, user_id: UserId) -> Result<String, ApiKeyError>;

    /// The owner of `key`, if any.
    fn lookup(&self, key: &str) -> Option<UserId>;
}

#[derive(Default)]
struct Keys {
    owners: HashMap<String, UserId>,
    by_user: HashMap<UserId, String>,
}

/// An `ApiKeyStore` kept in memory.
#[derive(Default)]
pub struct InMemoryApiKeyStore {
    keys: RwLock<Keys>,
}

impl InMemoryApiKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApiKeyStore for InMemoryApiKeyStore {
    fn get_or_create(&self, user_id: UserId) -> Result<String, ApiKeyError> {
        let mut keys = self.keys.write().map_err(|_| ApiKeyError::LockPoisoned)?;
        if let Some(key) = keys.by_user.get(&user_id) {
            return Ok(key.clone());
        }

        let mut key = random_hex(KEY_BYTES);
        while keys.owners.contains_key(&key) {
            key = random_hex(KEY_BYTES);
        }

        keys.owners.insert(key.clone(), user_id);
        keys.by_user.insert(user_id, key.clone());
        tracing::debug!("issued API key for user {user_id}");
        Ok(key)
    }

    fn lookup(&self, key: &str) -> Option<UserId> {
        let keys = self.keys.read().ok()?;
        keys.owners.get(key).copied()
    }
}

//! User identities and the user store.
//!
//! # Pre-conditions
//! - Usernames are non-empty and unique within a store.
//!
//! # Post-conditions
//! - Passwords are only ever held as bcrypt hashes.
//!
//! # Invariants
//! - `UserIdentity` never carries password material.
//! - Ids are assigned by the store, starting at 1, and never reused.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Identifier of a user within a store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user, as exposed to request handlers.
///
/// Every accessor is a pure read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    id: UserId,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl UserIdentity {
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// First and last name separated by a space, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.is_staff
    }

    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}

/// Fields for a user about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

/// Errors that can occur when modifying a user store.
#[derive(Debug)]
pub enum UserStoreError {
    /// A user with this username already exists.
    DuplicateUsername(String),
    /// The username is empty.
    EmptyUsername,
    /// No user has this id.
    NotFound(UserId),
    /// The password could not be hashed.
    Hash(bcrypt::BcryptError),
    /// The store lock was poisoned.
    LockPoisoned,
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateUsername(name) => write!(f, "username already taken: {name}"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::Hash(e) => write!(f, "password hashing failed: {e}"),
            Self::LockPoisoned => write!(f, "user store lock poisoned"),
        }
    }
}

impl std::error::Error for UserStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hash(e) => Some(e),
            Self::DuplicateUsername(_)
            | Self::EmptyUsername
            | Self::NotFound(_)
            | Self::LockPoisoned => None,
        }
    }
}

/// Read access to the users known to the application.
///
/// Lookups never fail loudly: a missing user, a wrong password or an
/// unavailable store all read as `None`.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: UserId) -> Option<UserIdentity>;

    fn find_by_username(&self, username: &str) -> Option<UserIdentity>;

    /// The user named `username`, if `password` matches their stored hash.
    ///
    /// Does not look at the active flag; see [`authenticate`].
    fn check_password(&self, username: &str, password: &str) -> Option<UserIdentity>;
}

/// Check credentials and require an active account.
pub fn authenticate(store: &dyn UserStore, username: &str, password: &str) -> Option<UserIdentity> {
    store
        .check_password(username, password)
        .filter(UserIdentity::is_active)
}

struct StoredUser {
    identity: UserIdentity,
    password_hash: String,
}

#[derive(Default)]
struct Users {
    by_id: HashMap<UserId, StoredUser>,
    ids_by_username: HashMap<String, UserId>,
    last_id: u64,
}

/// A `UserStore` kept in memory.
///
/// # Thread Safety
///
/// Uses `RwLock`, allowing concurrent lookups with exclusive access for
/// writes. A poisoned lock reads as an empty store.
pub struct InMemoryUserStore {
    users: RwLock<Users>,
    hash_cost: u32,
}

impl InMemoryUserStore {
    /// Create an empty store hashing passwords at bcrypt's default cost.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Create an empty store hashing passwords at `hash_cost`.
    #[must_use]
    pub fn with_cost(hash_cost: u32) -> Self {
        Self {
            users: RwLock::new(Users::default()),
            hash_cost,
        }
    }

    /// Hash the password and add the user.
    ///
    /// # Errors
    /// Returns `UserStoreError::DuplicateUsername` if the name is taken,
    /// `UserStoreError::EmptyUsername` for an empty name and
    /// `UserStoreError::Hash` if hashing fails.
    pub fn create_user(&self, new_user: NewUser) -> Result<UserIdentity, UserStoreError> {
        if new_user.username.is_empty() {
            return Err(UserStoreError::EmptyUsername);
        }

        // Hash outside the lock.
        let password_hash =
            bcrypt::hash(&new_user.password, self.hash_cost).map_err(UserStoreError::Hash)?;

        let mut users = self.users.write().map_err(|_| UserStoreError::LockPoisoned)?;
        if users.ids_by_username.contains_key(&new_user.username) {
            return Err(UserStoreError::DuplicateUsername(new_user.username));
        }

        users.last_id += 1;
        let id = UserId::new(users.last_id);
        let identity = UserIdentity {
            id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: true,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
        };

        users.ids_by_username.insert(identity.username.clone(), id);
        users.by_id.insert(
            id,
            StoredUser {
                identity: identity.clone(),
                password_hash,
            },
        );

        Ok(identity)
    }

    /// Activate or deactivate a user.
    ///
    /// # Errors
    /// Returns `UserStoreError::NotFound` if no user has this id.
    pub fn set_active(&self, id: UserId, active: bool) -> Result<(), UserStoreError> {
        let mut users = self.users.write().map_err(|_| UserStoreError::LockPoisoned)?;
        let user = users.by_id.get_mut(&id).ok_or(UserStoreError::NotFound(id))?;
        user.identity.is_active = active;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().map_or(0, |users| users.by_id.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: UserId) -> Option<UserIdentity> {
        let users = self.users.read().ok()?;
        users.by_id.get(&id).map(|user| user.identity.clone())
    }

    fn find_by_username(&self, username: &str) -> Option<UserIdentity> {
        let users = self.users.read().ok()?;
        let id = users.ids_by_username.get(username)?;
        users.by_id.get(id).map(|user| user.identity.clone())
    }

    fn check_password(&self, username: &str, password: &str) -> Option<UserIdentity> {
        let (identity, password_hash) = {
            let users = self.users.read().ok()?;
            let id = users.ids_by_username.get(username)?;
            let user = users.by_id.get(id)?;
            (user.identity.clone(), user.password_hash.clone())
        };

        match bcrypt::verify(password, &password_hash) {
            Ok(true) => Some(identity),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("password verification failed for '{username}': {e}");
                None
            }
        }
    }
}

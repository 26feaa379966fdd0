//! Request authentication.
//!
//! `AuthAccessor` resolves the user behind a request's `Authorization`
//! header by trying each configured authenticator in order.
//!
//! # Post-conditions
//! - Only active users are ever returned.
//!
//! # Invariants
//! - Authentication failures are never surfaced to the caller; they read as
//!   an anonymous request and are logged at debug level.

use std::sync::Arc;

use axum::http::HeaderMap;

use super::header::{token_from_headers, token_from_headers_for};
use super::tokens::TokenService;
use super::{ApiKeyStore, UserId, UserIdentity, UserStore};
use crate::settings::AuthenticationClass;

/// How a request was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Jwt,
    ApiKey,
}

/// A request's authenticated user, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user: UserIdentity,
    method: AuthMethod,
}

impl AuthenticatedUser {
    #[must_use]
    pub const fn new(user: UserIdentity, method: AuthMethod) -> Self {
        Self { user, method }
    }

    #[must_use]
    pub const fn user(&self) -> &UserIdentity {
        &self.user
    }

    #[must_use]
    pub const fn method(&self) -> AuthMethod {
        self.method
    }

    #[must_use]
    pub fn into_user(self) -> UserIdentity {
        self.user
    }
}

/// Resolves request credentials to users.
pub struct AuthAccessor {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
    api_keys: Option<Arc<dyn ApiKeyStore>>,
    authenticators: Vec<AuthenticationClass>,
}

impl AuthAccessor {
    /// `api_keys` is `None` when the API-key extension is not installed;
    /// the API-key authenticator is then skipped.
    #[must_use]
    pub fn new(
        tokens: Arc<TokenService>,
        users: Arc<dyn UserStore>,
        api_keys: Option<Arc<dyn ApiKeyStore>>,
        authenticators: Vec<AuthenticationClass>,
    ) -> Self {
        Self {
            tokens,
            users,
            api_keys,
            authenticators,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[must_use]
    pub fn api_keys(&self) -> Option<&dyn ApiKeyStore> {
        self.api_keys.as_deref()
    }

    /// The first user any configured authenticator accepts.
    #[must_use]
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        self.authenticators.iter().find_map(|class| match class {
            AuthenticationClass::Jwt => self
                .user_from_bearer(headers)
                .map(|user| AuthenticatedUser::new(user, AuthMethod::Jwt)),
            AuthenticationClass::ApiKey => self
                .user_from_api_key(headers)
                .map(|user| AuthenticatedUser::new(user, AuthMethod::ApiKey)),
            AuthenticationClass::Session => None,
        })
    }

    /// The user behind a JWT access token in the `Authorization` header.
    ///
    /// Only the token policy's header schemes are accepted.
    #[must_use]
    pub fn user_from_bearer(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let schemes = &self.tokens.policy().auth_header_types;
        self.verify_jwt(token_from_headers_for(headers, schemes)?)
    }

    /// The user owning an API key in the `Authorization` header.
    #[must_use]
    pub fn user_from_api_key(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let store = self.api_keys.as_ref()?;
        let key = token_from_headers(headers)?;

        let Some(user_id) = store.lookup(key) else {
            tracing::debug!("API key not recognized");
            return None;
        };
        self.active_user(user_id)
    }

    /// The user a JWT access token was issued for.
    #[must_use]
    pub fn verify_jwt(&self, token: &str) -> Option<UserIdentity> {
        match self.tokens.verify_access(token) {
            Ok(claims) => self.active_user(claims.user_id),
            Err(e) => {
                tracing::debug!("JWT rejected: {e}");
                None
            }
        }
    }

    fn active_user(&self, id: UserId) -> Option<UserIdentity> {
        let user = self.users.find_by_id(id);
        match user {
            Some(user) if user.is_active() => Some(user),
            Some(_) => {
                tracing::debug!("user {id} is inactive");
                None
            }
            None => {
                tracing::debug!("user {id} not found");
                None
            }
        }
    }
}

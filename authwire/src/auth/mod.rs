//! Authentication module.
//!
//! Users, API keys, JWT issuing and verification, and the request guards
//! built on top of them.
//!
//! # Pre-conditions
//! - A `JwtConfig` with valid key material is loaded at startup.
//!
//! # Post-conditions
//! - Requests past a guard carry an active, authenticated user.
//!
//! # Invariants
//! - Password material never leaves the user store.

pub mod accessor;
pub mod api_key;
pub mod guard;
pub mod header;
pub mod jwt;
pub mod jwt_config;
pub mod tokens;
pub mod user;

pub use accessor::{AuthAccessor, AuthMethod, AuthenticatedUser};
pub use api_key::{ApiKeyError, ApiKeyStore, InMemoryApiKeyStore};
pub use guard::{CurrentUser, Guard, GuardRejection, Requirement, enforce, identify};
pub use header::{extract_token, extract_token_for, token_from_headers, token_from_headers_for};
pub use jwt::{Claims, JwtError, TokenKind};
pub use jwt_config::{JwtConfig, JwtConfigError};
pub use tokens::{RefreshedTokens, TokenPair, TokenService};
pub use user::{
    InMemoryUserStore, NewUser, UserId, UserIdentity, UserStore, UserStoreError, authenticate,
};

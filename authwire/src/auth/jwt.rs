//! JWT issuing and verification.
//!
//! Tokens carry a `token_type` (`access` or `refresh`), the `user_id` they
//! were issued for, `iat`/`exp` timestamps and a unique `jti`.
//!
//! # Pre-conditions
//! - The `JwtConfig` holds valid key material.
//!
//! # Post-conditions
//! - On success, `verify_token` returns the claims of a token whose
//!   signature checked out and which has not expired.
//!
//! # Invariants
//! - Verification is stateless; blacklisting lives in `TokenService`.

use std::time::Duration;

use jsonwebtoken::{Header, Validation, decode, encode, get_current_timestamp};
use serde::{Deserialize, Serialize};

use super::{JwtConfig, JwtConfigError, UserId};
use crate::random::random_hex;

/// Seconds past `exp` during which a token still verifies.
pub const VALIDATION_LEEWAY_SECS: u64 = 60;

/// Kind of token, stored in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenKind,
    pub user_id: UserId,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Issued at, seconds since the epoch.
    pub iat: u64,
    /// Unique token id.
    pub jti: String,
}

impl Claims {
    /// Claims for a token issued now that lives for `lifetime`.
    #[must_use]
    pub fn new(token_type: TokenKind, user_id: UserId, lifetime: Duration) -> Self {
        let iat = get_current_timestamp();
        Self {
            token_type,
            user_id,
            exp: iat.saturating_add(lifetime.as_secs()),
            iat,
            jti: random_hex(16),
        }
    }
}

/// Claims as they come off the wire, before required fields are checked.
#[derive(Debug, Deserialize)]
struct RawClaims {
    token_type: Option<TokenKind>,
    user_id: Option<UserId>,
    exp: u64,
    #[serde(default)]
    iat: u64,
    #[serde(default)]
    jti: String,
}

/// Error returned when issuing or verifying a token fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT has expired.
    TokenExpired,
    /// The JWT is malformed or cannot be parsed.
    MalformedToken,
    /// The `user_id` claim is missing.
    MissingUserId,
    /// The token is of a different kind than required.
    WrongTokenType {
        expected: TokenKind,
        found: TokenKind,
    },
    /// The token has been blacklisted.
    Blacklisted,
    /// The key could not be created from the provided configuration.
    InvalidKey(String),
    /// The token could not be signed.
    Encoding(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::MissingUserId => write!(f, "missing 'user_id' claim in JWT"),
            Self::WrongTokenType { expected, found } => {
                write!(f, "expected {expected} token, got {found} token")
            }
            Self::Blacklisted => write!(f, "JWT is blacklisted"),
            Self::InvalidKey(reason) => write!(f, "invalid key: {reason}"),
            Self::Encoding(reason) => write!(f, "failed to sign JWT: {reason}"),
        }
    }
}

impl std::error::Error for JwtError {}

impl From<JwtConfigError> for JwtError {
    fn from(error: JwtConfigError) -> Self {
        Self::InvalidKey(error.to_string())
    }
}

/// Sign `claims` with the configured key.
///
/// # Errors
/// Returns `JwtError::InvalidKey` if the key cannot be built and
/// `JwtError::Encoding` if signing fails.
pub fn issue_token(claims: &Claims, config: &JwtConfig) -> Result<String, JwtError> {
    let key = config.encoding_key()?;
    let header = Header::new(config.algorithm());

    encode(&header, claims, &key).map_err(|e| JwtError::Encoding(e.to_string()))
}

/// Verify a JWT's signature and expiry and return its claims.
///
/// # Errors
/// Returns `JwtError` describing why the token was rejected.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    let key = config.decoding_key()?;
    let mut validation = Validation::new(config.algorithm());
    validation.leeway = VALIDATION_LEEWAY_SECS;

    let raw = decode::<RawClaims>(token, &key, &validation)
        .map_err(map_jwt_error)?
        .claims;

    let user_id = raw.user_id.ok_or(JwtError::MissingUserId)?;
    let token_type = raw.token_type.ok_or(JwtError::MalformedToken)?;

    Ok(Claims {
        token_type,
        user_id,
        exp: raw.exp,
        iat: raw.iat,
        jti: raw.jti,
    })
}

/// Verify a JWT and require it to be of `kind`.
///
/// # Errors
/// Returns `JwtError::WrongTokenType` for a valid token of the other kind.
pub fn verify_token_of_kind(
    token: &str,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<Claims, JwtError> {
    let claims = verify_token(token, config)?;
    if claims.token_type != kind {
        return Err(JwtError::WrongTokenType {
            expected: kind,
            found: claims.token_type,
        });
    }
    Ok(claims)
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::MalformedToken,
    }
}

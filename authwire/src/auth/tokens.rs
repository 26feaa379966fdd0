//! Access/refresh token pairs.
//!
//! `TokenService` issues token pairs, exchanges refresh tokens for new
//! access tokens and keeps the refresh-token blacklist.
//!
//! # Invariants
//! - A blacklisted `jti` is rejected by every verification path.
//! - The blacklist is only consulted when it is enabled.
//! - A `jti` is kept only until its token would fail the expiry check
//!   anyway.

use std::collections::HashMap;
use std::sync::RwLock;

use jsonwebtoken::get_current_timestamp;
use serde::Serialize;

use super::jwt::{
    Claims, JwtError, TokenKind, VALIDATION_LEEWAY_SECS, issue_token, verify_token,
    verify_token_of_kind,
};
use super::{JwtConfig, UserId};
use crate::settings::names::extension;
use crate::settings::{Settings, SettingsError, TokenPolicy};

/// Freshly issued access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshedTokens {
    pub access: String,
    /// Replacement refresh token, present when rotation is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Issues and verifies JWTs under a `TokenPolicy`.
pub struct TokenService {
    config: JwtConfig,
    policy: TokenPolicy,
    /// Blacklisted `jti` mapped to the token's `exp`.
    blacklist: Option<RwLock<HashMap<String, u64>>>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("blacklist_enabled", &self.blacklist.is_some())
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(config: JwtConfig, policy: TokenPolicy, blacklist_enabled: bool) -> Self {
        Self {
            config,
            policy,
            blacklist: blacklist_enabled.then(|| RwLock::new(HashMap::new())),
        }
    }

    /// Service for configured settings. The blacklist is enabled when the
    /// blacklist extension is installed.
    ///
    /// # Errors
    /// Returns `SettingsError::NotConfigured` if no token policy is set.
    pub fn from_settings(config: JwtConfig, settings: &Settings) -> Result<Self, SettingsError> {
        let policy = settings.token_policy()?.clone();
        Ok(Self::new(
            config,
            policy,
            settings.has_extension(extension::JWT_BLACKLIST),
        ))
    }

    #[must_use]
    pub const fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn blacklist_enabled(&self) -> bool {
        self.blacklist.is_some()
    }

    /// Issue an access and a refresh token for `user_id`.
    ///
    /// # Errors
    /// Returns `JwtError` if signing fails.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.issue(TokenKind::Access, user_id)?,
            refresh: self.issue(TokenKind::Refresh, user_id)?,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// With rotation on, a new refresh token is issued too, and the old one
    /// is blacklisted when the policy asks for it.
    ///
    /// # Errors
    /// Returns `JwtError` if the refresh token is invalid, expired,
    /// blacklisted or not a refresh token.
    pub fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, JwtError> {
        let claims = verify_token_of_kind(refresh_token, TokenKind::Refresh, &self.config)?;
        self.check_blacklist(&claims)?;

        let access = self.issue(TokenKind::Access, claims.user_id)?;
        if !self.policy.rotate_refresh_tokens {
            return Ok(RefreshedTokens {
                access,
                refresh: None,
            });
        }

        if self.policy.blacklist_after_rotation {
            self.blacklist_claims(&claims);
        }
        let refresh = self.issue(TokenKind::Refresh, claims.user_id)?;
        tracing::debug!("rotated refresh token for user {}", claims.user_id);

        Ok(RefreshedTokens {
            access,
            refresh: Some(refresh),
        })
    }

    /// Verify a token of either kind.
    ///
    /// # Errors
    /// Returns `JwtError` if the token is invalid, expired or blacklisted.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = verify_token(token, &self.config)?;
        self.check_blacklist(&claims)?;
        Ok(claims)
    }

    /// Verify an access token.
    ///
    /// # Errors
    /// Returns `JwtError::WrongTokenType` for refresh tokens, and the other
    /// `JwtError` variants as `verify` does.
    pub fn verify_access(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = verify_token_of_kind(token, TokenKind::Access, &self.config)?;
        self.check_blacklist(&claims)?;
        Ok(claims)
    }

    /// Revoke a refresh token. Has no effect when the blacklist is disabled.
    ///
    /// # Errors
    /// Returns `JwtError` if `refresh_token` is not a valid refresh token.
    pub fn revoke(&self, refresh_token: &str) -> Result<bool, JwtError> {
        let claims = verify_token_of_kind(refresh_token, TokenKind::Refresh, &self.config)?;
        Ok(self.blacklist_claims(&claims))
    }

    /// Whether `jti` has been blacklisted.
    #[must_use]
    pub fn is_blacklisted(&self, jti: &str) -> bool {
        let Some(blacklist) = &self.blacklist else {
            return false;
        };
        blacklist.read().map_or_else(
            |_| {
                tracing::warn!("token blacklist lock poisoned, rejecting token");
                true
            },
            |entries| entries.contains_key(jti),
        )
    }

    fn issue(&self, kind: TokenKind, user_id: UserId) -> Result<String, JwtError> {
        let lifetime = match kind {
            TokenKind::Access => self.policy.access_token_lifetime,
            TokenKind::Refresh => self.policy.refresh_token_lifetime,
        };
        issue_token(&Claims::new(kind, user_id, lifetime), &self.config)
    }

    fn check_blacklist(&self, claims: &Claims) -> Result<(), JwtError> {
        if self.is_blacklisted(&claims.jti) {
            return Err(JwtError::Blacklisted);
        }
        Ok(())
    }

    /// Record the token's `jti`, dropping entries for tokens that can no
    /// longer verify. Returns whether the `jti` was new.
    fn blacklist_claims(&self, claims: &Claims) -> bool {
        let Some(blacklist) = &self.blacklist else {
            return false;
        };
        let Ok(mut entries) = blacklist.write() else {
            tracing::warn!("token blacklist lock poisoned, jti {} not recorded", claims.jti);
            return false;
        };

        let now = get_current_timestamp();
        let before = entries.len();
        entries.retain(|_, exp| exp.saturating_add(VALIDATION_LEEWAY_SECS) >= now);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!("evicted {evicted} expired entries from the token blacklist");
        }

        entries.insert(claims.jti.clone(), claims.exp).is_none()
    }

    #[cfg(test)]
    fn blacklist_len(&self) -> usize {
        self.blacklist
            .as_ref()
            .and_then(|blacklist| blacklist.read().ok().map(|entries| entries.len()))
            .unwrap_or_default()
    }
}

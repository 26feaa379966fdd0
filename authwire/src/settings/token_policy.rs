//! Token lifetime policy.

use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetimes and rotation behavior for issued JWTs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
    pub sliding_token_lifetime: Duration,
    pub sliding_token_refresh_lifetime: Duration,
    /// Issue a new refresh token on every refresh.
    pub rotate_refresh_tokens: bool,
    /// Reject a refresh token once it has been rotated out.
    pub blacklist_after_rotation: bool,
    /// Accepted `Authorization` header schemes.
    pub auth_header_types: Vec<String>,
}

impl TokenPolicy {
    /// Policy with the given access-token lifetime and stock values elsewhere.
    #[must_use]
    pub fn with_access_minutes(minutes: u64) -> Self {
        Self {
            access_token_lifetime: MINUTE
                .saturating_mul(u32::try_from(minutes).unwrap_or(u32::MAX)),
            refresh_token_lifetime: DAY,
            sliding_token_lifetime: DAY * 5,
            sliding_token_refresh_lifetime: DAY * 5,
            rotate_refresh_tokens: false,
            blacklist_after_rotation: true,
            auth_header_types: vec!["Bearer".to_string()],
        }
    }
}

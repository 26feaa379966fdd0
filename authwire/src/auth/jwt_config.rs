//! JWT key configuration.
//!
//! # Pre-conditions
//! - HS256 secrets are non-empty.
//! - RS256 keys are PEM-encoded: a PKCS#1 or PKCS#8 private key and the
//!   matching public key.
//!
//! # Post-conditions
//! - A constructed `JwtConfig` always yields usable encoding and decoding keys.
//!
//! # Invariants
//! - Key material never appears in `Debug` output.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

/// Error returned when JWT configuration is invalid.
#[derive(Debug)]
pub enum JwtConfigError {
    /// The HS256 secret is empty.
    EmptySecret,
    /// The RS256 private key is not a valid PEM-encoded RSA private key.
    InvalidRs256PrivateKey(String),
    /// The RS256 public key is not a valid PEM-encoded RSA public key.
    InvalidRs256PublicKey(String),
}

impl std::fmt::Display for JwtConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
            Self::InvalidRs256PrivateKey(reason) => {
                write!(f, "invalid RS256 private key: {reason}")
            }
            Self::InvalidRs256PublicKey(reason) => {
                write!(f, "invalid RS256 public key: {reason}")
            }
        }
    }
}

impl std::error::Error for JwtConfigError {}

/// JWT signing/verification configuration.
///
/// Supports both symmetric (HS256) and asymmetric (RS256) algorithms.
#[derive(Clone)]
pub enum JwtConfig {
    /// HMAC-SHA256 symmetric signing.
    Hs256 {
        /// The shared secret used for both signing and verification.
        secret: Vec<u8>,
    },
    /// RSA-SHA256 asymmetric signing.
    Rs256 {
        /// PEM-encoded RSA private key, used for signing.
        private_key: String,
        /// PEM-encoded RSA public key, used for verification.
        public_key: String,
    },
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hs256 { .. } => f.write_str("JwtConfig::Hs256 { .. }"),
            Self::Rs256 { .. } => f.write_str("JwtConfig::Rs256 { .. }"),
        }
    }
}

impl JwtConfig {
    /// Create a new HS256 JWT configuration.
    ///
    /// # Errors
    /// Returns `JwtConfigError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: Vec<u8>) -> Result<Self, JwtConfigError> {
        if secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }
        Ok(Self::Hs256 { secret })
    }

    /// Create a new RS256 JWT configuration.
    ///
    /// # Errors
    /// Returns `JwtConfigError::InvalidRs256PrivateKey` or
    /// `JwtConfigError::InvalidRs256PublicKey` if either key does not parse.
    pub fn new_rs256(private_key: String, public_key: String) -> Result<Self, JwtConfigError> {
        EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| JwtConfigError::InvalidRs256PrivateKey(e.to_string()))?;
        DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| JwtConfigError::InvalidRs256PublicKey(e.to_string()))?;

        Ok(Self::Rs256 {
            private_key,
            public_key,
        })
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hs256 { .. } => Algorithm::HS256,
            Self::Rs256 { .. } => Algorithm::RS256,
        }
    }

    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, JwtConfigError> {
        match self {
            Self::Hs256 { secret } => {
                if secret.is_empty() {
                    return Err(JwtConfigError::EmptySecret);
                }
                Ok(EncodingKey::from_secret(secret))
            }
            Self::Rs256 { private_key, .. } => EncodingKey::from_rsa_pem(private_key.as_bytes())
                .map_err(|e| JwtConfigError::InvalidRs256PrivateKey(e.to_string())),
        }
    }

    pub(crate) fn decoding_key(&self) -> Result<DecodingKey, JwtConfigError> {
        match self {
            Self::Hs256 { secret } => {
                if secret.is_empty() {
                    return Err(JwtConfigError::EmptySecret);
                }
                Ok(DecodingKey::from_secret(secret))
            }
            Self::Rs256 { public_key, .. } => DecodingKey::from_rsa_pem(public_key.as_bytes())
                .map_err(|e| JwtConfigError::InvalidRs256PublicKey(e.to_string())),
        }
    }
}

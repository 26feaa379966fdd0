//! Well-known extension and middleware stage names.
//!
//! Names are plain strings so hosts can mix their own entries into the same
//! ordered lists. Framework-core extensions share the [`CORE_PREFIX`]; every
//! extension this crate manages shares the [`MANAGED_PREFIX`].

/// Prefix shared by all framework-core extensions.
pub const CORE_PREFIX: &str = "core.";
/// Prefix shared by all extensions inserted by the settings mutator.
pub const MANAGED_PREFIX: &str = "authwire.";

/// Framework-core extensions installed by [`super::Settings::new`].
pub mod core {
    pub const ADMIN: &str = "core.admin";
    pub const AUTH: &str = "core.auth";
    pub const CONTENT_TYPES: &str = "core.content_types";
    pub const SESSIONS: &str = "core.sessions";
    pub const MESSAGES: &str = "core.messages";
    pub const STATIC_FILES: &str = "core.static_files";
}

/// Extensions inserted by the settings mutator.
pub mod extension {
    /// REST behavior defaults (renderers, parsers, authenticators, permissions).
    pub const REST: &str = "authwire.rest";
    /// Legacy API-key tokens. Enables the API-key authenticator.
    pub const API_KEYS: &str = "authwire.api_keys";
    /// Cross-origin policy.
    pub const CORS: &str = "authwire.cors";
    /// JWT access/refresh tokens.
    pub const JWT: &str = "authwire.jwt";
    /// Refresh-token blacklist. Enables blacklisting after rotation.
    pub const JWT_BLACKLIST: &str = "authwire.jwt.blacklist";
    /// Static and media file serving.
    pub const STATIC_FILES: &str = "authwire.static_files";
}

/// Middleware stage names.
pub mod stage {
    pub const SECURITY: &str = "security";
    pub const SESSION: &str = "session";
    pub const COMMON: &str = "common";
    pub const AUTHENTICATION: &str = "authentication";
    pub const MESSAGES: &str = "messages";
    pub const CLICKJACKING: &str = "clickjacking";
    pub const CORS: &str = "cors";
    pub const CSRF: &str = "csrf";
    pub const STATIC_FILES: &str = "static_files";
}

//! Application settings and the one-time settings mutator.
//!
//! `Settings` is the host's framework configuration. It is built from
//! defaults with [`Settings::new`], adjusted by the host, passed once through
//! [`configure`] at startup and then frozen behind an `Arc` for the request
//! path.
//!
//! # Pre-conditions
//! - The host owns the only reference while `configure` runs.
//!
//! # Post-conditions
//! - After `configure`, `rest_defaults` and `token_policy` are populated.
//!
//! # Invariants
//! - Ordered lists never contain duplicate entries added by this module.

pub mod cors;
pub mod mutator;
pub mod names;
pub mod pipeline;
pub mod rest;
pub mod token_policy;

use std::path::PathBuf;

pub use cors::{CorsOptions, configure_cors, origins_for};
pub use mutator::{ConfigureOptions, ConfigureReport, configure};
pub use rest::{AuthenticationClass, Parser, PermissionClass, Renderer, RestDefaults};
pub use token_policy::TokenPolicy;

/// Name of the installed-extensions list, used in error messages.
pub const EXTENSIONS_LIST: &str = "installed_extensions";
/// Name of the middleware chain, used in error messages.
pub const MIDDLEWARE_LIST: &str = "middleware";

/// Error returned when settings cannot be configured or consumed.
#[derive(Debug)]
pub enum SettingsError {
    /// A relative placement referenced an entry that is not in the list.
    AnchorNotFound {
        /// The list that was searched.
        list: &'static str,
        /// The missing anchor.
        anchor: String,
    },
    /// A value the caller relies on has not been populated by `configure`.
    NotConfigured(&'static str),
    /// A filesystem operation failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnchorNotFound { list, anchor } => {
                write!(f, "anchor '{anchor}' not found in {list}")
            }
            Self::NotConfigured(field) => {
                write!(f, "settings field '{field}' has not been configured")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::AnchorNotFound { .. } | Self::NotConfigured(_) => None,
        }
    }
}

/// Host application settings.
///
/// `Option` fields are "unset" when `None`; the mutator fills them only in
/// that case. List fields are merged into, never replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Project directory; static and media roots default to children of it.
    pub base_dir: PathBuf,
    /// Installed extensions, in load order.
    pub installed_extensions: Vec<String>,
    /// Middleware chain, outermost stage first.
    pub middleware: Vec<String>,
    pub rest_defaults: Option<RestDefaults>,
    pub token_policy: Option<TokenPolicy>,
    pub cors_allowed_origins: Vec<String>,
    pub csrf_trusted_origins: Vec<String>,
    pub allowed_hosts: Vec<String>,
    pub csrf_cookie_path: Option<String>,
    pub session_cookie_path: Option<String>,
    pub static_root: Option<PathBuf>,
    pub static_url: Option<String>,
    pub media_root: Option<PathBuf>,
    pub media_url: Option<String>,
}

impl Settings {
    /// Framework defaults: core extensions and the stock middleware chain.
    #[must_use]
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            installed_extensions: [
                names::core::ADMIN,
                names::core::AUTH,
                names::core::CONTENT_TYPES,
                names::core::SESSIONS,
                names::core::MESSAGES,
                names::core::STATIC_FILES,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            middleware: [
                names::stage::SECURITY,
                names::stage::SESSION,
                names::stage::COMMON,
                names::stage::AUTHENTICATION,
                names::stage::MESSAGES,
                names::stage::CLICKJACKING,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            rest_defaults: None,
            token_policy: None,
            cors_allowed_origins: Vec::new(),
            csrf_trusted_origins: Vec::new(),
            allowed_hosts: Vec::new(),
            csrf_cookie_path: None,
            session_cookie_path: None,
            static_root: None,
            static_url: None,
            media_root: None,
            media_url: None,
        }
    }

    #[must_use]
    pub fn has_extension(&self, name: &str) -> bool {
        pipeline::position(&self.installed_extensions, name).is_some()
    }

    #[must_use]
    pub fn has_stage(&self, name: &str) -> bool {
        pipeline::position(&self.middleware, name).is_some()
    }

    /// The REST defaults, or an error if `configure` has not run.
    pub fn rest_defaults(&self) -> Result<&RestDefaults, SettingsError> {
        self.rest_defaults
            .as_ref()
            .ok_or(SettingsError::NotConfigured("rest_defaults"))
    }

    /// The token policy, or an error if `configure` has not run.
    pub fn token_policy(&self) -> Result<&TokenPolicy, SettingsError> {
        self.token_policy
            .as_ref()
            .ok_or(SettingsError::NotConfigured("token_policy"))
    }
}

//! Stack configuration module.
//!
//! Loads the binary's configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `AUTHWIRE_SECRET_KEY`: HS256 signing secret (required)
//! - `AUTHWIRE_LISTEN_PORT`: Port to listen on (default: `8000`)
//! - `AUTHWIRE_BASE_DIR`: Project directory (default: `.`)
//! - `AUTHWIRE_CORS_HOSTS`: Comma-separated cross-origin hosts (default: `localhost`)
//! - `AUTHWIRE_CORS_PORTS`: Comma-separated cross-origin ports (default: `3000`)
//! - `AUTHWIRE_TOKEN_LIFETIME_MINUTES`: Access-token lifetime (default: `60`)
//! - `AUTHWIRE_SERVE_STATIC`: Serve static and media files (default: `true`)
//! - `AUTHWIRE_ADMIN_USERNAME` / `AUTHWIRE_ADMIN_PASSWORD`: Optional admin account
//!
//! # Invariants
//!
//! - `token_lifetime_minutes` is always greater than zero
//! - `admin` is only set when both admin variables are present

use std::path::PathBuf;

use crate::settings::{ConfigureOptions, CorsOptions};

const SECRET_KEY: &str = "AUTHWIRE_SECRET_KEY";
const LISTEN_PORT: &str = "AUTHWIRE_LISTEN_PORT";
const BASE_DIR: &str = "AUTHWIRE_BASE_DIR";
const CORS_HOSTS: &str = "AUTHWIRE_CORS_HOSTS";
const CORS_PORTS: &str = "AUTHWIRE_CORS_PORTS";
const TOKEN_LIFETIME_MINUTES: &str = "AUTHWIRE_TOKEN_LIFETIME_MINUTES";
const SERVE_STATIC: &str = "AUTHWIRE_SERVE_STATIC";
const ADMIN_USERNAME: &str = "AUTHWIRE_ADMIN_USERNAME";
const ADMIN_PASSWORD: &str = "AUTHWIRE_ADMIN_PASSWORD";

/// Credentials for the admin account seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Binary configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`, `secret_key` is non-empty and
/// `token_lifetime_minutes` is positive.
#[derive(Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// HS256 signing secret.
    pub secret_key: String,
    /// Port to listen on.
    pub listen_port: u16,
    /// Project directory; static and media roots live under it.
    pub base_dir: PathBuf,
    /// Hosts admitted by the cross-origin policy.
    pub cors_hosts: Vec<String>,
    /// Ports admitted by the cross-origin policy.
    pub cors_ports: Vec<u16>,
    /// Access-token lifetime in minutes.
    pub token_lifetime_minutes: u64,
    /// Serve static and media files.
    pub serve_static: bool,
    /// Admin account to create at startup.
    pub admin: Option<AdminCredentials>,
}

impl std::fmt::Debug for StackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackConfig")
            .field("listen_port", &self.listen_port)
            .field("base_dir", &self.base_dir)
            .field("cors_hosts", &self.cors_hosts)
            .field("cors_ports", &self.cors_ports)
            .field("token_lifetime_minutes", &self.token_lifetime_minutes)
            .field("serve_static", &self.serve_static)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StackConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default project directory.
    pub const DEFAULT_BASE_DIR: &'static str = ".";
    /// Default cross-origin host.
    pub const DEFAULT_CORS_HOST: &'static str = "localhost";
    /// Default cross-origin port.
    pub const DEFAULT_CORS_PORT: u16 = 3000;
    /// Default access-token lifetime.
    pub const DEFAULT_TOKEN_LIFETIME_MINUTES: u64 = 60;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `AUTHWIRE_SECRET_KEY` is not set or is empty
    /// - a numeric or boolean variable is set but cannot be parsed
    /// - only one of the admin variables is set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's
    /// value or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Same as [`StackConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: load_secret_key(&lookup)?,
            listen_port: load_listen_port(&lookup)?,
            base_dir: lookup(BASE_DIR)
                .map_or_else(|| PathBuf::from(Self::DEFAULT_BASE_DIR), PathBuf::from),
            cors_hosts: load_cors_hosts(&lookup),
            cors_ports: load_cors_ports(&lookup)?,
            token_lifetime_minutes: load_token_lifetime(&lookup)?,
            serve_static: load_serve_static(&lookup)?,
            admin: load_admin(&lookup)?,
        })
    }

    /// Options for the settings mutator.
    #[must_use]
    pub fn configure_options(&self) -> ConfigureOptions {
        ConfigureOptions {
            cors: CorsOptions {
                hosts: self.cors_hosts.clone(),
                ports: self.cors_ports.clone(),
            },
            token_lifetime_minutes: self.token_lifetime_minutes,
            serve_static: self.serve_static,
        }
    }
}

fn load_secret_key(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    let key = lookup(SECRET_KEY).ok_or_else(|| ConfigError::MissingEnvVar(SECRET_KEY.to_string()))?;

    if key.is_empty() {
        return Err(invalid(SECRET_KEY, "must not be empty"));
    }

    Ok(key)
}

fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
    match lookup(LISTEN_PORT) {
        Some(value) => parse_port(LISTEN_PORT, &value),
        None => Ok(StackConfig::DEFAULT_PORT),
    }
}

fn load_cors_hosts(lookup: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    lookup(CORS_HOSTS).map_or_else(
        || vec![StackConfig::DEFAULT_CORS_HOST.to_string()],
        |value| split_list(&value).map(String::from).collect(),
    )
}

fn load_cors_ports(lookup: &impl Fn(&str) -> Option<String>) -> Result<Vec<u16>, ConfigError> {
    match lookup(CORS_PORTS) {
        Some(value) => split_list(&value)
            .map(|port| parse_port(CORS_PORTS, port))
            .collect(),
        None => Ok(vec![StackConfig::DEFAULT_CORS_PORT]),
    }
}

fn load_token_lifetime(lookup: &impl Fn(&str) -> Option<String>) -> Result<u64, ConfigError> {
    let Some(value) = lookup(TOKEN_LIFETIME_MINUTES) else {
        return Ok(StackConfig::DEFAULT_TOKEN_LIFETIME_MINUTES);
    };

    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid(TOKEN_LIFETIME_MINUTES, "must be greater than zero")),
        Ok(minutes) => Ok(minutes),
        Err(_) => Err(invalid(
            TOKEN_LIFETIME_MINUTES,
            &format!("'{value}' is not a whole number of minutes"),
        )),
    }
}

fn load_serve_static(lookup: &impl Fn(&str) -> Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = lookup(SERVE_STATIC) else {
        return Ok(true);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(SERVE_STATIC, &format!("'{value}' is not a boolean"))),
    }
}

fn load_admin(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<AdminCredentials>, ConfigError> {
    match (lookup(ADMIN_USERNAME), lookup(ADMIN_PASSWORD)) {
        (Some(username), Some(password)) => {
            if username.is_empty() {
                return Err(invalid(ADMIN_USERNAME, "must not be empty"));
            }
            Ok(Some(AdminCredentials { username, password }))
        }
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::MissingEnvVar(ADMIN_PASSWORD.to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar(ADMIN_USERNAME.to_string())),
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(invalid(
            name,
            &format!("'{value}' is not a valid port number (must be 1-65535)"),
        )),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

//! Route table and the standard auth routes.
//!
//! The host collects its routes in a [`RouteTable`] before the router is
//! built. Entries are keyed by name; pushing a name that is already present
//! leaves the table unchanged.
//!
//! # Invariants
//! - Route names are unique within a table.
//! - Entries keep insertion order.

pub mod handlers;

use axum::http::Method;
use axum::routing::{MethodFilter, MethodRouter, on};

use crate::app::AppState;
use crate::auth::Requirement;

/// Names of the standard auth routes.
pub mod names {
    pub const TOKEN_OBTAIN_PAIR: &str = "token_obtain_pair";
    pub const TOKEN_REFRESH: &str = "token_refresh";
    pub const TOKEN_VERIFY: &str = "token_verify";
    pub const LOGIN: &str = "login";
    pub const CSRF: &str = "csrf";
}

/// Handler behind a route.
#[derive(Clone)]
pub enum Endpoint {
    TokenObtain,
    TokenRefresh,
    TokenVerify,
    Login,
    CsrfToken,
    /// A host-provided handler.
    Custom(MethodRouter<AppState>),
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenObtain => write!(f, "TokenObtain"),
            Self::TokenRefresh => write!(f, "TokenRefresh"),
            Self::TokenVerify => write!(f, "TokenVerify"),
            Self::Login => write!(f, "Login"),
            Self::CsrfToken => write!(f, "CsrfToken"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Endpoint {
    /// The method router serving this endpoint for `method`.
    ///
    /// Custom endpoints bring their own method routing and ignore `method`.
    ///
    /// # Errors
    /// Returns the method back if axum cannot route it.
    pub fn into_method_router(self, method: &Method) -> Result<MethodRouter<AppState>, Method> {
        let filter = || MethodFilter::try_from(method.clone()).map_err(|_| method.clone());
        Ok(match self {
            Self::TokenObtain => on(filter()?, handlers::token_obtain),
            Self::TokenRefresh => on(filter()?, handlers::token_refresh),
            Self::TokenVerify => on(filter()?, handlers::token_verify),
            Self::Login => on(filter()?, handlers::login),
            Self::CsrfToken => on(filter()?, handlers::csrf_token),
            Self::Custom(router) => router,
        })
    }
}

/// Who may call a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anonymous callers are allowed.
    AllowAny,
    /// Callers must meet the requirement.
    Require(Requirement),
    /// Whatever the REST default permissions demand.
    Default,
}

/// A named route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub name: String,
    pub path: String,
    pub method: Method,
    pub endpoint: Endpoint,
    pub access: Access,
}

impl RouteEntry {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        endpoint: Endpoint,
        access: Access,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            method,
            endpoint,
            access,
        }
    }
}

/// Ordered, name-keyed list of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless its name is already present.
    ///
    /// Returns `true` when the entry was added.
    pub fn push(&mut self, entry: RouteEntry) -> bool {
        if self.contains(&entry.name) {
            tracing::debug!("route '{}' already registered", entry.name);
            return false;
        }
        self.entries.push(entry);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for RouteTable {
    type Item = RouteEntry;
    type IntoIter = std::vec::IntoIter<RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The standard auth routes, in registration order.
fn auth_routes() -> [RouteEntry; 5] {
    [
        RouteEntry::new(
            names::TOKEN_OBTAIN_PAIR,
            Method::POST,
            "/api/token/",
            Endpoint::TokenObtain,
            Access::AllowAny,
        ),
        RouteEntry::new(
            names::TOKEN_REFRESH,
            Method::POST,
            "/api/token/refresh/",
            Endpoint::TokenRefresh,
            Access::AllowAny,
        ),
        RouteEntry::new(
            names::TOKEN_VERIFY,
            Method::POST,
            "/api/token/verify/",
            Endpoint::TokenVerify,
            Access::AllowAny,
        ),
        RouteEntry::new(
            names::LOGIN,
            Method::POST,
            "/api/login/",
            Endpoint::Login,
            Access::AllowAny,
        ),
        RouteEntry::new(
            names::CSRF,
            Method::GET,
            "/api/csrf/",
            Endpoint::CsrfToken,
            Access::Require(Requirement::Authenticated),
        ),
    ]
}

/// Append the standard auth routes that are not registered yet.
///
/// Returns the number of routes added.
pub fn register_auth_routes(table: &mut RouteTable) -> usize {
    let added = auth_routes()
        .into_iter()
        .filter(|entry| table.push(entry.clone()))
        .count();

    if added > 0 {
        tracing::info!("registered {added} auth routes");
    }
    added
}

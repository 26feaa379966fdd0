//! Router assembly.
//!
//! [`build_router`] turns configured settings and a route table into an
//! `axum::Router`.
//!
//! # Pre-conditions
//! - `configure` has run on the settings.
//!
//! # Post-conditions
//! - The first middleware stage is the outermost layer; the request trace
//!   layer wraps all of them.
//! - Routes that require identity are wrapped in a guard.
//!
//! # Invariants
//! - Route paths and mount points are unique.
//! - Conflicting paths are reported as errors before they reach the router.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{
    ApiKeyStore, AuthAccessor, Guard, JwtConfig, TokenService, UserStore, enforce, identify,
};
use crate::routes::{Access, RouteTable};
use crate::settings::names::{extension, stage};
use crate::settings::{Settings, SettingsError};

/// Error returned when the router cannot be assembled.
#[derive(Debug)]
pub enum StackError {
    /// The settings have not been configured.
    Settings(SettingsError),
    /// Two routes, or a route and a file mount, claim the same requests.
    DuplicatePath(String),
    /// A route path does not start with `/` or has malformed captures.
    InvalidPath(String),
    /// A static or media URL cannot be mounted.
    InvalidMountUrl(String),
    /// A route's method cannot be routed.
    UnsupportedMethod { route: String, method: Method },
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "settings error: {e}"),
            Self::DuplicatePath(path) => write!(f, "duplicate route path: {path}"),
            Self::InvalidPath(path) => write!(f, "invalid route path: {path}"),
            Self::InvalidMountUrl(url) => write!(f, "cannot mount files at '{url}'"),
            Self::UnsupportedMethod { route, method } => {
                write!(f, "route '{route}' uses unsupported method {method}")
            }
        }
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Settings(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SettingsError> for StackError {
    fn from(error: SettingsError) -> Self {
        Self::Settings(error)
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    accessor: Arc<AuthAccessor>,
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
    api_keys: Arc<dyn ApiKeyStore>,
}

impl AppState {
    /// Build the token service and accessor for configured settings.
    ///
    /// API keys are only accepted as credentials when the API-key extension
    /// is installed; the login route issues them either way.
    ///
    /// # Errors
    /// Returns `SettingsError::NotConfigured` if `configure` has not run.
    pub fn new(
        settings: Arc<Settings>,
        jwt_config: JwtConfig,
        users: Arc<dyn UserStore>,
        api_keys: Arc<dyn ApiKeyStore>,
    ) -> Result<Self, SettingsError> {
        let tokens = Arc::new(TokenService::from_settings(jwt_config, &settings)?);
        let authenticators = settings.rest_defaults()?.authentication.clone();
        let key_authentication = settings
            .has_extension(extension::API_KEYS)
            .then(|| Arc::clone(&api_keys));

        let accessor = Arc::new(AuthAccessor::new(
            Arc::clone(&tokens),
            Arc::clone(&users),
            key_authentication,
            authenticators,
        ));

        Ok(Self {
            settings,
            accessor,
            tokens,
            users,
            api_keys,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn accessor(&self) -> Arc<AuthAccessor> {
        Arc::clone(&self.accessor)
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn api_keys(&self) -> &dyn ApiKeyStore {
        self.api_keys.as_ref()
    }
}

/// Assemble the application router.
///
/// # Errors
/// Returns `StackError` if the settings are unconfigured, a path is
/// duplicated or invalid, or a route's method cannot be routed.
pub fn build_router(
    settings: &Settings,
    routes: RouteTable,
    state: AppState,
) -> Result<Router, StackError> {
    let default_requirement = settings.rest_defaults()?.default_requirement();
    let mut paths = PathRegistry::default();
    let mut router = Router::new();

    for entry in routes {
        paths.claim_route(&entry.path)?;

        let requirement = match entry.access {
            Access::AllowAny => None,
            Access::Require(requirement) => Some(requirement),
            Access::Default => default_requirement,
        };

        let mut method_router = entry
            .endpoint
            .into_method_router(&entry.method)
            .map_err(|method| StackError::UnsupportedMethod {
                route: entry.name.clone(),
                method,
            })?;
        if let Some(requirement) = requirement {
            let guard = Guard::new(state.accessor(), requirement);
            method_router =
                method_router.route_layer(middleware::from_fn_with_state(guard, enforce));
        }

        tracing::debug!(
            "route '{}': {} {} ({requirement:?})",
            entry.name,
            entry.method,
            entry.path
        );
        router = router.route(&entry.path, method_router);
    }

    if settings.has_stage(stage::STATIC_FILES) {
        router = mount_dir(
            router,
            &mut paths,
            settings.static_url.as_deref(),
            settings.static_root.as_deref(),
        )?;
        router = mount_dir(
            router,
            &mut paths,
            settings.media_url.as_deref(),
            settings.media_root.as_deref(),
        )?;
    }

    let mut router: Router = router.with_state(state.clone());
    for name in settings.middleware.iter().rev() {
        router = apply_stage(router, name, settings, &state);
    }

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Ok(router.layer(trace_layer))
}

fn mount_dir(
    router: Router<AppState>,
    paths: &mut PathRegistry,
    url: Option<&str>,
    root: Option<&Path>,
) -> Result<Router<AppState>, StackError> {
    let (Some(url), Some(root)) = (url, root) else {
        return Ok(router);
    };

    let mount = url.trim_end_matches('/');
    if mount.is_empty() || !mount.starts_with('/') || mount.contains(['{', '}']) {
        return Err(StackError::InvalidMountUrl(url.to_string()));
    }
    paths.claim_mount(mount)?;

    tracing::debug!("serving {} at {url}", root.display());
    Ok(router.nest_service(mount, ServeDir::new(root)))
}

/// Route paths and file mounts claimed so far.
///
/// Two routes conflict when they differ only in capture names, or when they
/// name the same position's capture differently. A mount owns every path
/// below it.
#[derive(Debug, Default)]
struct PathRegistry {
    /// Claimed route paths with capture names erased.
    shapes: HashSet<String>,
    /// Capture name at each position, keyed by the erased path before it.
    captures: HashMap<String, String>,
    routes: Vec<String>,
    mounts: Vec<String>,
}

impl PathRegistry {
    fn claim_route(&mut self, path: &str) -> Result<(), StackError> {
        let invalid = || StackError::InvalidPath(path.to_string());
        let duplicate = || StackError::DuplicatePath(path.to_string());
        if !path.starts_with('/') {
            return Err(invalid());
        }

        let segments: Vec<&str> = path.split('/').skip(1).collect();
        let mut shape = String::new();
        let mut captures = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            // `:id` and `*rest` are the pre-0.8 capture syntax.
            if segment.starts_with([':', '*']) {
                return Err(invalid());
            }
            shape.push('/');
            match capture_name(segment) {
                Some("" | "*") => return Err(invalid()),
                Some(name) if name.starts_with('*') => {
                    if index + 1 != segments.len() {
                        return Err(invalid());
                    }
                    captures.push((shape.clone(), name));
                    shape.push_str("{*}");
                }
                Some(name) => {
                    captures.push((shape.clone(), name));
                    shape.push_str("{}");
                }
                None => shape.push_str(&erase_captures(segment).ok_or_else(invalid)?),
            }
        }

        if self.shapes.contains(&shape) || self.mounts.iter().any(|mount| is_under(path, mount)) {
            return Err(duplicate());
        }
        let renamed = captures.iter().any(|(prefix, name)| {
            self.captures.get(prefix).is_some_and(|existing| existing != name)
        });
        if renamed {
            return Err(duplicate());
        }

        for (prefix, name) in captures {
            self.captures.entry(prefix).or_insert_with(|| name.to_string());
        }
        self.shapes.insert(shape);
        self.routes.push(path.to_string());
        Ok(())
    }

    fn claim_mount(&mut self, mount: &str) -> Result<(), StackError> {
        let taken = self
            .routes
            .iter()
            .chain(&self.mounts)
            .any(|path| is_under(path, mount) || is_under(mount, path));
        if taken {
            return Err(StackError::DuplicatePath(mount.to_string()));
        }
        self.mounts.push(mount.to_string());
        Ok(())
    }
}

/// Name of a capture filling the whole segment, like `id` for `{id}`.
fn capture_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    if name.contains(['{', '}']) { None } else { Some(name) }
}

/// `segment` with captures inside it replaced by `{}`, or `None` when its
/// braces do not balance.
fn erase_captures(segment: &str) -> Option<String> {
    let mut erased = String::with_capacity(segment.len());
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                erased.push_str("{{");
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                erased.push_str("}}");
            }
            '{' => {
                let mut name_len = 0;
                loop {
                    match chars.next()? {
                        '}' => break,
                        '{' => return None,
                        _ => name_len += 1,
                    }
                }
                if name_len == 0 {
                    return None;
                }
                erased.push_str("{}");
            }
            '}' => return None,
            other => erased.push(other),
        }
    }
    Some(erased)
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn apply_stage(router: Router, name: &str, settings: &Settings, state: &AppState) -> Router {
    match name {
        stage::SECURITY => router
            .layer(SetResponseHeaderLayer::if_not_present(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                REFERRER_POLICY,
                HeaderValue::from_static("same-origin"),
            )),
        stage::CORS => router.layer(build_cors_layer(&settings.cors_allowed_origins)),
        stage::AUTHENTICATION => {
            router.layer(middleware::from_fn_with_state(state.accessor(), identify))
        }
        stage::CLICKJACKING => router.layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        )),
        other => {
            tracing::debug!("middleware stage '{other}' is left to the host");
            router
        }
    }
}

/// CORS layer admitting exactly `allowed_origins`.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: invalid origin in settings: {origin}");
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS: no valid origins configured, denying cross-origin requests");
        return CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")));
    }

    tracing::debug!("CORS: allowing {} origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT, ORIGIN])
        .allow_credentials(true)
}

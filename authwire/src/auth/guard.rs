//! Route guards.
//!
//! `identify` runs as the `authentication` middleware stage and attaches an
//! [`AuthenticatedUser`] to requests that carry valid credentials. `enforce`
//! wraps individual routes and rejects requests that do not meet the
//! route's [`Requirement`]. [`CurrentUser`] hands the user to handlers.
//!
//! # Post-conditions
//! - A handler behind `enforce` always sees an `AuthenticatedUser`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::UserIdentity;
use super::accessor::{AuthAccessor, AuthenticatedUser};

const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// What a guarded route demands of the caller. Ordered from least to most
/// strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Requirement {
    /// Any active user.
    Authenticated,
    /// A staff user.
    Staff,
    /// A superuser.
    Superuser,
}

impl Requirement {
    #[must_use]
    pub const fn is_met_by(self, user: &UserIdentity) -> bool {
        match self {
            Self::Authenticated => user.is_active(),
            Self::Staff => user.is_active() && user.is_staff(),
            Self::Superuser => user.is_active() && user.is_superuser(),
        }
    }
}

/// Why a guard turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// No valid credentials.
    NotAuthenticated,
    /// Valid credentials for a user that does not meet the requirement.
    Forbidden,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => {
                let body = Json(json!({ "detail": NOT_AUTHENTICATED }));
                let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"api\""));
                response
            }
            Self::Forbidden => {
                let body = Json(json!({ "detail": PERMISSION_DENIED }));
                (StatusCode::FORBIDDEN, body).into_response()
            }
        }
    }
}

/// State for [`enforce`].
#[derive(Clone)]
pub struct Guard {
    accessor: Arc<AuthAccessor>,
    requirement: Requirement,
}

impl Guard {
    #[must_use]
    pub const fn new(accessor: Arc<AuthAccessor>, requirement: Requirement) -> Self {
        Self {
            accessor,
            requirement,
        }
    }

    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }
}

/// Attach the authenticated user, if any, to the request.
pub async fn identify(
    State(accessor): State<Arc<AuthAccessor>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = accessor.authenticate(request.headers()) {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// Reject requests that do not meet the guard's requirement.
///
/// Uses the user attached by [`identify`] when that stage ran, and
/// authenticates the request itself otherwise.
pub async fn enforce(
    State(guard): State<Guard>,
    mut request: Request,
    next: Next,
) -> Result<Response, GuardRejection> {
    let user = match request.extensions().get::<AuthenticatedUser>() {
        Some(user) => user.clone(),
        None => guard
            .accessor
            .authenticate(request.headers())
            .ok_or(GuardRejection::NotAuthenticated)?,
    };

    if !guard.requirement.is_met_by(user.user()) {
        tracing::debug!(
            "user {} does not meet {:?}",
            user.user().username(),
            guard.requirement
        );
        return Err(GuardRejection::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// The authenticated user of a guarded request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Self)
            .ok_or(GuardRejection::NotAuthenticated)
    }
}

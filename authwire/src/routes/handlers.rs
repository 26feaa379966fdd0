//! Handlers for the standard auth routes.
//!
//! Request bodies are accepted as JSON or as URL-encoded forms. A body that
//! cannot be parsed reads as one with every field missing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, FromRequest, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::app::AppState;
use crate::auth::{CurrentUser, JwtError, UserIdentity, UserStore, authenticate};
use crate::random::random_alphanumeric;

const MISSING_CREDENTIALS: &str = "Please provide username and password.";
const INVALID_CREDENTIALS: &str = "Invalid Credentials";
const NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";
const FIELD_REQUIRED: &str = "This field is required.";
const FIELD_BLANK: &str = "This field may not be blank.";
const TOKEN_NOT_VALID: &str = "token_not_valid";

const CSRF_TOKEN_LEN: usize = 64;

/// A request body parsed from JSON or a URL-encoded form.
pub struct Payload<T>(pub Option<T>);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let parsed = if is_form {
            Form::<T>::from_request(request, state)
                .await
                .map(|Form(value)| value)
                .map_err(|e| tracing::debug!("unreadable form body: {e}"))
                .ok()
        } else {
            Json::<T>::from_request(request, state)
                .await
                .map(|Json(value)| value)
                .map_err(|e| tracing::debug!("unreadable JSON body: {e}"))
                .ok()
        };
        Ok(Self(parsed))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

/// Exchange a username and password for the user's API key.
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<CredentialsRequest>,
) -> Response {
    let body = body.unwrap_or_default();
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_CREDENTIALS);
    };

    let user = match check_credentials(state.users(), username.clone(), password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("failed login attempt for '{username}'");
            return error_response(StatusCode::NOT_FOUND, INVALID_CREDENTIALS);
        }
        Err(response) => return response,
    };

    match state.api_keys().get_or_create(user.id()) {
        Ok(token) => {
            tracing::info!("user '{}' logged in", user.username());
            Json(json!({ "token": token, "id": user.id() })).into_response()
        }
        Err(e) => {
            tracing::error!("failed to issue API key for user {}: {e}", user.id());
            internal_error()
        }
    }
}

/// A fresh CSRF token for an authenticated caller.
pub async fn csrf_token(CurrentUser(user): CurrentUser) -> Response {
    tracing::debug!("issued CSRF token for '{}'", user.user().username());
    Json(json!({ "csrfToken": random_alphanumeric(CSRF_TOKEN_LEN) })).into_response()
}

/// Exchange a username and password for an access/refresh token pair.
pub async fn token_obtain(
    State(state): State<AppState>,
    Payload(body): Payload<CredentialsRequest>,
) -> Response {
    let body = body.unwrap_or_default();
    if let Some(response) = field_errors(&[
        ("username", body.username.as_deref()),
        ("password", body.password.as_deref()),
    ]) {
        return response;
    }

    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();
    let user = match check_credentials(state.users(), username, password).await {
        Ok(Some(user)) => user,
        Ok(None) => return detail_response(StatusCode::UNAUTHORIZED, NO_ACTIVE_ACCOUNT),
        Err(response) => return response,
    };

    match state.tokens().issue_pair(user.id()) {
        Ok(pair) => {
            tracing::debug!("issued token pair for user {}", user.id());
            Json(pair).into_response()
        }
        Err(e) => {
            tracing::error!("failed to issue token pair: {e}");
            internal_error()
        }
    }
}

/// Exchange a refresh token for a new access token.
pub async fn token_refresh(
    State(state): State<AppState>,
    Payload(body): Payload<RefreshRequest>,
) -> Response {
    let body = body.unwrap_or_default();
    if let Some(response) = field_errors(&[("refresh", body.refresh.as_deref())]) {
        return response;
    }

    match state.tokens().refresh(body.refresh.as_deref().unwrap_or_default()) {
        Ok(refreshed) => Json(refreshed).into_response(),
        Err(e) => token_not_valid(&e),
    }
}

/// Check that a token of either kind is valid.
pub async fn token_verify(
    State(state): State<AppState>,
    Payload(body): Payload<VerifyRequest>,
) -> Response {
    let body = body.unwrap_or_default();
    if let Some(response) = field_errors(&[("token", body.token.as_deref())]) {
        return response;
    }

    match state.tokens().verify(body.token.as_deref().unwrap_or_default()) {
        Ok(_) => Json(json!({})).into_response(),
        Err(e) => token_not_valid(&e),
    }
}

/// Run the bcrypt check off the async runtime.
async fn check_credentials(
    users: Arc<dyn UserStore>,
    username: String,
    password: String,
) -> Result<Option<UserIdentity>, Response> {
    tokio::task::spawn_blocking(move || authenticate(users.as_ref(), &username, &password))
        .await
        .map_err(|e| {
            tracing::error!("credential check failed: {e}");
            internal_error()
        })
}

/// 400 listing each missing or blank field, or `None` when all are set.
fn field_errors(fields: &[(&'static str, Option<&str>)]) -> Option<Response> {
    let errors: Map<String, Value> = fields
        .iter()
        .filter_map(|(name, value)| {
            let message = match value {
                None => FIELD_REQUIRED,
                Some("") => FIELD_BLANK,
                Some(_) => return None,
            };
            Some(((*name).to_string(), json!([message])))
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some((StatusCode::BAD_REQUEST, Json(Value::Object(errors))).into_response())
    }
}

fn token_not_valid(error: &JwtError) -> Response {
    tracing::debug!("token rejected: {error}");
    let detail = match error {
        JwtError::Blacklisted => "Token is blacklisted",
        _ => "Token is invalid or expired",
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": detail, "code": TOKEN_NOT_VALID })),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn detail_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn internal_error() -> Response {
    detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}

//! Test the CSRF-token endpoint and its authentication guard.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::NewUser;
use crate::e2e_tests::helpers::*;

#[test]
fn test_csrf_requires_authentication() {
    let app = TestApp::new();

    let response = app.get("/api/csrf/", None);

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({ "detail": "Authentication credentials were not provided." })
    );
}

#[test]
fn test_csrf_with_bearer_token() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");

    let response = app.get("/api/csrf/", Some(&format!("Bearer {access}")));

    assert_eq!(response.status, StatusCode::OK);
    let token = response.json()["csrfToken"]
        .as_str()
        .expect("csrfToken")
        .to_string();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_csrf_tokens_differ() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");
    let header = format!("Bearer {access}");

    let first = app.get("/api/csrf/", Some(&header)).json();
    let second = app.get("/api/csrf/", Some(&header)).json();

    assert_ne!(first["csrfToken"], second["csrfToken"]);
}

#[test]
fn test_csrf_rejects_refresh_token() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let (_, refresh) = app.obtain_pair("ada", "analytical");

    let response = app.get("/api/csrf/", Some(&format!("Bearer {refresh}")));

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_csrf_rejects_deactivated_user() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");
    app.users.set_active(user.id(), false).expect("deactivated");

    let response = app.get("/api/csrf/", Some(&format!("Bearer {access}")));

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

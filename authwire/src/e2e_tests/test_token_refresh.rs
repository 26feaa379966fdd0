//! Test refreshing access tokens, with and without rotation.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::NewUser;
use crate::e2e_tests::helpers::*;
use crate::routes::RouteTable;
use crate::settings::ConfigureOptions;

fn rotating_app() -> TestApp {
    TestApp::build(
        ConfigureOptions::default(),
        |settings| {
            if let Some(policy) = settings.token_policy.as_mut() {
                policy.rotate_refresh_tokens = true;
            }
        },
        RouteTable::new(),
    )
}

#[test]
fn test_refresh_issues_access_token() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));
    let (_, refresh) = app.obtain_pair("ada", "analytical");

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": refresh }));

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert!(body.get("refresh").is_none());

    let access = body["access"].as_str().expect("access");
    let claims = app.state.tokens().verify_access(access).expect("valid");
    assert_eq!(claims.user_id, user.id());
}

#[test]
fn test_refresh_rejects_access_token() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": access }));

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })
    );
}

#[test]
fn test_refresh_garbage() {
    let app = TestApp::new();

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": "garbage" }));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.post_json("/api/token/refresh/", &json!({}));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({ "refresh": ["This field is required."] })
    );
}

#[test]
fn test_rotation_blacklists_old_token() {
    let app = rotating_app();
    app.create_user(NewUser::new("ada", "analytical"));
    let (_, refresh) = app.obtain_pair("ada", "analytical");

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": refresh }));
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let rotated = body["refresh"].as_str().expect("rotated refresh token");
    assert_ne!(rotated, refresh);

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": refresh }));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({ "detail": "Token is blacklisted", "code": "token_not_valid" })
    );

    let response = app.post_json("/api/token/refresh/", &json!({ "refresh": rotated }));
    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_rotation_without_blacklist_extension() {
    let app = TestApp::build(
        ConfigureOptions::default(),
        |settings| {
            if let Some(policy) = settings.token_policy.as_mut() {
                policy.rotate_refresh_tokens = true;
            }
            settings
                .installed_extensions
                .retain(|name| name != "authwire.jwt.blacklist");
        },
        RouteTable::new(),
    );
    app.create_user(NewUser::new("ada", "analytical"));
    let (_, refresh) = app.obtain_pair("ada", "analytical");

    let first = app.post_json("/api/token/refresh/", &json!({ "refresh": refresh }));
    let second = app.post_json("/api/token/refresh/", &json!({ "refresh": refresh }));

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
}

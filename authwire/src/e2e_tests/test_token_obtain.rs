//! Test obtaining an access/refresh token pair.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::{NewUser, TokenKind};
use crate::e2e_tests::helpers::*;

#[test]
fn test_obtain_pair() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));

    let (access, refresh) = app.obtain_pair("ada", "analytical");

    let tokens = app.state.tokens();
    let access = tokens.verify(&access).expect("access verifies");
    let refresh = tokens.verify(&refresh).expect("refresh verifies");
    assert_eq!(access.token_type, TokenKind::Access);
    assert_eq!(refresh.token_type, TokenKind::Refresh);
    assert_eq!(access.user_id, user.id());
    assert_eq!(refresh.user_id, user.id());
}

#[test]
fn test_obtain_lifetime_follows_options() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));

    let (access, _) = app.obtain_pair("ada", "analytical");
    let claims = app.state.tokens().verify(&access).expect("verifies");

    assert_eq!(claims.exp - claims.iat, 60 * 60);
}

#[test]
fn test_obtain_bad_credentials() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));

    let response = app.post_json(
        "/api/token/",
        &json!({ "username": "ada", "password": "wrong" }),
    );

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({ "detail": "No active account found with the given credentials" })
    );
}

#[test]
fn test_obtain_missing_fields() {
    let app = TestApp::new();

    let response = app.post_json("/api/token/", &json!({ "password": "" }));

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({
            "username": ["This field is required."],
            "password": ["This field may not be blank."],
        })
    );
}

#[test]
fn test_obtain_inactive_user() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));
    app.users.set_active(user.id(), false).expect("deactivated");

    let response = app.post_json(
        "/api/token/",
        &json!({ "username": "ada", "password": "analytical" }),
    );

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

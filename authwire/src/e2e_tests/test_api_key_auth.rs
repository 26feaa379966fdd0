//! Test authenticating with legacy API keys.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::NewUser;
use crate::e2e_tests::helpers::*;
use crate::routes::RouteTable;
use crate::settings::ConfigureOptions;

fn login(app: &TestApp) -> String {
    let response = app.post_json(
        "/api/login/",
        &json!({ "username": "ada", "password": "analytical" }),
    );
    assert_eq!(response.status, StatusCode::OK);
    response.json()["token"].as_str().expect("token").to_string()
}

#[test]
fn test_api_key_authenticates() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let key = login(&app);

    let response = app.get("/api/csrf/", Some(&format!("Token {key}")));

    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_unknown_api_key() {
    let app = TestApp::new();

    let response = app.get(
        "/api/csrf/",
        Some("Token 0123456789abcdef0123456789abcdef01234567"),
    );

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_api_keys_ignored_without_extension() {
    let app = TestApp::build(
        ConfigureOptions::default(),
        |settings| {
            settings
                .installed_extensions
                .retain(|name| name != "authwire.api_keys");
        },
        RouteTable::new(),
    );
    app.create_user(NewUser::new("ada", "analytical"));
    let key = login(&app);

    let response = app.get("/api/csrf/", Some(&format!("Token {key}")));

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_api_key_rejected_for_inactive_user() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));
    let key = login(&app);
    app.users.set_active(user.id(), false).expect("deactivated");

    let response = app.get("/api/csrf/", Some(&format!("Token {key}")));

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

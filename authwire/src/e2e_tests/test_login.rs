//! Test the API-key login endpoint.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use crate::auth::{ApiKeyStore, NewUser};
use crate::e2e_tests::helpers::*;

#[test]
fn test_login_returns_api_key_and_id() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));

    let response = app.post_json(
        "/api/login/",
        &json!({ "username": "ada", "password": "analytical" }),
    );

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["id"], json!(user.id().get()));

    let token = body["token"].as_str().expect("token");
    assert_eq!(token.len(), 40);
    assert_eq!(app.api_keys.lookup(token), Some(user.id()));
}

#[test]
fn test_login_token_is_stable() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));
    let credentials = json!({ "username": "ada", "password": "analytical" });

    let first = app.post_json("/api/login/", &credentials).json();
    let second = app.post_json("/api/login/", &credentials).json();

    assert_eq!(first["token"], second["token"]);
}

#[test]
fn test_login_wrong_password() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));

    let response = app.post_json(
        "/api/login/",
        &json!({ "username": "ada", "password": "difference" }),
    );

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Invalid Credentials" }));
}

#[test]
fn test_login_unknown_user() {
    let app = TestApp::new();

    let response = app.post_json(
        "/api/login/",
        &json!({ "username": "nobody", "password": "x" }),
    );

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_login_missing_password() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));

    let response = app.post_json("/api/login/", &json!({ "username": "ada" }));

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({ "error": "Please provide username and password." })
    );
}

#[test]
fn test_login_unparseable_body() {
    let app = TestApp::new();

    let response = app.send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/login/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .expect("request"),
    );

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_login_inactive_user() {
    let app = TestApp::new();
    let user = app.create_user(NewUser::new("ada", "analytical"));
    app.users.set_active(user.id(), false).expect("deactivated");

    let response = app.post_json(
        "/api/login/",
        &json!({ "username": "ada", "password": "analytical" }),
    );

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_login_with_form_body() {
    let app = TestApp::new();
    app.create_user(NewUser::new("ada", "analytical"));

    let response = app.send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/login/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=ada&password=analytical"))
            .expect("request"),
    );

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["token"].is_string());
}

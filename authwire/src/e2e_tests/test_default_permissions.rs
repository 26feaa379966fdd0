//! Test how route access levels map to guards.

use axum::http::{Method, StatusCode};
use axum::routing::get;

use crate::auth::{CurrentUser, NewUser, Requirement};
use crate::e2e_tests::helpers::*;
use crate::routes::{Access, Endpoint, RouteEntry, RouteTable};
use crate::settings::{ConfigureOptions, PermissionClass};

async fn whoami(CurrentUser(user): CurrentUser) -> String {
    user.user().username().to_string()
}

async fn ping() -> &'static str {
    "pong"
}

fn host_routes() -> RouteTable {
    let mut routes = RouteTable::new();
    routes.push(RouteEntry::new(
        "me",
        Method::GET,
        "/api/me/",
        Endpoint::Custom(get(whoami)),
        Access::Default,
    ));
    routes.push(RouteEntry::new(
        "ping",
        Method::GET,
        "/api/ping/",
        Endpoint::Custom(get(ping)),
        Access::Default,
    ));
    routes.push(RouteEntry::new(
        "health",
        Method::GET,
        "/health/",
        Endpoint::Custom(get(ping)),
        Access::AllowAny,
    ));
    routes.push(RouteEntry::new(
        "staff",
        Method::GET,
        "/api/staff/",
        Endpoint::Custom(get(whoami)),
        Access::Require(Requirement::Staff),
    ));
    routes
}

#[test]
fn test_default_access_requires_authentication() {
    let app = TestApp::build(ConfigureOptions::default(), |_| {}, host_routes());
    app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");

    assert_eq!(app.get("/api/me/", None).status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/ping/", None).status, StatusCode::UNAUTHORIZED);

    let response = app.get("/api/me/", Some(&format!("Bearer {access}")));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ada");
}

#[test]
fn test_allow_any_route_is_public() {
    let app = TestApp::build(ConfigureOptions::default(), |_| {}, host_routes());

    let response = app.get("/health/", None);

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "pong");
}

#[test]
fn test_staff_route() {
    let app = TestApp::build(ConfigureOptions::default(), |_| {}, host_routes());
    app.create_user(NewUser::new("ada", "analytical"));
    app.create_user(NewUser {
        is_staff: true,
        ..NewUser::new("grace", "cobol")
    });
    let (plain, _) = app.obtain_pair("ada", "analytical");
    let (staff, _) = app.obtain_pair("grace", "cobol");

    let response = app.get("/api/staff/", Some(&format!("Bearer {plain}")));
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/api/staff/", Some(&format!("Bearer {staff}")));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "grace");
}

#[test]
fn test_admin_default_permission() {
    let app = TestApp::build(
        ConfigureOptions::default(),
        |settings| {
            if let Some(rest) = settings.rest_defaults.as_mut() {
                rest.permissions = vec![PermissionClass::IsAdminUser];
            }
        },
        host_routes(),
    );
    app.create_user(NewUser::new("ada", "analytical"));
    let (access, _) = app.obtain_pair("ada", "analytical");

    let response = app.get("/api/ping/", Some(&format!("Bearer {access}")));

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[test]
fn test_allow_any_default_permission() {
    let app = TestApp::build(
        ConfigureOptions::default(),
        |settings| {
            if let Some(rest) = settings.rest_defaults.as_mut() {
                rest.permissions = vec![PermissionClass::AllowAny];
            }
        },
        host_routes(),
    );

    assert_eq!(app.get("/api/ping/", None).status, StatusCode::OK);
    // The handler itself still needs a user.
    assert_eq!(app.get("/api/me/", None).status, StatusCode::UNAUTHORIZED);
}

//! Test serving static and media files from the configured roots.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::*;
use crate::routes::RouteTable;
use crate::settings::ConfigureOptions;

fn write_file(root: Option<&std::path::Path>, name: &str, contents: &str) {
    let root = root.expect("root configured");
    std::fs::write(root.join(name), contents).expect("Failed to write file");
}

#[test]
fn test_roots_created_under_base_dir() {
    let app = TestApp::new();

    let static_root = app.base_dir.path().join("static");
    let media_root = app.base_dir.path().join("media");
    assert_eq!(app.settings.static_root.as_deref(), Some(static_root.as_path()));
    assert_eq!(app.settings.media_root.as_deref(), Some(media_root.as_path()));
    assert!(static_root.is_dir());
    assert!(media_root.is_dir());
}

#[test]
fn test_serves_static_file() {
    let app = TestApp::new();
    write_file(app.settings.static_root.as_deref(), "site.css", "body {}");

    let response = app.get("/static/site.css", None);

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "body {}");
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
}

#[test]
fn test_serves_media_file() {
    let app = TestApp::new();
    write_file(app.settings.media_root.as_deref(), "avatar.txt", "ada");

    let response = app.get("/media/avatar.txt", None);

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ada");
}

#[test]
fn test_missing_static_file() {
    let app = TestApp::new();

    let response = app.get("/static/missing.css", None);

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_static_serving_disabled() {
    let app = TestApp::build(
        ConfigureOptions {
            serve_static: false,
            ..ConfigureOptions::default()
        },
        |_| {},
        RouteTable::new(),
    );

    assert!(!app.settings.has_stage("static_files"));
    assert_eq!(app.settings.static_root, None);
    assert_eq!(app.get("/static/site.css", None).status, StatusCode::NOT_FOUND);
}

//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::app::{AppState, StackError, build_router};
use crate::auth::user::test_support::TEST_HASH_COST;
use crate::auth::{
    ApiKeyStore, InMemoryApiKeyStore, InMemoryUserStore, JwtConfig, NewUser, UserIdentity,
    UserStore,
};
use crate::routes::{RouteTable, register_auth_routes};
use crate::settings::{ConfigureOptions, Settings, configure};

/// Signing secret shared by every test app.
pub const SECRET: &[u8] = b"e2e-test-secret-key";

/// A configured router driven on a private runtime.
pub struct TestApp {
    pub router: Router,
    pub runtime: tokio::runtime::Runtime,
    pub settings: Arc<Settings>,
    pub users: Arc<InMemoryUserStore>,
    pub api_keys: Arc<InMemoryApiKeyStore>,
    pub state: AppState,
    /// Keeps the base directory alive for the app's lifetime.
    pub base_dir: TempDir,
}

impl TestApp {
    /// App with default options and the standard auth routes.
    #[must_use]
    pub fn new() -> Self {
        Self::build(ConfigureOptions::default(), |_| {}, RouteTable::new())
    }

    /// App configured with `options`, then adjusted by `adjust`, serving
    /// `routes` plus the standard auth routes.
    ///
    /// # Panics
    ///
    /// Panics if configuration or router assembly fails.
    pub fn build(
        options: ConfigureOptions,
        adjust: impl FnOnce(&mut Settings),
        routes: RouteTable,
    ) -> Self {
        let (parts, result) = Self::try_build(options, adjust, routes);
        let router = result.expect("Failed to build router");
        parts.into_app(router)
    }

    /// Like `build`, but hands back the router assembly error.
    pub fn build_error(routes: RouteTable) -> StackError {
        let (_, result) = Self::try_build(ConfigureOptions::default(), |_| {}, routes);
        match result {
            Ok(_) => panic!("Expected router assembly to fail"),
            Err(e) => e,
        }
    }

    fn try_build(
        options: ConfigureOptions,
        adjust: impl FnOnce(&mut Settings),
        mut routes: RouteTable,
    ) -> (Parts, Result<Router, StackError>) {
        let base_dir = tempfile::tempdir().expect("Failed to create base dir");
        let mut settings = Settings::new(base_dir.path().to_path_buf());
        configure(&mut settings, &options).expect("Failed to configure settings");
        adjust(&mut settings);
        let settings = Arc::new(settings);

        let users = Arc::new(InMemoryUserStore::with_cost(TEST_HASH_COST));
        let api_keys = Arc::new(InMemoryApiKeyStore::new());
        let state = AppState::new(
            Arc::clone(&settings),
            JwtConfig::new_hs256(SECRET.to_vec()).expect("Invalid secret"),
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&api_keys) as Arc<dyn ApiKeyStore>,
        )
        .expect("Failed to build state");

        register_auth_routes(&mut routes);
        let result = build_router(&settings, routes, state.clone());

        let parts = Parts {
            runtime: tokio::runtime::Runtime::new().expect("Failed to create runtime"),
            settings,
            users,
            api_keys,
            state,
            base_dir,
        };
        (parts, result)
    }

    /// Add an active user.
    pub fn create_user(&self, new_user: NewUser) -> UserIdentity {
        self.users.create_user(new_user).expect("Failed to create user")
    }

    /// Send a request and collect the response.
    pub fn send(&self, request: Request<Body>) -> TestResponse {
        self.runtime.block_on(async {
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("Router is infallible");
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX)
                .await
                .expect("Failed to read body");
            TestResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            }
        })
    }

    /// POST a JSON body.
    pub fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("Invalid request"),
        )
    }

    /// GET with an optional `Authorization` header value.
    pub fn get(&self, path: &str, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).expect("Invalid request"))
    }

    /// Obtain an access/refresh pair over HTTP.
    pub fn obtain_pair(&self, username: &str, password: &str) -> (String, String) {
        let response = self.post_json(
            "/api/token/",
            &serde_json::json!({ "username": username, "password": password }),
        );
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        let body = response.json();
        (
            body["access"].as_str().expect("access").to_string(),
            body["refresh"].as_str().expect("refresh").to_string(),
        )
    }
}

struct Parts {
    runtime: tokio::runtime::Runtime,
    settings: Arc<Settings>,
    users: Arc<InMemoryUserStore>,
    api_keys: Arc<InMemoryApiKeyStore>,
    state: AppState,
    base_dir: TempDir,
}

impl Parts {
    fn into_app(self, router: Router) -> TestApp {
        TestApp {
            router,
            runtime: self.runtime,
            settings: self.settings,
            users: self.users,
            api_keys: self.api_keys,
            state: self.state,
            base_dir: self.base_dir,
        }
    }
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// The body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A header's value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

// Startup:
// 1. Host builds `Settings` from framework defaults
// 2. `configure` adds the auth stack to them, once
// 3. Settings are frozen behind an `Arc`
// 4. Auth routes are registered into the host's route table
// 5. `build_router` turns settings + routes into an axum router
//
// Per request:
//  - Authentication stage attaches the user behind the Authorization header
//  - Guards reject requests that lack the identity a route requires
//  - Handlers read the user through `CurrentUser`
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod app;
pub mod auth;
pub mod config;
pub mod random;
pub mod routes;
pub mod settings;

#[cfg(test)]
mod e2e_tests;

pub use app::{AppState, StackError, build_router};
pub use config::{ConfigError, StackConfig};
pub use routes::{RouteTable, register_auth_routes};
pub use settings::{ConfigureOptions, Settings, configure};

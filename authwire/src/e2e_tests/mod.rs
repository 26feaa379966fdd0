//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving a fully assembled
//! router with in-memory stores.

#![cfg(test)]

mod helpers;

mod test_api_key_auth;
mod test_csrf;
mod test_default_permissions;
mod test_login;
mod test_static_files;
mod test_token_obtain;
mod test_token_refresh;

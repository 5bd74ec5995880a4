//! HTTP handlers

pub mod conversations;
pub mod health;
pub mod models;

use axum::http::HeaderMap;
use chat_shared::constants::DEFAULT_USERNAME;

pub const USERNAME_HEADER: &str = "x-username";

/// Audit username from `x-username`, or the default when absent or blank.
pub(crate) fn username(headers: &HeaderMap) -> String {
    headers
        .get(USERNAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USERNAME)
        .to_string()
}

//! API handlers and shared validation helpers.

pub mod auth;
pub mod error;
pub mod health;
pub mod profile;
pub mod root;
pub mod tasks;

use regex::Regex;

/// Lightweight email sanity check applied before touching the store.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Trim an optional text field, treating blank input as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

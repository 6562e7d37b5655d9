//! # Taskdeck (task API with stateless sessions)
//!
//! `taskdeck` serves a small task-management API. Users sign up and sign in
//! with an email and password, receive a signed session token, and then manage
//! their own tasks and profile.
//!
//! ## Session Tokens
//!
//! Tokens are compact `HS256` JWTs carrying only the user id, issue time and
//! expiry. Nothing is stored server-side: a token is valid while its signature
//! matches the configured secret, it has not expired, and its user still exists.
//!
//! ## Transports
//!
//! A token reaches the server in one of two ways, tried in order:
//!
//! 1. the `auth_token` cookie (`HttpOnly`), set on sign-in for same-origin browsers;
//! 2. an `Authorization: Bearer` header, for cross-origin clients that cannot
//!    receive third-party cookies and keep the token from the sign-in payload.
//!
//! ## Gates
//!
//! Every protected endpoint resolves the session through a single extractor; a
//! failure is always answered with `401 {"error":"Unauthorized"}` regardless of
//! the reason. A separate, best-effort navigation gate only looks at the cookie
//! and never blocks a request.

pub mod api;
pub mod cli;
pub mod client;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

//! Authentication: token codec, credentials, session resolution and gates.
//!
//! ## Tokens
//!
//! Sessions are stateless `HS256` tokens (see [`token`]). Nothing is written
//! server-side at sign-in, and there is no revocation list: a token stays
//! valid until it expires or its user is deleted.
//!
//! ## Transports
//!
//! The sign-in and sign-up responses set the `auth_token` cookie and also
//! return the raw token in the body. Browsers on the API's own origin use the
//! cookie. Cross-origin clients keep the body token and send it as
//! `Authorization: Bearer`. When both arrive, the cookie wins.

pub mod credentials;
pub mod gate;
pub mod me;
pub mod password;
pub mod principal;
pub mod session;
pub mod signin;
pub mod signout;
pub mod signup;
pub mod state;
pub mod token;
pub mod types;

pub use gate::{EdgeGate, Navigation, RouteGate, ServerGate};
pub use principal::AuthUser;
pub use session::{AuthContext, SessionResolver, SESSION_COOKIE_NAME};
pub use state::{AuthConfig, AuthState, CookieSameSite};
pub use token::TokenCodec;

use anyhow::Context;
use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use self::{session::session_cookie, types::AuthResponse};
use crate::{api::handlers::error::ApiError, store::User};

/// Mint a token for `user`, set it as the session cookie and echo it in the body.
fn session_response(
    auth_state: &AuthState,
    user: User,
    status: StatusCode,
) -> Result<Response, ApiError> {
    let token = auth_state
        .codec()
        .issue(user.id)
        .context("failed to issue session token")?;
    let cookie = session_cookie(auth_state.config(), &token).context("failed to build cookie")?;

    Ok((status, [(SET_COOKIE, cookie)], Json(AuthResponse { user, token })).into_response())
}

#[cfg(test)]
mod tests;

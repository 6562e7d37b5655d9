use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{session::clear_session_cookie, state::AuthState, types::MessageResponse};
use crate::api::handlers::error::ApiError;

/// Tokens are stateless, so signing out only clears the browser cookie; a
/// copy of the token held elsewhere stays valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 200, description = "Session cookie cleared.", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn signout(Extension(auth_state): Extension<Arc<AuthState>>) -> Result<Response, ApiError> {
    let cookie =
        clear_session_cookie(auth_state.config()).context("failed to build clearing cookie")?;

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
        .into_response())
}

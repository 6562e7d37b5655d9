use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::{
    session_response,
    state::AuthState,
    types::{AuthResponse, SigninRequest},
};
use crate::api::handlers::error::{ApiError, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in; the session cookie is set.", body = AuthResponse),
        (status = 400, description = "Malformed email or empty password.", body = ErrorResponse),
        (status = 401, description = "Unknown email or wrong password.", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn signin(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let user = auth_state
        .credentials()
        .authenticate(&request.email, &request.password)
        .await?;

    debug!(user_id = %user.id, "user signed in");

    session_response(&auth_state, user, StatusCode::OK)
}

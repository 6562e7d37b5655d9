use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::{
    session_response,
    state::AuthState,
    types::{AuthResponse, SignupRequest},
};
use crate::api::handlers::error::{ApiError, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created and signed in; the session cookie is set.", body = AuthResponse),
        (status = 400, description = "Invalid email, password or name.", body = ErrorResponse),
        (status = 409, description = "Email already registered.", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let user = auth_state
        .credentials()
        .register(&request.email, &request.password, &request.name)
        .await?;

    info!(user_id = %user.id, "user registered");

    session_response(&auth_state, user, StatusCode::CREATED)
}

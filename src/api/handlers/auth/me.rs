use axum::Json;

use super::{principal::AuthUser, types::UserResponse};
use crate::api::handlers::error::ErrorResponse;

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user.", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(context): AuthUser) -> Json<UserResponse> {
    Json(UserResponse { user: context.user })
}

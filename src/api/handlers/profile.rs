use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use super::{
    auth::{credentials::normalize_email, types::UserResponse, AuthState, AuthUser},
    error::{ApiError, ErrorResponse},
    valid_email,
};
use crate::store::{ProfileChanges, UpdateOutcome};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdateRequest {
    fn into_changes(self) -> Result<ProfileChanges, ApiError> {
        if self.name.is_none() && self.email.is_none() {
            return Err(ApiError::Validation("No fields to update".to_string()));
        }

        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::Validation("Name is required".to_string()));
            }
            other => other.map(|name| name.trim().to_string()),
        };

        let email = match self.email {
            Some(email) if !valid_email(email.trim()) => {
                return Err(ApiError::Validation("Invalid email address".to_string()));
            }
            other => other.as_deref().map(normalize_email),
        };

        Ok(ProfileChanges { name, email })
    }
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated.", body = UserResponse),
        (status = 400, description = "No fields, blank name or invalid email.", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
        (status = 409, description = "Email already used by another account.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "profile"
)]
pub async fn update_profile(
    AuthUser(context): AuthUser,
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    let changes = request.into_changes()?;

    match auth_state
        .users()
        .update_profile(context.user_id, changes)
        .await?
    {
        UpdateOutcome::Updated(user) => {
            info!(user_id = %user.id, "profile updated");
            Ok(Json(UserResponse { user }))
        }
        UpdateOutcome::Conflict => Err(ApiError::Conflict),
        // Deleted between session resolution and the update.
        UpdateOutcome::NotFound => Err(ApiError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_field() {
        let err = ProfileUpdateRequest::default().into_changes().err();
        assert_eq!(
            err.map(|e| e.to_string()).as_deref(),
            Some("No fields to update")
        );
    }

    #[test]
    fn normalizes_email() -> Result<(), ApiError> {
        let changes = ProfileUpdateRequest {
            name: Some(" Alice ".to_string()),
            email: Some(" Alice@Example.COM".to_string()),
        }
        .into_changes()?;
        assert_eq!(changes.name.as_deref(), Some("Alice"));
        assert_eq!(changes.email.as_deref(), Some("alice@example.com"));
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        let bad_email = ProfileUpdateRequest {
            name: None,
            email: Some("nope".to_string()),
        };
        assert!(matches!(bad_email.into_changes(), Err(ApiError::Validation(_))));

        let blank_name = ProfileUpdateRequest {
            name: Some("  ".to_string()),
            email: None,
        };
        assert!(matches!(blank_name.into_changes(), Err(ApiError::Validation(_))));
    }
}

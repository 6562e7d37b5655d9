//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::handlers::{error::ApiError, valid_email};
use crate::store::User;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupRequest {
    pub(super) fn validate(&self) -> Result<(), ApiError> {
        if !valid_email(self.email.trim()) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        Ok(())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

impl SigninRequest {
    pub(super) fn validate(&self) -> Result<(), ApiError> {
        if !valid_email(self.email.trim()) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }
        Ok(())
    }
}

/// Returned by sign-in and sign-up. `token` is the same value set in the
/// cookie, for clients that cannot keep third-party cookies.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub user: User,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn signup_validation_messages() {
        assert!(signup("alice@example.com", "secret1", "Alice").validate().is_ok());

        let cases = [
            (signup("alice", "secret1", "Alice"), "Invalid email address"),
            (
                signup("alice@example.com", "short", "Alice"),
                "Password must be at least 6 characters",
            ),
            (signup("alice@example.com", "secret1", "  "), "Name is required"),
        ];
        for (request, message) in cases {
            let err = request.validate().err().map(|e| e.to_string());
            assert_eq!(err.as_deref(), Some(message));
        }
    }

    #[test]
    fn signin_requires_password() {
        let request = SigninRequest {
            email: "alice@example.com".to_string(),
            password: String::new(),
        };
        let err = request.validate().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Password is required"));
    }

    #[test]
    fn auth_response_never_carries_hash() -> anyhow::Result<()> {
        let response = AuthResponse {
            user: User {
                id: uuid::Uuid::nil(),
                email: "alice@example.com".to_string(),
                name: "Alice".to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            },
            token: "tok".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        let user = value.get("user").and_then(serde_json::Value::as_object);
        assert!(user.is_some_and(|user| !user.contains_key("password_hash")));
        assert_eq!(value.get("token").and_then(serde_json::Value::as_str), Some("tok"));
        Ok(())
    }
}

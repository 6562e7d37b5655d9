//! Authenticated principal extraction.
//!
//! Protected handlers take an [`AuthUser`] argument; it is the only way to get
//! an [`AuthContext`], and it always runs the server gate first.

use anyhow::anyhow;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use super::{gate::RouteGate, session::AuthContext, state::AuthState};
use crate::api::handlers::error::ApiError;

#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = parts
            .extensions
            .get::<Arc<AuthState>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal(anyhow!("auth state extension missing")))?;

        let context = auth_state
            .server_gate()
            .admit(&parts.headers, parts.uri.path())
            .await?;
        Ok(Self(context))
    }
}

use crate::{api::handlers::auth::AuthState, GIT_COMMIT_HASH};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses (
        (status = 200, description = "Database is reachable", body = Health),
        (status = 503, description = "Database is unreachable", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(method: Method, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let result = auth_state.users().ping().await;
    if let Err(err) = &result {
        error!("Failed to ping database: {err:#}");
    }

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    match format!("{}:{}:{}", health.name, health.version, short_hash).parse::<HeaderValue>() {
        Ok(value) => {
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to parse X-App header: {err}"),
    }

    if result.is_ok() {
        debug!("Database connection is healthy");
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use crate::store::{
        InsertOutcome, MemoryUserStore, NewUser, ProfileChanges, UpdateOutcome, User,
        UserCredentials, UserStore,
    };
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::{body::to_bytes, routing::get, Router};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn ping(&self) -> Result<()> {
            Err(anyhow!("connection refused"))
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>> {
            Err(anyhow!("connection refused"))
        }
        async fn find_credentials(&self, _email: &str) -> Result<Option<UserCredentials>> {
            Err(anyhow!("connection refused"))
        }
        async fn insert(&self, _user: NewUser) -> Result<InsertOutcome> {
            Err(anyhow!("connection refused"))
        }
        async fn update_profile(
            &self,
            _id: Uuid,
            _changes: ProfileChanges,
        ) -> Result<UpdateOutcome<User>> {
            Err(anyhow!("connection refused"))
        }
        async fn delete(&self, _id: Uuid) -> Result<bool> {
            Err(anyhow!("connection refused"))
        }
    }

    fn app(users: Arc<dyn UserStore>) -> Result<Router> {
        let state = Arc::new(AuthState::new(
            AuthConfig::new(),
            &SecretString::from(SECRET),
            users,
        )?);
        Ok(Router::new()
            .route("/health", get(health).options(health))
            .layer(Extension(state)))
    }

    #[tokio::test]
    async fn healthy_store_returns_ok() -> Result<()> {
        let response = app(Arc::new(MemoryUserStore::new()))?
            .oneshot(axum::http::Request::get("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["database"], "ok");
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_store_returns_503() -> Result<()> {
        let response = app(Arc::new(DownStore))?
            .oneshot(axum::http::Request::get("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["database"], "error");
        Ok(())
    }

    #[tokio::test]
    async fn options_has_no_body() -> Result<()> {
        let response = app(Arc::new(MemoryUserStore::new()))?
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/health")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert!(body.is_empty());
        Ok(())
    }
}

//! Session discovery and resolution.
//!
//! Flow Overview: walk the configured transports in order and take the first
//! token that is present, verify it, then load the user it names. A present
//! but invalid token ends the search; later transports are not consulted.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::{state::AuthConfig, token::TokenCodec};
use crate::store::{User, UserStore};

pub const SESSION_COOKIE_NAME: &str = "auth_token";

/// Request-scoped identity handed to protected handlers.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub user: User,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("user lookup failed")]
    Store(#[source] anyhow::Error),
}

/// One place a token can travel in a request.
pub trait TokenTransport: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// The raw token, or `None` when this transport carries nothing.
    fn extract(&self, headers: &HeaderMap) -> Option<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CookieTransport;

impl TokenTransport for CookieTransport {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
            })
            .find(|token| !token.is_empty())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BearerTransport;

impl TokenTransport for BearerTransport {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let trimmed = value.trim();
        let token = trimmed
            .strip_prefix("Bearer ")
            .or_else(|| trimmed.strip_prefix("bearer "))?
            .trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

pub struct SessionResolver {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
    transports: Vec<Box<dyn TokenTransport>>,
}

impl fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionResolver")
            .field("transports", &self.transports)
            .finish_non_exhaustive()
    }
}

impl SessionResolver {
    /// Cookie first, then bearer header.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self::with_transports(
            codec,
            users,
            vec![Box::new(CookieTransport), Box::new(BearerTransport)],
        )
    }

    #[must_use]
    pub fn with_transports(
        codec: Arc<TokenCodec>,
        users: Arc<dyn UserStore>,
        transports: Vec<Box<dyn TokenTransport>>,
    ) -> Self {
        Self {
            codec,
            users,
            transports,
        }
    }

    /// First token present across the transports, with the transport name.
    #[must_use]
    pub fn locate(&self, headers: &HeaderMap) -> Option<(&'static str, String)> {
        self.transports
            .iter()
            .find_map(|transport| transport.extract(headers).map(|t| (transport.name(), t)))
    }

    /// # Errors
    /// [`ResolveError::Unauthenticated`] for a missing, invalid or expired
    /// token and for a token whose user is gone. [`ResolveError::Store`] when
    /// the user lookup itself fails.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, ResolveError> {
        let Some((transport, token)) = self.locate(headers) else {
            return Err(ResolveError::Unauthenticated);
        };

        let claims = self.codec.verify(&token).map_err(|err| {
            debug!(transport, "rejected session token: {err}");
            ResolveError::Unauthenticated
        })?;

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await
            .map_err(ResolveError::Store)?
            .ok_or_else(|| {
                debug!(transport, "session token names a missing user");
                ResolveError::Unauthenticated
            })?;

        Ok(AuthContext {
            user_id: claims.user_id,
            user,
        })
    }
}

/// `HttpOnly` cookie carrying a freshly issued token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, token, config.token_ttl_seconds())
}

/// Expired cookie that makes the browser drop the session.
pub fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, "", 0)
}

fn build_cookie(
    config: &AuthConfig,
    token: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
        config.cookie_same_site().as_str()
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

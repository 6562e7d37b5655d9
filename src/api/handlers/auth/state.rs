//! Auth configuration and the shared state handlers reach through `Extension`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{str::FromStr, sync::Arc};

use super::{
    credentials::CredentialVerifier,
    gate::{EdgeGate, ServerGate},
    session::SessionResolver,
    token::TokenCodec,
};
use crate::store::UserStore;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CookieSameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }
}

impl FromStr for CookieSameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            other => Err(format!("invalid SameSite policy: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_ttl_seconds: i64,
    cookie_same_site: CookieSameSite,
    cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            cookie_same_site: CookieSameSite::Lax,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_same_site(mut self, same_site: CookieSameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn cookie_same_site(&self) -> CookieSameSite {
        self.cookie_same_site
    }

    /// Browsers drop `SameSite=None` cookies that are not `Secure`.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure || self.cookie_same_site == CookieSameSite::None
    }
}

pub struct AuthState {
    config: AuthConfig,
    codec: Arc<TokenCodec>,
    resolver: Arc<SessionResolver>,
    credentials: CredentialVerifier,
    users: Arc<dyn UserStore>,
}

impl AuthState {
    /// # Errors
    /// Fails when the secret is too short, the TTL is not positive, or the
    /// credential verifier cannot be prepared.
    pub fn new(config: AuthConfig, secret: &SecretString, users: Arc<dyn UserStore>) -> Result<Self> {
        let codec = Arc::new(
            TokenCodec::new(secret, config.token_ttl_seconds())
                .context("invalid session token configuration")?,
        );
        let resolver = Arc::new(SessionResolver::new(codec.clone(), users.clone()));
        let credentials = CredentialVerifier::new(users.clone())?;

        Ok(Self {
            config,
            codec,
            resolver,
            credentials,
            users,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialVerifier {
        &self.credentials
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    #[must_use]
    pub fn server_gate(&self) -> ServerGate {
        ServerGate::new(self.resolver.clone())
    }

    #[must_use]
    pub fn edge_gate(&self) -> EdgeGate {
        EdgeGate::new(self.codec.clone())
    }
}

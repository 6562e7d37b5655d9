//! Route gates.
//!
//! [`ServerGate`] guards every protected API operation and fails closed.
//! [`EdgeGate`] only looks at navigation to auth pages and the dashboard and
//! fails open: it may redirect a user who is already signed in, it never
//! blocks a request.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::{
    session::{AuthContext, CookieTransport, SessionResolver, TokenTransport},
    token::TokenCodec,
};
use crate::api::handlers::error::ApiError;

const DASHBOARD_PATH: &str = "/dashboard";

#[async_trait]
pub trait RouteGate: Send + Sync {
    type Verdict: Send;

    async fn admit(&self, headers: &HeaderMap, path: &str) -> Self::Verdict;
}

#[derive(Clone, Debug)]
pub struct ServerGate {
    resolver: Arc<SessionResolver>,
}

impl ServerGate {
    #[must_use]
    pub fn new(resolver: Arc<SessionResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl RouteGate for ServerGate {
    type Verdict = Result<AuthContext, ApiError>;

    async fn admit(&self, headers: &HeaderMap, _path: &str) -> Self::Verdict {
        self.resolver.resolve(headers).await.map_err(ApiError::from)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Continue,
    Redirect(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NavigationPath {
    AuthPage,
    Dashboard,
}

fn classify(path: &str) -> Option<NavigationPath> {
    match path {
        "/login" | "/signup" => Some(NavigationPath::AuthPage),
        DASHBOARD_PATH => Some(NavigationPath::Dashboard),
        _ if path.starts_with("/dashboard/") => Some(NavigationPath::Dashboard),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct EdgeGate {
    codec: Arc<TokenCodec>,
    transport: CookieTransport,
}

impl EdgeGate {
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            transport: CookieTransport,
        }
    }
}

#[async_trait]
impl RouteGate for EdgeGate {
    type Verdict = Navigation;

    async fn admit(&self, headers: &HeaderMap, path: &str) -> Navigation {
        match classify(path) {
            Some(NavigationPath::AuthPage) => {
                let signed_in = self
                    .transport
                    .extract(headers)
                    .is_some_and(|token| self.codec.verify(&token).is_ok());
                if signed_in {
                    Navigation::Redirect(DASHBOARD_PATH)
                } else {
                    Navigation::Continue
                }
            }
            // The dashboard checks its session through the API, where the
            // server gate decides; cross-origin deployments never show a cookie here.
            Some(NavigationPath::Dashboard) | None => Navigation::Continue,
        }
    }
}

/// Middleware running the edge gate in front of the whole app.
pub async fn edge_navigation(
    State(gate): State<Arc<EdgeGate>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = gate.admit(request.headers(), request.uri().path()).await;
    match verdict {
        Navigation::Continue => next.run(request).await,
        Navigation::Redirect(location) => Redirect::temporary(location).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn gate() -> (EdgeGate, Arc<TokenCodec>) {
        let codec = Arc::new(
            TokenCodec::new(&SecretString::from("0123456789abcdef0123456789abcdef"), 60)
                .expect("codec"),
        );
        (EdgeGate::new(codec.clone()), codec)
    }

    fn cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_str(&format!("auth_token={token}")).expect("cookie"),
        );
        headers
    }

    #[test]
    fn classifies_navigation_paths() {
        assert_eq!(classify("/login"), Some(NavigationPath::AuthPage));
        assert_eq!(classify("/signup"), Some(NavigationPath::AuthPage));
        assert_eq!(classify("/dashboard"), Some(NavigationPath::Dashboard));
        assert_eq!(classify("/dashboard/tasks/1"), Some(NavigationPath::Dashboard));
        assert_eq!(classify("/dashboards"), None);
        assert_eq!(classify("/login/extra"), None);
        assert_eq!(classify("/api/tasks"), None);
    }

    #[tokio::test]
    async fn valid_cookie_on_auth_page_redirects() {
        let (gate, codec) = gate();
        let token = codec.issue(Uuid::new_v4()).expect("token");
        for path in ["/login", "/signup"] {
            assert_eq!(
                gate.admit(&cookie(&token), path).await,
                Navigation::Redirect("/dashboard")
            );
        }
    }

    #[tokio::test]
    async fn everything_else_continues() {
        let (gate, codec) = gate();
        let token = codec.issue(Uuid::new_v4()).expect("token");

        assert_eq!(gate.admit(&HeaderMap::new(), "/login").await, Navigation::Continue);
        assert_eq!(gate.admit(&cookie("garbage"), "/signup").await, Navigation::Continue);
        assert_eq!(gate.admit(&HeaderMap::new(), "/dashboard").await, Navigation::Continue);
        assert_eq!(gate.admit(&cookie(&token), "/dashboard").await, Navigation::Continue);
        assert_eq!(gate.admit(&cookie(&token), "/").await, Navigation::Continue);
    }

    #[tokio::test]
    async fn bearer_header_is_ignored_at_the_edge() {
        let (gate, codec) = gate();
        let token = codec.issue(Uuid::new_v4()).expect("token");
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );
        assert_eq!(gate.admit(&headers, "/login").await, Navigation::Continue);
    }
}

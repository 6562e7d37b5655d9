use super::*;
use crate::{
    api::{app, AppOptions},
    store::{MemoryTaskStore, MemoryUserStore, TaskStore, UserStore},
};
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        Request,
    },
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

struct Harness {
    app: Router,
    users: Arc<MemoryUserStore>,
}

fn harness() -> Result<Harness> {
    let task_store = Arc::new(MemoryTaskStore::new());
    let users = Arc::new(MemoryUserStore::with_tasks(task_store.clone()));
    let store: Arc<dyn UserStore> = users.clone();
    let tasks: Arc<dyn TaskStore> = task_store;
    let state = Arc::new(AuthState::new(
        AuthConfig::new(),
        &SecretString::from(SECRET),
        store,
    )?);
    Ok(Harness {
        app: app(state, tasks, &AppOptions::default())?,
        users,
    })
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Option<String>, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok((status, cookie, json))
}

async fn signup(app: &Router, email: &str) -> Result<(StatusCode, Option<String>, Value)> {
    send(
        app,
        post_json(
            "/api/auth/signup",
            &json!({"email": email, "password": "secret1", "name": "Alice"}),
        )?,
    )
    .await
}

#[tokio::test]
async fn signup_sets_cookie_and_returns_token() -> Result<()> {
    let h = harness()?;
    let (status, cookie, body) = signup(&h.app, " Alice@Example.com ").await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3);

    let cookie = cookie.unwrap_or_default();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}={token};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=604800"));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let h = harness()?;
    signup(&h.app, "alice@example.com").await?;
    let (status, cookie, body) = signup(&h.app, "ALICE@example.com").await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "User already exists"}));
    assert!(cookie.is_none());
    Ok(())
}

#[tokio::test]
async fn signup_validation() -> Result<()> {
    let h = harness()?;
    let cases = [
        (json!({"email": "nope", "password": "secret1", "name": "A"}), "Invalid email address"),
        (
            json!({"email": "a@example.com", "password": "12345", "name": "A"}),
            "Password must be at least 6 characters",
        ),
        (json!({"email": "a@example.com", "password": "secret1", "name": "  "}), "Name is required"),
    ];
    for (payload, message) in cases {
        let (status, _, body) = send(&h.app, post_json("/api/auth/signup", &payload)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"], message);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> Result<()> {
    let h = harness()?;
    let request = Request::post("/api/auth/signin")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, _, body) = send(&h.app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .is_some_and(|m| m.starts_with("Invalid request body")));
    Ok(())
}

#[tokio::test]
async fn signin_failures_are_indistinguishable() -> Result<()> {
    let h = harness()?;
    signup(&h.app, "alice@example.com").await?;

    let wrong = send(
        &h.app,
        post_json(
            "/api/auth/signin",
            &json!({"email": "alice@example.com", "password": "wrong-password"}),
        )?,
    )
    .await?;
    let unknown = send(
        &h.app,
        post_json(
            "/api/auth/signin",
            &json!({"email": "bob@example.com", "password": "secret1"}),
        )?,
    )
    .await?;

    assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.0, unknown.0);
    assert_eq!(wrong.2, json!({"error": "Invalid email or password"}));
    assert_eq!(wrong.2, unknown.2);
    assert!(wrong.1.is_none() && unknown.1.is_none());
    Ok(())
}

#[tokio::test]
async fn signin_normalizes_email() -> Result<()> {
    let h = harness()?;
    signup(&h.app, "alice@example.com").await?;
    let (status, cookie, body) = send(
        &h.app,
        post_json(
            "/api/auth/signin",
            &json!({"email": "  ALICE@example.COM", "password": "secret1"}),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_some());
    assert_eq!(body["user"]["email"], "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn me_accepts_cookie_or_bearer() -> Result<()> {
    let h = harness()?;
    let (_, _, body) = signup(&h.app, "alice@example.com").await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let by_cookie = Request::get("/api/auth/me")
        .header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
        .body(Body::empty())?;
    let (status, _, me) = send(&h.app, by_cookie).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "alice@example.com");

    let by_bearer = Request::get("/api/auth/me")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, _, me) = send(&h.app, by_bearer).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["id"], body["user"]["id"]);

    let anonymous = Request::get("/api/auth/me").body(Body::empty())?;
    let (status, _, me) = send(&h.app, anonymous).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(me, json!({"error": "Unauthorized"}));
    Ok(())
}

#[tokio::test]
async fn deleted_user_token_is_rejected() -> Result<()> {
    let h = harness()?;
    let (_, _, body) = signup(&h.app, "alice@example.com").await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();
    let id = serde_json::from_value(body["user"]["id"].clone())?;

    assert!(h.users.delete(id).await?);

    let request = Request::get("/api/auth/me")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, _, me) = send(&h.app, request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(me, json!({"error": "Unauthorized"}));
    Ok(())
}

#[tokio::test]
async fn signout_expires_cookie() -> Result<()> {
    let h = harness()?;
    let (status, cookie, body) =
        send(&h.app, Request::post("/api/auth/signout").body(Body::empty())?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Signed out"}));
    let cookie = cookie.unwrap_or_default();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

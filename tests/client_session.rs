//! Drives a running server through [`ApiClient`] with a file-backed token store.

mod common;

use anyhow::Result;
use common::TestServer;
use std::sync::Arc;
use taskdeck::{
    api::handlers::{
        profile::ProfileUpdateRequest,
        tasks::{CreateTaskRequest, UpdateTaskRequest},
    },
    client::{ApiClient, ClientError, FileTokenStore, MemoryTokenStore, TokenStore},
    store::{TaskFilter, TaskPriority, TaskStatus},
};

#[tokio::test]
async fn full_session_round_trip() -> Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let client = ApiClient::new(&server.url("/"), store.clone())?;

    let session = client.signup("alice@example.com", "secret1", "Alice").await?;
    assert_eq!(session.user.email, "alice@example.com");
    assert_eq!(store.load()?, Some(session.token.clone()));

    assert_eq!(client.me().await?.id, session.user.id);

    let task = client
        .create_task(&CreateTaskRequest {
            title: "ship it".to_string(),
            description: Some("before friday".to_string()),
            status: None,
            priority: Some(TaskPriority::High),
            due_date: Some("2026-10-16".to_string()),
        })
        .await?;
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.user_id, session.user.id);

    let task = client
        .update_task(
            task.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::InProgress),
                ..UpdateTaskRequest::default()
            },
        )
        .await?;
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.description.as_deref(), Some("before friday"));

    let filtered = client
        .list_tasks(TaskFilter {
            status: Some(TaskStatus::InProgress),
            priority: None,
        })
        .await?;
    assert_eq!(filtered.len(), 1);
    assert!(client
        .list_tasks(TaskFilter {
            status: Some(TaskStatus::Completed),
            priority: None,
        })
        .await?
        .is_empty());

    let user = client
        .update_profile(&ProfileUpdateRequest {
            name: Some("Alice L".to_string()),
            email: None,
        })
        .await?;
    assert_eq!(user.name, "Alice L");

    client.delete_task(task.id).await?;
    assert!(client.list_tasks(TaskFilter::default()).await?.is_empty());

    client.signout().await?;
    assert_eq!(store.load()?, None);
    Ok(())
}

#[tokio::test]
async fn stored_token_survives_a_new_client() -> Result<()> {
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;

    let first = ApiClient::new(&server.url("/"), Arc::new(FileTokenStore::new(dir.path())))?;
    first.signup("alice@example.com", "secret1", "Alice").await?;

    // A fresh client has an empty cookie jar and relies on the bearer token.
    let second = ApiClient::new(&server.url("/"), Arc::new(FileTokenStore::new(dir.path())))?;
    assert_eq!(second.me().await?.email, "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn server_errors_carry_status_and_message() -> Result<()> {
    let server = TestServer::start().await?;
    let client = ApiClient::new(&server.url("/"), Arc::new(MemoryTokenStore::new()))?;

    match client.me().await {
        Err(ClientError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => anyhow::bail!("expected 401, got {other:?}"),
    }

    client.signup("alice@example.com", "secret1", "Alice").await?;
    let err = client
        .signup("alice@example.com", "secret1", "Alice")
        .await
        .err();
    assert_eq!(err.as_ref().and_then(ClientError::status), Some(409));

    let err = client.signin("alice@example.com", "nope-nope").await.err();
    match err {
        Some(ClientError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => anyhow::bail!("expected 401, got {other:?}"),
    }
    Ok(())
}

//! Spawns the full application on an ephemeral port with in-memory stores.

#![allow(dead_code)]

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use taskdeck::{
    api::{app, AppOptions, AuthConfig, AuthState},
    store::{MemoryTaskStore, MemoryUserStore, TaskStore, UserStore},
};
use tokio::{net::TcpListener, task::JoinHandle};

pub const SECRET: &str = "integration-secret-0123456789abcdef";
pub const FRONTEND_ORIGIN: &str = "http://localhost:3000";

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AuthState>,
    pub users: Arc<MemoryUserStore>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(None).await
    }

    pub async fn start_with(frontend_dir: Option<PathBuf>) -> Result<Self> {
        let task_store = Arc::new(MemoryTaskStore::new());
        let users = Arc::new(MemoryUserStore::with_tasks(task_store.clone()));
        let user_store: Arc<dyn UserStore> = users.clone();
        let tasks: Arc<dyn TaskStore> = task_store;
        let state = Arc::new(AuthState::new(
            AuthConfig::new(),
            &SecretString::from(SECRET),
            user_store,
        )?);

        let options = AppOptions {
            cors_origins: vec![FRONTEND_ORIGIN.to_string()],
            frontend_dir,
        };
        let router = app(state.clone(), tasks, &options)?;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test listener")?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router.into_make_service()).await;
        });

        Ok(Self {
            addr,
            state,
            users,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

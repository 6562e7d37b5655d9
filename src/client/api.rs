use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{errors::ClientError, store::TokenStore};
use crate::{
    api::handlers::{
        auth::types::{AuthResponse, MessageResponse, UserResponse},
        profile::ProfileUpdateRequest,
        tasks::{CreateTaskRequest, TaskListResponse, TaskResponse, UpdateTaskRequest},
    },
    store::{Task, TaskFilter, User},
    APP_USER_AGENT,
};

/// User and token returned by sign-in and sign-up.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// `base_url` may carry a path prefix (`https://host/backend`); API paths
    /// are resolved below it.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| ClientError::Parse(format!("base url: {e}")))?;
        if !base_url.path().ends_with('/') {
            let prefixed = format!("{}/", base_url.path());
            base_url.set_path(&prefixed);
        }
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            base_url,
            store,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Parse(format!("url {path}: {e}")))?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.store.load()? {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body).map_or_else(
                |_| status.canonical_reason().unwrap_or("request failed").to_string(),
                |body| body.error,
            );
            debug!(status = status.as_u16(), "request rejected: {message}");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn authenticate(
        &self,
        path: &str,
        credentials: Credentials<'_>,
    ) -> Result<AuthSession, ClientError> {
        let builder = self.request(Method::POST, path)?.json(&credentials);
        let response: AuthResponse = self.send(builder).await?;
        self.store.save(&response.token)?;
        Ok(AuthSession {
            user: response.user,
            token: response.token,
        })
    }

    /// Register and keep the returned token.
    ///
    /// # Errors
    /// Returns [`ClientError::Http`] with status 409 when the email is taken.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, ClientError> {
        self.authenticate(
            "/api/auth/signup",
            Credentials {
                email,
                password,
                name: Some(name),
            },
        )
        .await
    }

    /// Sign in and keep the returned token.
    ///
    /// # Errors
    /// Returns [`ClientError::Http`] with status 401 on bad credentials.
    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.authenticate(
            "/api/auth/signin",
            Credentials {
                email,
                password,
                name: None,
            },
        )
        .await
    }

    /// Sign out. The stored token is removed even when the call fails.
    ///
    /// # Errors
    /// Returns the network or HTTP error of the sign-out call, or a store error.
    pub async fn signout(&self) -> Result<(), ClientError> {
        let result = match self.request(Method::POST, "/api/auth/signout") {
            Ok(builder) => self.send::<MessageResponse>(builder).await.map(|_| ()),
            Err(err) => Err(err),
        };
        self.store.clear()?;
        result
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 401 without a valid session.
    pub async fn me(&self) -> Result<User, ClientError> {
        let builder = self.request(Method::GET, "/api/auth/me")?;
        let response: UserResponse = self.send(builder).await?;
        Ok(response.user)
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 401 without a valid session.
    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, ClientError> {
        let mut query = Vec::new();
        if let Some(status) = filter.status {
            query.push(("status", status.as_str()));
        }
        if let Some(priority) = filter.priority {
            query.push(("priority", priority.as_str()));
        }
        let builder = self.request(Method::GET, "/api/tasks")?.query(&query);
        let response: TaskListResponse = self.send(builder).await?;
        Ok(response.tasks)
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 400 for a blank title.
    pub async fn create_task(&self, task: &CreateTaskRequest) -> Result<Task, ClientError> {
        let builder = self.request(Method::POST, "/api/tasks")?.json(task);
        let response: TaskResponse = self.send(builder).await?;
        Ok(response.task)
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 404 for an unknown task.
    pub async fn update_task(
        &self,
        id: Uuid,
        changes: &UpdateTaskRequest,
    ) -> Result<Task, ClientError> {
        let builder = self
            .request(Method::PUT, &format!("/api/tasks/{id}"))?
            .json(changes);
        let response: TaskResponse = self.send(builder).await?;
        Ok(response.task)
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 404 for an unknown task.
    pub async fn delete_task(&self, id: Uuid) -> Result<(), ClientError> {
        let builder = self.request(Method::DELETE, &format!("/api/tasks/{id}"))?;
        let _: MessageResponse = self.send(builder).await?;
        Ok(())
    }

    /// # Errors
    /// Returns [`ClientError::Http`] with status 409 when the new email is taken.
    pub async fn update_profile(&self, changes: &ProfileUpdateRequest) -> Result<User, ClientError> {
        let builder = self.request(Method::PUT, "/api/profile")?.json(changes);
        let response: UserResponse = self.send(builder).await?;
        Ok(response.user)
    }
}

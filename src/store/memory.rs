//! In-memory stores used by tests and local runs without a database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    InsertOutcome, NewTask, NewUser, ProfileChanges, Task, TaskChanges, TaskFilter, TaskStore,
    UpdateOutcome, User, UserCredentials, UserStore,
};

fn now_rfc3339() -> Result<String> {
    let now = OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .context("failed to truncate timestamp")?;
    now.format(&Rfc3339).context("failed to format timestamp")
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserCredentials>>,
    // Deleting a user removes their tasks here, like `ON DELETE CASCADE`.
    tasks: Option<Arc<MemoryTaskStore>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// User store whose deletes cascade into `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Arc<MemoryTaskStore>) -> Self {
        Self {
            users: RwLock::default(),
            tasks: Some(tasks),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).map(|record| record.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let users = self.users.read().await;
        Ok(users.values().find(|record| record.user.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<InsertOutcome> {
        // The uniqueness check and the write happen under one write lock.
        let mut users = self.users.write().await;
        if users.values().any(|record| record.user.email == user.email) {
            return Ok(InsertOutcome::Conflict);
        }

        let now = now_rfc3339()?;
        let created = User {
            id: Uuid::now_v7(),
            email: user.email,
            name: user.name,
            created_at: now.clone(),
            updated_at: now,
        };
        users.insert(
            created.id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(InsertOutcome::Created(created))
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<UpdateOutcome<User>> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            let taken = users
                .values()
                .any(|record| record.user.id != id && &record.user.email == email);
            if taken {
                return Ok(UpdateOutcome::Conflict);
            }
        }

        let Some(record) = users.get_mut(&id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if let Some(name) = changes.name {
            record.user.name = name;
        }
        if let Some(email) = changes.email {
            record.user.email = email;
        }
        record.user.updated_at = now_rfc3339()?;
        Ok(UpdateOutcome::Updated(record.user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            if let Some(tasks) = &self.tasks {
                tasks.remove_owned_by(id).await;
            }
        }
        Ok(removed)
    }
}

/// Tasks are kept in insertion order; listing walks them backwards.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn remove_owned_by(&self, user_id: Uuid) {
        self.tasks.write().await.retain(|task| task.user_id != user_id);
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, user_id: Uuid, filter: TaskFilter) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .rev()
            .filter(|task| task.user_id == user_id && filter.matches(task))
            .cloned()
            .collect())
    }

    async fn create(&self, user_id: Uuid, task: NewTask) -> Result<Task> {
        let now = now_rfc3339()?;
        let created = Task {
            id: Uuid::now_v7(),
            user_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: now.clone(),
            updated_at: now,
        };
        self.tasks.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: TaskChanges) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks
            .iter_mut()
            .find(|task| task.id == id && task.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = Some(description);
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = now_rfc3339()?;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| !(task.id == id && task.user_id == user_id));
        Ok(tasks.len() < before)
    }
}

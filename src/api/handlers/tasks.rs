//! Task CRUD for the signed-in user.
//!
//! Every handler takes [`AuthUser`] first, so an unauthenticated request is
//! answered with 401 before its body or query is looked at. Tasks owned by
//! someone else are reported exactly like missing ones.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    auth::{types::MessageResponse, AuthUser},
    error::{ApiError, ErrorResponse},
    non_blank,
};
use crate::store::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus, TaskStore};

const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

impl UpdateTaskRequest {
    /// Blank text fields are treated as absent and leave the column as it is,
    /// matching how create stores them as null. A blank title is rejected.
    fn into_changes(self) -> Result<TaskChanges, ApiError> {
        let title = match self.title {
            Some(title) => Some(
                non_blank(Some(title))
                    .ok_or_else(|| ApiError::Validation("Title is required".to_string()))?,
            ),
            None => None,
        };

        Ok(TaskChanges {
            title,
            description: non_blank(self.description),
            status: self.status,
            priority: self.priority,
            due_date: non_blank(self.due_date),
        })
    }
}

fn task_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::NotFound(TASK_NOT_FOUND))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "The caller's tasks, newest first.", body = TaskListResponse),
        (status = 400, description = "Unknown status or priority filter.", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(
    AuthUser(context): AuthUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let Query(query) = query?;
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
    };

    let tasks = tasks.list(context.user_id, filter).await?;
    Ok(Json(TaskListResponse { tasks }))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created.", body = TaskResponse),
        (status = 400, description = "Missing title or malformed body.", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    AuthUser(context): AuthUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let Some(title) = non_blank(Some(request.title)) else {
        return Err(ApiError::Validation("Title is required".to_string()));
    };

    let task = tasks
        .create(
            context.user_id,
            NewTask {
                title,
                description: non_blank(request.description),
                status: request.status.unwrap_or_default(),
                priority: request.priority.unwrap_or_default(),
                due_date: non_blank(request.due_date),
            },
        )
        .await?;

    debug!(task_id = %task.id, "task created");

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated.", body = TaskResponse),
        (status = 400, description = "Blank title or malformed body.", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
        (status = 404, description = "No such task for this user.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "tasks"
)]
pub async fn update_task(
    AuthUser(context): AuthUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = task_id(path)?;
    let Json(request) = payload?;

    let changes = request.into_changes()?;

    tasks
        .update(context.user_id, id, changes)
        .await?
        .map(|task| Json(TaskResponse { task }))
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted.", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired session.", body = ErrorResponse),
        (status = 404, description = "No such task for this user.", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer" = [])),
    tag = "tasks"
)]
pub async fn delete_task(
    AuthUser(context): AuthUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = task_id(path)?;

    if tasks.delete(context.user_id, id).await? {
        Ok(Json(MessageResponse {
            message: "Task deleted".to_string(),
        }))
    } else {
        Err(ApiError::NotFound(TASK_NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_update_fields_leave_columns_alone() {
        let changes = UpdateTaskRequest {
            description: Some("   ".to_string()),
            due_date: Some(String::new()),
            status: Some(TaskStatus::Completed),
            ..UpdateTaskRequest::default()
        }
        .into_changes();

        assert!(matches!(
            changes,
            Ok(TaskChanges {
                title: None,
                description: None,
                status: Some(TaskStatus::Completed),
                priority: None,
                due_date: None,
            })
        ));
    }

    #[test]
    fn update_trims_text_fields() {
        let changes = UpdateTaskRequest {
            title: Some("  ship it ".to_string()),
            due_date: Some(" 2026-11-01 ".to_string()),
            ..UpdateTaskRequest::default()
        }
        .into_changes();

        let Ok(changes) = changes else {
            panic!("expected valid changes");
        };
        assert_eq!(changes.title.as_deref(), Some("ship it"));
        assert_eq!(changes.due_date.as_deref(), Some("2026-11-01"));
    }

    #[test]
    fn blank_update_title_is_rejected() {
        let changes = UpdateTaskRequest {
            title: Some(" ".to_string()),
            ..UpdateTaskRequest::default()
        }
        .into_changes();
        assert!(matches!(changes, Err(ApiError::Validation(message)) if message == "Title is required"));
    }
}

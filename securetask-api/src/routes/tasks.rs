/// Task store endpoints
///
/// List, create, update, and delete to-do items. Listing is scoped by role
/// (staff see everything, others see their own). Every successful mutation
/// appends exactly one audit record after the change is committed; rejected
/// requests leave no trail.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List tasks (scoped by role)
/// - `POST /v1/tasks` - Create a task owned by the caller
/// - `PUT /v1/tasks/:id` - Update (owner or staff)
/// - `DELETE /v1/tasks/:id` - Delete (owner or staff)

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use securetask_shared::models::{
    audit_log::{AuditAction, AuditLog, RecordEntry},
    task::{CreateTask, Task, TaskStatus, UpdateTask},
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Distinguishes an absent field from an explicit null: absent deserializes
/// to None (leave unchanged), `null` to Some(None) (clear the column).
fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title, required
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to TODO)
    pub status: Option<TaskStatus>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,
}

/// Update task request
///
/// Only the provided fields are changed. For `description` and `due_date`
/// an explicit `null` clears the value; leaving the field out keeps it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    /// New description (null clears it)
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New due date (null clears it)
    #[serde(default, deserialize_with = "clearable")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    /// Tasks, newest-created-first
    pub tasks: Vec<Task>,
}

/// Delete task response
#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    /// Always true on success
    pub deleted: bool,
}

/// Lists tasks, scoped by role
///
/// Staff callers get every task; everyone else gets only the tasks they
/// own. Ordered newest-created-first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = if current.is_staff {
        Task::list_all(&state.db).await?
    } else {
        Task::list_by_owner(&state.db, current.id).await?
    };

    Ok(Json(TaskListResponse { tasks }))
}

/// Creates a task owned by the caller
///
/// Appends one TASK_CREATE audit record carrying the new task's id and
/// title. An empty title is rejected before anything is written.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty or overlong title
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            due_date: req.due_date,
            owner_id: current.id,
        },
    )
    .await?;

    AuditLog::record(
        &state.db,
        RecordEntry {
            user_id: Some(current.id),
            action: AuditAction::TaskCreate,
            details: format!("Created task: '{}' (ID: {})", task.title, task.id),
            ip_address: None,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Updates a task's mutable fields
///
/// Permitted for the task's owner or a staff caller; ownership itself never
/// changes. Appends one TASK_UPDATE audit record on success.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither owner nor staff
/// - `404 Not Found`: No task with this id
/// - `422 Unprocessable Entity`: Empty or overlong title
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !current.can_modify(task.owner_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to modify this task".to_string(),
        ));
    }

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    AuditLog::record(
        &state.db,
        RecordEntry {
            user_id: Some(current.id),
            action: AuditAction::TaskUpdate,
            details: format!("Updated task: '{}' (ID: {})", updated.title, updated.id),
            ip_address: None,
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Deletes a task
///
/// Permitted for the task's owner or a staff caller. The row is removed
/// first; the TASK_DELETE audit record then carries the former id and
/// title.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither owner nor staff
/// - `404 Not Found`: No task with this id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !current.can_modify(task.owner_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to delete this task".to_string(),
        ));
    }

    let removed = Task::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    AuditLog::record(
        &state.db,
        RecordEntry {
            user_id: Some(current.id),
            action: AuditAction::TaskDelete,
            details: format!("Deleted task: '{}' (ID: {})", removed.title, removed.id),
            ip_address: None,
        },
    )
    .await?;

    Ok(Json(DeleteTaskResponse { deleted: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_empty_title() {
        let req = CreateTaskRequest {
            title: String::new(),
            description: None,
            status: None,
            due_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_overlong_title() {
        let req = CreateTaskRequest {
            title: "x".repeat(201),
            description: None,
            status: None,
            due_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_accepts_valid_title() {
        let req = CreateTaskRequest {
            title: "Buy milk".to_string(),
            description: Some("2 liters".to_string()),
            status: Some(TaskStatus::Todo),
            due_date: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_skips_absent_title() {
        // A request that only changes status must not trip title validation
        let req = UpdateTaskRequest {
            title: None,
            description: None,
            status: Some(TaskStatus::Done),
            due_date: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_rejects_empty_title() {
        let req = UpdateTaskRequest {
            title: Some(String::new()),
            description: None,
            status: None,
            due_date: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_absent_field_leaves_value() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("New"));
        assert_eq!(req.description, None);
        assert_eq!(req.due_date, None);
    }

    #[test]
    fn test_update_request_null_clears_value() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null, "due_date": null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert_eq!(req.due_date, Some(None));
    }

    #[test]
    fn test_update_request_present_value_sets_value() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": "Notes", "due_date": "2026-09-01"}"#).unwrap();
        assert_eq!(req.description, Some(Some("Notes".to_string())));
        assert!(matches!(req.due_date, Some(Some(_))));
    }
}

/// Staff console endpoints
///
/// A capability-gated query interface in place of a generic admin panel.
/// Staff get a full task overview with filters and can create tasks on
/// behalf of any user; update and delete go through the standard task
/// endpoints, whose guard already admits staff. The audit view offers
/// filters and search but remains strictly read-only: no route on any
/// surface adds, changes, or deletes an audit record.
///
/// # Endpoints
///
/// - `GET /v1/admin/tasks?status=&owner_id=&search=` - All tasks, filterable
/// - `POST /v1/admin/tasks` - Create a task for any owner
/// - `GET /v1/admin/audit-logs?action=&user_id=&from=&to=&search=&page=` -
///   Filtered audit listing

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
    routes::audit::{page_count, AuditLogPage},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use securetask_shared::models::{
    audit_log::{AuditAction, AuditFilter, AuditLog, PAGE_SIZE},
    task::{CreateTask, Task, TaskStatus},
    user::User,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task overview filters
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    /// Only tasks with this status (TODO, IN_PROGRESS, DONE)
    pub status: Option<String>,

    /// Only tasks owned by this user
    pub owner_id: Option<Uuid>,

    /// Substring search over title and description
    pub search: Option<String>,
}

/// Task overview response
#[derive(Debug, Serialize)]
pub struct TaskOverviewResponse {
    /// Matching tasks, newest-created-first
    pub tasks: Vec<Task>,
}

/// Create-for-owner request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskForOwnerRequest {
    /// Task title, required
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to TODO)
    pub status: Option<TaskStatus>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// The user who will own the task
    pub owner_id: Uuid,
}

/// Audit query filters
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Only records with this action
    pub action: Option<String>,

    /// Only records by this user
    pub user_id: Option<Uuid>,

    /// Only records at or after this time
    pub from: Option<DateTime<Utc>>,

    /// Only records at or before this time
    pub to: Option<DateTime<Utc>>,

    /// Substring search over details and the acting user's username
    pub search: Option<String>,

    /// 1-based page number (default 1)
    pub page: Option<i64>,
}

/// Lists all tasks with optional filters, staff only
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<TaskOverviewResponse>> {
    current.require_staff()?;

    let status = match query.status.as_deref() {
        Some(s) => Some(TaskStatus::parse(s).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown task status: {}", s))
        })?),
        None => None,
    };

    let tasks =
        Task::list_filtered(&state.db, status, query.owner_id, query.search.as_deref()).await?;

    Ok(Json(TaskOverviewResponse { tasks }))
}

/// Creates a task owned by an arbitrary user, staff only
///
/// Audited as a TASK_CREATE by the acting staff member.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not staff
/// - `404 Not Found`: Designated owner does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskForOwnerRequest>,
) -> ApiResult<Json<Task>> {
    current.require_staff()?;
    req.validate().map_err(ApiError::from_validation)?;

    User::find_by_id(&state.db, req.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Owner not found".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            due_date: req.due_date,
            owner_id: req.owner_id,
        },
    )
    .await?;

    AuditLog::record(
        &state.db,
        securetask_shared::models::audit_log::RecordEntry {
            user_id: Some(current.id),
            action: AuditAction::TaskCreate,
            details: format!("Created task: '{}' (ID: {})", task.title, task.id),
            ip_address: None,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Lists audit records with filters and search, staff only
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<AuditLogPage>> {
    current.require_staff()?;

    let action = match query.action.as_deref() {
        Some(s) => Some(AuditAction::parse(s).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown audit action: {}", s))
        })?),
        None => None,
    };

    let filter = AuditFilter {
        action,
        user_id: query.user_id,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let page = query.page.unwrap_or(1).max(1);
    let logs = AuditLog::list_filtered(&state.db, &filter, page).await?;
    let total = AuditLog::count_filtered(&state.db, &filter).await?;

    Ok(Json(AuditLogPage {
        logs,
        page,
        per_page: PAGE_SIZE,
        total,
        total_pages: page_count(total, PAGE_SIZE),
    }))
}

/// Task model and database operations
///
/// Tasks are personal to-do items. Every task has exactly one owner for its
/// entire lifetime; ownership never transfers. Deleting the owning user
/// deletes their tasks (cascade).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'TODO',
///     due_date DATE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started yet (the default for new tasks)
    Todo,

    /// Currently being worked on
    InProgress,

    /// Completed
    Done,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Parses status from its stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Task model representing a to-do item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title, required
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Completion status (stored as text: TODO, IN_PROGRESS, DONE)
    pub status: String,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Owner of the task; set at creation and never changed
    pub owner_id: Uuid,

    /// When the task was created; immutable thereafter
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to TODO)
    #[serde(default)]
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Owner (the authenticated caller)
    pub owner_id: Uuid,
}

/// Input for updating a task
///
/// Only non-None fields are updated. Owner and created_at are not updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (Some(None) clears it)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New due date (Some(None) clears it)
    pub due_date: Option<Option<NaiveDate>>,
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, due_date, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, due_date, owner_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.due_date)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, owner_id, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks, newest-created-first
    ///
    /// Used for staff callers, who see every task.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, owner_id, created_at
            FROM tasks
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks owned by one user, newest-created-first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, owner_id, created_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task's mutable fields
    ///
    /// Only non-None fields in `data` are written; owner_id and created_at
    /// are never touched.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the id does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build a dynamic update from the fields that are present
        let mut query = String::from("UPDATE tasks SET id = id");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, due_date, owner_id, created_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// # Returns
    ///
    /// The removed row if it existed, so the caller can record the former
    /// id and title in the audit trail.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1
            RETURNING id, title, description, status, due_date, owner_id, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks for the staff console, newest-created-first
    ///
    /// Optionally filtered by status and owner; the search term matches
    /// title or description, case-insensitively.
    pub async fn list_filtered(
        pool: &PgPool,
        status: Option<TaskStatus>,
        owner_id: Option<Uuid>,
        search: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, owner_id, created_at
            FROM tasks
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(owner_id)
        .bind(search)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "TODO");
        assert_eq!(TaskStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(TaskStatus::Done.as_str(), "DONE");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("TODO"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("IN_PROGRESS"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("invalid"), None);
        assert_eq!(TaskStatus::parse("todo"), None); // stored form is uppercase
    }

    #[test]
    fn test_task_status_default() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn test_task_status_serde_rename() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let parsed: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    #[test]
    fn test_update_task_default_is_empty() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.due_date.is_none());
    }
}

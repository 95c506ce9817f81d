/// Audit log model and database operations
///
/// The audit log is an append-only trail of authentication events and task
/// mutations. Rows are written exactly once, synchronously with the event
/// that triggered them, and this module deliberately exposes no update or
/// delete operation. Deleting a user nulls the `user_id` reference instead
/// of cascading, so history survives account removal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     action VARCHAR(50) NOT NULL,
///     timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     details TEXT NOT NULL DEFAULT '',
///     ip_address VARCHAR(45)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use securetask_shared::models::audit_log::{AuditAction, AuditLog, RecordEntry};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// AuditLog::record(&pool, RecordEntry {
///     user_id: Some(user_id),
///     action: AuditAction::TaskCreate,
///     details: "Created task: 'Buy milk' (ID: ...)".to_string(),
///     ip_address: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Records returned per page by the paginated listings
pub const PAGE_SIZE: i64 = 25;

/// Audited event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Successful login
    LoginSuccess,

    /// Failed login attempt (no user reference)
    LoginFailed,

    /// User logged out
    Logout,

    /// Task created
    TaskCreate,

    /// Task updated
    TaskUpdate,

    /// Task deleted
    TaskDelete,
}

impl AuditAction {
    /// Converts action to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::Logout => "LOGOUT",
            AuditAction::TaskCreate => "TASK_CREATE",
            AuditAction::TaskUpdate => "TASK_UPDATE",
            AuditAction::TaskDelete => "TASK_DELETE",
        }
    }

    /// Parses action from its stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOGIN_SUCCESS" => Some(AuditAction::LoginSuccess),
            "LOGIN_FAILED" => Some(AuditAction::LoginFailed),
            "LOGOUT" => Some(AuditAction::Logout),
            "TASK_CREATE" => Some(AuditAction::TaskCreate),
            "TASK_UPDATE" => Some(AuditAction::TaskUpdate),
            "TASK_DELETE" => Some(AuditAction::TaskDelete),
            _ => None,
        }
    }
}

/// One immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    /// Unique record ID
    pub id: Uuid,

    /// Acting user; None for failed logins and after user deletion
    pub user_id: Option<Uuid>,

    /// Event type (stored as text, see [`AuditAction`])
    pub action: String,

    /// Server-assigned creation time; immutable
    pub timestamp: DateTime<Utc>,

    /// Free-text description of the event
    pub details: String,

    /// Client network address, when known
    pub ip_address: Option<String>,
}

/// Input for appending a new audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Acting user, if any
    pub user_id: Option<Uuid>,

    /// Event type
    pub action: AuditAction,

    /// Event description
    pub details: String,

    /// Client address, if known
    pub ip_address: Option<String>,
}

/// Filters for the staff console listing
///
/// Mirrors what the read-only console offers: filter by action, user, and
/// time range, plus a substring search over details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Only records with this action
    pub action: Option<AuditAction>,

    /// Only records by this user
    pub user_id: Option<Uuid>,

    /// Only records at or after this time
    pub from: Option<DateTime<Utc>>,

    /// Only records at or before this time
    pub to: Option<DateTime<Utc>>,

    /// Case-insensitive substring match against details or the acting
    /// user's username
    pub search: Option<String>,
}

/// Converts a 1-based page number to a row offset
///
/// Clamps the page so the multiplication cannot overflow on absurd input.
fn page_offset(page: i64) -> i64 {
    (page.clamp(1, i64::MAX / PAGE_SIZE) - 1) * PAGE_SIZE
}

impl AuditLog {
    /// Appends one audit record with a server-assigned timestamp
    ///
    /// This is the only write operation the audit log exposes. Existing
    /// records are never modified or removed.
    pub async fn record(pool: &PgPool, entry: RecordEntry) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, details, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, action, timestamp, details, ip_address
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.details)
        .bind(entry.ip_address)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    /// Lists audit records newest-first, 25 per page
    ///
    /// Pages are 1-based; out-of-range pages return an empty vector.
    pub async fn list(pool: &PgPool, page: i64) -> Result<Vec<Self>, sqlx::Error> {
        let offset = page_offset(page);

        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, action, timestamp, details, ip_address
            FROM audit_logs
            ORDER BY timestamp DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }

    /// Counts all audit records
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Lists audit records matching a filter, newest-first, 25 per page
    ///
    /// The search term matches the details text or the acting user's
    /// username.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &AuditFilter,
        page: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let offset = page_offset(page);

        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT a.id, a.user_id, a.action, a.timestamp, a.details, a.ip_address
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE ($1::text IS NULL OR a.action = $1)
              AND ($2::uuid IS NULL OR a.user_id = $2)
              AND ($3::timestamptz IS NULL OR a.timestamp >= $3)
              AND ($4::timestamptz IS NULL OR a.timestamp <= $4)
              AND ($5::text IS NULL OR a.details ILIKE '%' || $5 || '%'
                   OR u.username ILIKE '%' || $5 || '%')
            ORDER BY a.timestamp DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.action.map(|a| a.as_str()))
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.search.as_deref())
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }

    /// Counts audit records matching a filter
    pub async fn count_filtered(pool: &PgPool, filter: &AuditFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE ($1::text IS NULL OR a.action = $1)
              AND ($2::uuid IS NULL OR a.user_id = $2)
              AND ($3::timestamptz IS NULL OR a.timestamp >= $3)
              AND ($4::timestamptz IS NULL OR a.timestamp <= $4)
              AND ($5::text IS NULL OR a.details ILIKE '%' || $5 || '%'
                   OR u.username ILIKE '%' || $5 || '%')
            "#,
        )
        .bind(filter.action.map(|a| a.as_str()))
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.search.as_deref())
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_as_str() {
        assert_eq!(AuditAction::LoginSuccess.as_str(), "LOGIN_SUCCESS");
        assert_eq!(AuditAction::LoginFailed.as_str(), "LOGIN_FAILED");
        assert_eq!(AuditAction::Logout.as_str(), "LOGOUT");
        assert_eq!(AuditAction::TaskCreate.as_str(), "TASK_CREATE");
        assert_eq!(AuditAction::TaskUpdate.as_str(), "TASK_UPDATE");
        assert_eq!(AuditAction::TaskDelete.as_str(), "TASK_DELETE");
    }

    #[test]
    fn test_audit_action_parse() {
        assert_eq!(AuditAction::parse("LOGIN_SUCCESS"), Some(AuditAction::LoginSuccess));
        assert_eq!(AuditAction::parse("TASK_DELETE"), Some(AuditAction::TaskDelete));
        assert_eq!(AuditAction::parse("unknown"), None);
    }

    #[test]
    fn test_audit_action_roundtrip() {
        let actions = [
            AuditAction::LoginSuccess,
            AuditAction::LoginFailed,
            AuditAction::Logout,
            AuditAction::TaskCreate,
            AuditAction::TaskUpdate,
            AuditAction::TaskDelete,
        ];

        for action in actions {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_page_size_is_25() {
        assert_eq!(PAGE_SIZE, 25);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 25);
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(-7), 0);
    }

    #[test]
    fn test_page_offset_huge_page_does_not_overflow() {
        let offset = page_offset(i64::MAX);
        assert!(offset > 0);
        assert_eq!(offset % PAGE_SIZE, 0);
    }

    #[test]
    fn test_audit_filter_default_matches_everything() {
        let filter = AuditFilter::default();
        assert!(filter.action.is_none());
        assert!(filter.user_id.is_none());
        assert!(filter.from.is_none());
        assert!(filter.to.is_none());
        assert!(filter.search.is_none());
    }
}

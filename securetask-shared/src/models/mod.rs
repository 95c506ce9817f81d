/// Database models for SecureTask
///
/// # Models
///
/// - `user`: User accounts with a staff flag
/// - `task`: Personal to-do items owned by a user
/// - `audit_log`: Append-only audit trail of auth events and task mutations

pub mod audit_log;
pub mod task;
pub mod user;

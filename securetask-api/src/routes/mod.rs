/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Session lifecycle (register, login, logout, refresh)
/// - `tasks`: Task store (list, create, update, delete)
/// - `audit`: Staff-only paginated audit listing
/// - `admin`: Staff console (task overview, filtered audit queries)

pub mod admin;
pub mod audit;
pub mod auth;
pub mod health;
pub mod tasks;

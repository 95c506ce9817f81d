/// Application state and router builder
///
/// Defines the shared application state, the authenticated-caller context,
/// and the function that assembles the axum router with all routes and
/// middleware.
///
/// # Example
///
/// ```no_run
/// use securetask_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = securetask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use securetask_shared::{auth::jwt, models::user::User};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// The authenticated caller, injected into request extensions by the
/// bearer-token layer
///
/// The staff flag comes from the user row loaded per request, not from the
/// token, so revoking staff status or deleting the account takes effect
/// immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID
    pub id: Uuid,

    /// Login name
    pub username: String,

    /// Whether the caller has staff privileges
    pub is_staff: bool,
}

impl CurrentUser {
    /// Builds the caller context from a loaded user row
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
        }
    }

    /// Ownership predicate: the caller may mutate a task it owns, and staff
    /// may mutate any task
    pub fn can_modify(&self, owner_id: Uuid) -> bool {
        self.is_staff || self.id == owner_id
    }

    /// Staff guard evaluated at the start of staff-only handlers
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Staff access required".to_string()))
        }
    }
}

/// Builds the complete axum router
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register      # Create account + session (public)
///     │   ├── POST /login         # Login, audited (public)
///     │   ├── POST /refresh       # Exchange refresh token (public)
///     │   └── POST /logout        # Logout, audited (authenticated)
///     ├── /tasks/                 # Task store (authenticated)
///     │   ├── GET    /            # List (scoped by role)
///     │   ├── POST   /            # Create
///     │   ├── PUT    /:id         # Update (owner or staff)
///     │   └── DELETE /:id         # Delete (owner or staff)
///     ├── GET /audit-logs         # Paginated audit listing (staff)
///     └── /admin/                 # Staff console (staff)
///         ├── GET  /tasks         # All tasks with filters
///         ├── POST /tasks         # Create for any owner
///         └── GET  /audit-logs    # Filtered audit listing
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes that do not require an existing session
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Logout needs to know who is logging out
    let auth_private = Router::new()
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Task store (authenticated; ownership checks happen in the handlers)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Audit reader (authenticated; staff guard in the handler)
    let audit_routes = Router::new()
        .route("/", get(routes::audit::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Staff console (authenticated; staff guard in the handlers)
    let admin_routes = Router::new()
        .route("/tasks", get(routes::admin::list_tasks))
        .route("/tasks", post(routes::admin::create_task))
        .route("/audit-logs", get(routes::admin::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/tasks", task_routes)
        .nest("/audit-logs", audit_routes)
        .nest("/admin", admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token authentication layer
///
/// Validates the access token from the Authorization header, loads the user
/// row, and injects [`CurrentUser`] into request extensions. Requests whose
/// user no longer exists are rejected.
async fn bearer_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    req.extensions_mut().insert(CurrentUser::from_user(&user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: Uuid, is_staff: bool) -> CurrentUser {
        CurrentUser {
            id,
            username: "tester".to_string(),
            is_staff,
        }
    }

    #[test]
    fn test_owner_can_modify_own_task() {
        let id = Uuid::new_v4();
        assert!(caller(id, false).can_modify(id));
    }

    #[test]
    fn test_non_owner_cannot_modify() {
        let user = caller(Uuid::new_v4(), false);
        assert!(!user.can_modify(Uuid::new_v4()));
    }

    #[test]
    fn test_staff_can_modify_any_task() {
        let staff = caller(Uuid::new_v4(), true);
        assert!(staff.can_modify(Uuid::new_v4()));
    }

    #[test]
    fn test_require_staff() {
        assert!(caller(Uuid::new_v4(), true).require_staff().is_ok());

        let err = caller(Uuid::new_v4(), false).require_staff().unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}

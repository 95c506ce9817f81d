/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation (one regular, one staff)
/// - JWT token generation
/// - Request helpers
///
/// Tests that use this context require a running Postgres reachable via
/// `DATABASE_URL`, plus a `JWT_SECRET` of at least 32 characters.

use axum::body::Body;
use axum::http::Request;
use securetask_api::app::{build_router, AppState};
use securetask_api::config::Config;
use securetask_shared::auth::jwt::{create_token, Claims, TokenType};
use securetask_shared::auth::password;
use securetask_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "TestPassw0rd";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub staff: User,
    pub user_token: String,
    pub staff_token: String,
}

impl TestContext {
    /// Creates a new test context with a migrated database and two accounts
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let password_hash = password::hash_password(TEST_PASSWORD)?;

        let user = User::create(
            &db,
            CreateUser {
                username: format!("alice-{}", Uuid::new_v4()),
                password_hash: password_hash.clone(),
                is_staff: false,
            },
        )
        .await?;

        let staff = User::create(
            &db,
            CreateUser {
                username: format!("root-{}", Uuid::new_v4()),
                password_hash,
                is_staff: true,
            },
        )
        .await?;

        let user_token = create_token(
            &Claims::new(user.id, TokenType::Access),
            &config.jwt.secret,
        )?;
        let staff_token = create_token(
            &Claims::new(staff.id, TokenType::Access),
            &config.jwt.secret,
        )?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            staff,
            user_token,
            staff_token,
        })
    }

    /// Creates an extra non-staff account sharing [`TEST_PASSWORD`]
    pub async fn create_user(&self, prefix: &str) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                username: format!("{}-{}", prefix, Uuid::new_v4()),
                password_hash: password::hash_password(TEST_PASSWORD)?,
                is_staff: false,
            },
        )
        .await?;

        let token = create_token(
            &Claims::new(user.id, TokenType::Access),
            &self.config.jwt.secret,
        )?;

        Ok((user, token))
    }

    /// Cleans up test data
    ///
    /// Owned tasks cascade away; audit records survive with a nulled user
    /// reference, as in production.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.user.id).await?;
        User::delete(&self.db, self.staff.id).await?;
        Ok(())
    }
}

/// Builds an authenticated JSON request
pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds an authenticated bodyless request
pub fn get_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

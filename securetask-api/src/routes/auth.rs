/// Session lifecycle endpoints
///
/// Registration, login, logout, and token refresh. Login and logout are
/// audited; registration deliberately is not (only subsequent logins are),
/// and failed logins are recorded without a user reference.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create account and return a token pair
/// - `POST /v1/auth/login` - Verify credentials, audited either way
/// - `POST /v1/auth/logout` - Audited logout (requires auth)
/// - `POST /v1/auth/refresh` - Exchange a refresh token

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::HeaderMap, Extension, Json};
use securetask_shared::{
    auth::{jwt, password},
    models::{
        audit_log::{AuditAction, AuditLog, RecordEntry},
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    /// Password (also checked for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
///
/// Registration immediately establishes an authenticated session.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// User ID
    pub user_id: String,

    /// Login name
    pub username: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Login name
    pub username: String,

    /// Whether the user has staff privileges
    pub is_staff: bool,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Always true on success
    pub logged_out: bool,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Extracts the client address from proxy headers
///
/// Checks `X-Forwarded-For` (first hop) and `X-Real-Ip`. Returns None when
/// neither is present; the audit record then carries no address.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next()?.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns the User-Agent header value, or "unknown"
fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Register a new user
///
/// Creates the account and immediately returns a token pair, so the caller
/// is logged in. No audit record is written for registration itself.
///
/// # Errors
///
/// - `409 Conflict`: Username already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            password_hash,
            is_staff: false,
        },
    )
    .await?;

    let access_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Access),
        state.jwt_secret(),
    )?;
    let refresh_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Refresh),
        state.jwt_secret(),
    )?;

    Ok(Json(RegisterResponse {
        user_id: user.id.to_string(),
        username: user.username,
        access_token,
        refresh_token,
    }))
}

/// Login endpoint
///
/// Every attempt is audited: success produces a LOGIN_SUCCESS record with
/// the client address and user agent; failure produces a LOGIN_FAILED
/// record carrying the attempted username and no user reference.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let ip = client_ip(&headers);

    let user = match User::find_by_username(&state.db, &req.username).await? {
        Some(user) if password::verify_password(&req.password, &user.password_hash)? => user,
        _ => {
            // Unknown user and wrong password are indistinguishable to the
            // caller; both leave the same trail.
            AuditLog::record(
                &state.db,
                RecordEntry {
                    user_id: None,
                    action: AuditAction::LoginFailed,
                    details: format!("Failed login attempt for '{}'", req.username),
                    ip_address: ip,
                },
            )
            .await?;

            return Err(ApiError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }
    };

    User::update_last_login(&state.db, user.id).await?;

    AuditLog::record(
        &state.db,
        RecordEntry {
            user_id: Some(user.id),
            action: AuditAction::LoginSuccess,
            details: format!("Successful login via {}", user_agent(&headers)),
            ip_address: ip,
        },
    )
    .await?;

    let access_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Access),
        state.jwt_secret(),
    )?;
    let refresh_token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Refresh),
        state.jwt_secret(),
    )?;

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        username: user.username,
        is_staff: user.is_staff,
        access_token,
        refresh_token,
    }))
}

/// Logout endpoint
///
/// Tokens are stateless, so logout is an audit event rather than a server
/// state change: one LOGOUT record is appended for the caller.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Json<LogoutResponse>> {
    AuditLog::record(
        &state.db,
        RecordEntry {
            user_id: Some(current.id),
            action: AuditAction::Logout,
            details: "User logged out".to_string(),
            ip_address: client_ip(&headers),
        },
    )
    .await?;

    Ok(Json(LogoutResponse { logged_out: true }))
}

/// Token refresh endpoint
///
/// Exchanges a valid refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

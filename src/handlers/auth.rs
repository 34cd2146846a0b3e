//! Authentication HTTP handlers.
//!
//! - POST /api/v1/auth/register - Open a bank account and log in
//! - POST /api/v1/auth/login - Exchange credentials for a session token
//! - POST /api/v1/auth/logout - End the current session
//! - POST /api/v1/auth/password - Change password

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    db::DbPool,
    error::AppError,
    extract::JsonBody,
    middleware::auth::AuthContext,
    models::user::{ChangePasswordRequest, LoginRequest, RegisterRequest, SessionResponse},
    services::{auth_service, mail_service::Notification},
    state::AppState,
};

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new customer.
///
/// # Response
///
/// - **201 Created**: session token plus the new profile, including the
///   allocated account number
/// - **400**: validation failed
/// - **409**: username taken
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = auth_service::register(&state.pool, request, state.session_ttl).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Log in.
///
/// # Response
///
/// ```json
/// {
///   "token": "9f86d081884c7d65...",
///   "expires_at": "2025-12-22T10:00:00Z",
///   "profile": { "username": "alice", "account_number": 100000, ... }
/// }
/// ```
///
/// - **401**: unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = auth_service::login(&state.pool, request, state.session_ttl).await?;

    Ok(Json(session))
}

/// Log out; the bearer token stops working immediately.
pub async fn logout(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&pool, &auth).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Change password and email the user about it.
///
/// # Request Body
///
/// ```json
/// {
///   "old_password": "...",
///   "new_password": "...",
///   "new_password_confirm": "..."
/// }
/// ```
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service::change_password(&state.pool, &auth, request).await?;

    state.mailer.notify(
        state.pool.clone(),
        auth.recipient(),
        Notification::PasswordChanged,
    );

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

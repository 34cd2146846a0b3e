//! Profile HTTP handlers.
//!
//! - GET /api/v1/profile - Current user, address and bank account
//! - PUT /api/v1/profile - Update name, email and address

use axum::{Extension, Json, extract::State};

use crate::{
    db::DbPool,
    error::AppError,
    extract::JsonBody,
    middleware::auth::AuthContext,
    models::user::{Profile, UpdateProfileRequest},
    services::account_service,
};

/// Get the caller's profile, balance included.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "account_number": 100000,
///   "account_type": "savings",
///   "balance_cents": 150000,
///   "street_address": "1 Main St",
///   ...
/// }
/// ```
pub async fn get_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Profile>, AppError> {
    let profile = account_service::get_profile(&pool, auth.user_id).await?;

    Ok(Json(profile))
}

/// Update the caller's profile and return the new version.
pub async fn update_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let profile = account_service::update_profile(&pool, auth.user_id, request).await?;

    Ok(Json(profile))
}

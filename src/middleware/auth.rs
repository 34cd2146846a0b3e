//! Session authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and look up a non-expired session in the database
//! 3. Inject the caller's identity and bank account into the request
//! 4. Reject unauthenticated requests with HTTP 401

use crate::{
    db::DbPool, error::AppError, models::notification::Recipient, services::auth_service,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthContext {
    /// Session that authenticated this request
    pub session_id: Uuid,

    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,

    /// The caller's bank account
    pub account_id: Uuid,
    pub account_number: i64,
}

impl AuthContext {
    pub fn display_name(&self) -> String {
        crate::models::user::display_name(&self.first_name, &self.last_name, &self.username)
    }

    /// The caller as an email recipient.
    pub fn recipient(&self) -> Recipient {
        Recipient {
            user_id: self.user_id,
            email: self.email.clone(),
            name: self.display_name(),
        }
    }

    /// Fail with 403 unless the caller is staff.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme name is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve a plaintext session token to its caller.
///
/// Returns `None` for unknown, revoked or expired sessions.
pub async fn resolve_session(pool: &DbPool, token: &str) -> Result<Option<AuthContext>, AppError> {
    let auth_context = sqlx::query_as::<_, AuthContext>(
        r#"
        SELECT s.id AS session_id,
               u.id AS user_id,
               u.username,
               u.email,
               u.first_name,
               u.last_name,
               u.is_staff,
               a.id AS account_id,
               a.account_number
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        JOIN bank_accounts a ON a.user_id = u.id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(auth_service::hash_token(token))
    .fetch_optional(pool)
    .await?;

    Ok(auth_context)
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query the session joined with its user and bank account, requiring
///    `expires_at > NOW()`
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let auth_context = resolve_session(&pool, token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code. User
/// input problems carry a human-readable message that is shown to the
/// client as-is.
///
/// # Error Categories
///
/// - **Database / hashing errors**: internal failures, details never leave the server
/// - **Authentication errors**: missing session, bad credentials, staff-only routes
/// - **Resource errors**: unknown account number or loan
/// - **Business rule errors**: insufficient balance, loan rules
/// - **Validation errors**: invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing or verification failed for a reason other than a
    /// wrong password.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Bearer token is missing, unknown or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Authentication required")]
    Unauthorized,

    /// Username/password pair did not match.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Authenticated user lacks staff rights.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Staff access required")]
    Forbidden,

    /// No bank account with the given account number.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Invalid Account No")]
    AccountNotFound,

    /// Loan does not exist or belongs to someone else.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Loan not found")]
    LoanNotFound,

    /// Username already registered.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("A user with that username already exists")]
    UsernameTaken,

    /// Account has insufficient balance for the requested operation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient Balance")]
    InsufficientBalance,

    /// Account already holds the maximum number of approved loans.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("You have crossed the loan limits")]
    LoanLimitReached,

    /// Loan has not been approved by staff yet.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Loan is not approved yet")]
    LoanNotApproved,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("{0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) | AppError::PasswordHash(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::AccountNotFound => (StatusCode::NOT_FOUND, "account_not_found"),
            AppError::LoanNotFound => (StatusCode::NOT_FOUND, "loan_not_found"),
            AppError::UsernameTaken => (StatusCode::CONFLICT, "username_taken"),
            AppError::InsufficientBalance => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_balance")
            }
            AppError::LoanLimitReached => (StatusCode::UNPROCESSABLE_ENTITY, "loan_limit_reached"),
            AppError::LoanNotApproved => (StatusCode::UNPROCESSABLE_ENTITY, "loan_not_approved"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        }
    }
}

// Malformed bodies, query strings and path segments are validation errors.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Internal errors are logged here and replaced by a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

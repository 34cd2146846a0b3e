//! Loan HTTP handlers.
//!
//! - POST /api/v1/loans - Request a loan
//! - GET /api/v1/loans - List the caller's open loans
//! - POST /api/v1/loans/{id}/pay - Repay an approved loan
//! - POST /api/v1/admin/loans/{id}/approve - Staff approval

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    extract::{JsonBody, PathParam},
    middleware::auth::AuthContext,
    models::transaction::{AmountRequest, TransactionOutcome, TransactionResponse},
    services::{mail_service::Notification, transaction_service},
    state::AppState,
};

/// Request a loan. The balance is credited only after staff approval.
///
/// # Errors
///
/// - **422** `loan_limit_reached`: three approved loans are already open
pub async fn request_loan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<AmountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let loan =
        transaction_service::request_loan(&state.pool, auth.account_id, request.amount_cents)
            .await?;

    state.mailer.notify(
        state.pool.clone(),
        auth.recipient(),
        Notification::LoanRequest {
            amount_cents: loan.amount_cents,
        },
    );

    let message = format!(
        "Loan request for {} $ submitted successfully",
        transaction_service::format_cents(loan.amount_cents)
    );

    Ok((StatusCode::CREATED, Json(TransactionOutcome::new(message, loan))))
}

/// List the caller's loans, pending and approved.
pub async fn list_loans(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let loans = transaction_service::list_loans(&pool, auth.account_id).await?;

    Ok(Json(loans.into_iter().map(Into::into).collect()))
}

/// Repay an approved loan in full.
///
/// # Errors
///
/// - **404**: loan unknown or not the caller's
/// - **422** `loan_not_approved`: still pending
/// - **400**: balance lower than the loan amount
pub async fn pay_loan(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    PathParam(loan_id): PathParam<Uuid>,
) -> Result<Json<TransactionOutcome>, AppError> {
    let loan = transaction_service::pay_loan(&pool, auth.account_id, loan_id).await?;

    Ok(Json(TransactionOutcome::new(
        "Loan amount paid successfully",
        loan,
    )))
}

/// Approve a pending loan (staff only) and credit the borrower.
///
/// # Errors
///
/// - **403**: caller is not staff
/// - **404**: no such loan
pub async fn approve_loan(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    PathParam(loan_id): PathParam<Uuid>,
) -> Result<Json<TransactionOutcome>, AppError> {
    auth.require_staff()?;

    let loan = transaction_service::approve_loan(&pool, loan_id).await?;

    tracing::info!(approved_by = %auth.username, %loan_id, "staff approved loan");

    Ok(Json(TransactionOutcome::new("Loan approved", loan)))
}

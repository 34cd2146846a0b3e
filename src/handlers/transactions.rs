//! Transaction HTTP handlers.
//!
//! This module implements the money-movement endpoints:
//! - POST /api/v1/transactions/deposit - Add money to the caller's account
//! - POST /api/v1/transactions/withdraw - Take money out
//! - POST /api/v1/transactions/transfer - Send money to another customer
//! - GET /api/v1/transactions/report - History and current balance

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    db::DbPool,
    error::AppError,
    extract::{JsonBody, QueryParams},
    middleware::auth::AuthContext,
    models::transaction::{
        AmountRequest, ReportQuery, ReportResponse, TransactionOutcome, TransferRequest,
    },
    services::{mail_service::Notification, transaction_service},
    state::AppState,
};

/// Deposit money.
///
/// # Request Body
///
/// ```json
/// { "amount_cents": 25000 }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "250.00 $ was deposited to your account successfully",
///   "transaction": {
///     "transaction_type": "deposit",
///     "amount_cents": 25000,
///     "balance_after_cents": 25000,
///     ...
///   }
/// }
/// ```
pub async fn deposit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<AmountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction =
        transaction_service::deposit(&state.pool, auth.account_id, request.amount_cents).await?;

    state.mailer.notify(
        state.pool.clone(),
        auth.recipient(),
        Notification::Deposit {
            amount_cents: transaction.amount_cents,
        },
    );

    let message = format!(
        "{} $ was deposited to your account successfully",
        transaction_service::format_cents(transaction.amount_cents)
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionOutcome::new(message, transaction)),
    ))
}

/// Withdraw money.
///
/// # Validation
///
/// - Amount between 500.00 and 20000.00
/// - Amount not above the current balance
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<AmountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction =
        transaction_service::withdraw(&state.pool, auth.account_id, request.amount_cents).await?;

    state.mailer.notify(
        state.pool.clone(),
        auth.recipient(),
        Notification::Withdrawal {
            amount_cents: transaction.amount_cents,
        },
    );

    let message = format!(
        "Successfully withdrawn {} $ from your account",
        transaction_service::format_cents(transaction.amount_cents)
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionOutcome::new(message, transaction)),
    ))
}

/// Transfer money to another account.
///
/// # Request Body
///
/// ```json
/// { "account_number": 100042, "amount_cents": 2500 }
/// ```
///
/// # Atomicity
///
/// Both balances change in a single database transaction. On
/// "Insufficient Balance" or "Invalid Account No" nothing changes.
///
/// Both parties get an email once the transfer has committed.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<TransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = transaction_service::transfer(
        &state.pool,
        auth.account_id,
        request.account_number,
        request.amount_cents,
    )
    .await?;

    let amount_cents = outcome.transaction.amount_cents;

    state.mailer.notify(
        state.pool.clone(),
        auth.recipient(),
        Notification::TransferSent {
            amount_cents,
            to_account_number: request.account_number,
        },
    );
    state.mailer.notify(
        state.pool.clone(),
        outcome.recipient,
        Notification::TransferReceived {
            amount_cents,
            from_account_number: auth.account_number,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionOutcome::new(
            "Send Money Successful",
            outcome.transaction,
        )),
    ))
}

/// Transaction report, optionally limited to a date range.
///
/// `GET /api/v1/transactions/report?start_date=2025-01-01&end_date=2025-01-31`
pub async fn report(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<ReportQuery>,
) -> Result<Json<ReportResponse>, AppError> {
    let report = transaction_service::report(&pool, auth.account_id, query).await?;

    Ok(Json(report))
}

//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, session context)
//! 2. Calls into the service layer
//! 3. Returns HTTP response (JSON, status code)
//! 4. Queues notification emails once the operation has committed

/// Profile endpoints
pub mod accounts;
/// Registration, login, logout and password change
pub mod auth;
/// Service health
pub mod health;
/// Loan request, listing, repayment and staff approval
pub mod loans;
/// Deposits, withdrawals, transfers and the report
pub mod transactions;

//! Business logic layer.
//!
//! Handlers stay thin; everything that touches balances, sessions or
//! outbound mail lives here.

/// Profile lookup and update
pub mod account_service;
/// Registration, login sessions and password changes
pub mod auth_service;
/// Notification emails via the mail relay
pub mod mail_service;
/// Deposits, withdrawals, loans, transfers and reports
pub mod transaction_service;

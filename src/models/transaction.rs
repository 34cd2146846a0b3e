//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `TransactionType`: the five kinds of balance-affecting operations
//! - `Transaction`: database entity representing one recorded operation
//! - Request types for deposit, withdraw, loan and transfer operations
//! - Response types for single operations, loan lists and reports

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of balance-affecting operation.
///
/// Stored in the `transaction_type` column as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Loan,
    LoanPaid,
    Transfer,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Loan => "loan",
            TransactionType::LoanPaid => "loan_paid",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdraw" => Ok(TransactionType::Withdraw),
            "loan" => Ok(TransactionType::Loan),
            "loan_paid" => Ok(TransactionType::LoanPaid),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each row belongs to one bank account
/// and snapshots that account's balance right after the operation.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    /// Unique identifier for this transaction
    pub id: Uuid,

    /// Account whose balance the operation changed
    pub account_id: Uuid,

    /// Amount in cents, always positive
    pub amount_cents: i64,

    /// Owning account's balance after the operation
    ///
    /// For a pending loan this is the unchanged balance at request time.
    pub balance_after_cents: i64,

    /// One of the `TransactionType` names
    pub transaction_type: String,

    /// Only meaningful for `loan` / `loan_paid` rows
    pub loan_approved: bool,

    /// Recipient account number, set on transfers
    pub counterparty_account_number: Option<i64>,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn kind(&self) -> Option<TransactionType> {
        self.transaction_type.parse().ok()
    }
}

/// Request body for deposit, withdraw and loan requests.
///
/// # JSON Example
///
/// ```json
/// { "amount_cents": 25000 }
/// ```
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount_cents: i64,
}

/// Request to transfer money to another customer.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_number": 100042,
///   "amount_cents": 2500
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// Both accounts are updated in the same database transaction.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Recipient's public account number
    pub account_number: i64,

    /// Amount to transfer in cents
    pub amount_cents: i64,
}

/// Optional inclusive date bounds for the transaction report.
///
/// `GET /api/v1/transactions/report?start_date=2025-01-01&end_date=2025-01-31`
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Response body describing a single transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub balance_after_cents: i64,
    pub loan_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_account_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            transaction_type: transaction.transaction_type,
            amount_cents: transaction.amount_cents,
            balance_after_cents: transaction.balance_after_cents,
            loan_approved: transaction.loan_approved,
            counterparty_account_number: transaction.counterparty_account_number,
            created_at: transaction.created_at,
        }
    }
}

/// Success response for money movements: a user-facing message plus the
/// recorded transaction.
///
/// ```json
/// {
///   "message": "Send Money Successful",
///   "transaction": { "transaction_type": "transfer", "amount_cents": 2500, ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransactionOutcome {
    pub message: String,
    pub transaction: TransactionResponse,
}

impl TransactionOutcome {
    pub fn new(message: impl Into<String>, transaction: Transaction) -> Self {
        Self {
            message: message.into(),
            transaction: transaction.into(),
        }
    }
}

/// Transaction report: current balance plus the filtered history.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub balance_cents: i64,
    pub transactions: Vec<TransactionResponse>,
}

//! Transaction service - Core business logic for money movements.
//!
//! This service handles:
//! - Deposits, withdrawals and transfers
//! - Loan requests, staff approval and repayment
//! - The per-account transaction report
//!
//! # Atomicity Guarantees
//!
//! Every balance change runs inside a PostgreSQL transaction that locks the
//! affected `bank_accounts` rows with `FOR UPDATE` before reading the balance
//! it validates against. Transfers lock both rows in id order so concurrent
//! transfers in opposite directions cannot deadlock.

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        notification::Recipient,
        transaction::{ReportQuery, ReportResponse, Transaction, TransactionType},
        user::display_name,
    },
};

/// Smallest accepted deposit (100.00).
pub const MIN_DEPOSIT_CENTS: i64 = 10_000;

/// Smallest accepted withdrawal (500.00).
pub const MIN_WITHDRAW_CENTS: i64 = 50_000;

/// Largest accepted withdrawal (20000.00).
pub const MAX_WITHDRAW_CENTS: i64 = 2_000_000;

/// Ten digits with two decimal places.
pub const MAX_AMOUNT_CENTS: i64 = 9_999_999_999;

/// Approved, unpaid loans an account may hold at once.
pub const MAX_APPROVED_LOANS: i64 = 3;

/// A completed transfer and the customer who received the money.
#[derive(Debug)]
pub struct TransferOutcome {
    pub transaction: Transaction,
    pub recipient: Recipient,
}

/// Row for the transaction being inserted.
struct NewTransaction {
    account_id: Uuid,
    kind: TransactionType,
    amount_cents: i64,
    balance_after_cents: i64,
    loan_approved: bool,
    counterparty_account_number: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecipientRow {
    account_id: Uuid,
    user_id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
}

/// Execute a deposit (add money to the caller's account).
///
/// # Process
///
/// 1. Validate amount (at least `MIN_DEPOSIT_CENTS`)
/// 2. Start database transaction
/// 3. Update balance, stamping `initial_deposit_date` on the first deposit
/// 4. Record the transaction with the new balance
/// 5. Commit
///
/// # Errors
///
/// - `InvalidRequest`: amount out of range
/// - `AccountNotFound`: account doesn't exist
pub async fn deposit(
    pool: &DbPool,
    account_id: Uuid,
    amount_cents: i64,
) -> Result<Transaction, AppError> {
    validate_deposit_amount(amount_cents)?;

    let mut tx = pool.begin().await?;

    let balance_after: i64 = sqlx::query_scalar(
        r#"
        UPDATE bank_accounts
        SET balance_cents = balance_cents + $1,
            initial_deposit_date = COALESCE(initial_deposit_date, CURRENT_DATE),
            updated_at = NOW()
        WHERE id = $2
        RETURNING balance_cents
        "#,
    )
    .bind(amount_cents)
    .bind(account_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::AccountNotFound)?;

    let transaction = record_transaction(
        &mut tx,
        NewTransaction {
            account_id,
            kind: TransactionType::Deposit,
            amount_cents,
            balance_after_cents: balance_after,
            loan_approved: false,
            counterparty_account_number: None,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(%account_id, amount_cents, "deposit completed");

    Ok(transaction)
}

/// Execute a withdrawal (remove money from the caller's account).
///
/// # Errors
///
/// - `InvalidRequest`: amount outside the withdrawal limits, or larger than
///   the current balance
/// - `AccountNotFound`: account doesn't exist
pub async fn withdraw(
    pool: &DbPool,
    account_id: Uuid,
    amount_cents: i64,
) -> Result<Transaction, AppError> {
    validate_withdraw_amount(amount_cents)?;

    let mut tx = pool.begin().await?;

    let balance_cents = lock_balance(&mut tx, account_id).await?;

    if let Err(e) = check_withdraw_balance(amount_cents, balance_cents) {
        tx.rollback().await?;
        tracing::warn!(%account_id, amount_cents, balance_cents, "withdrawal rejected");
        return Err(e);
    }

    let balance_after = adjust_balance(&mut tx, account_id, -amount_cents).await?;

    let transaction = record_transaction(
        &mut tx,
        NewTransaction {
            account_id,
            kind: TransactionType::Withdraw,
            amount_cents,
            balance_after_cents: balance_after,
            loan_approved: false,
            counterparty_account_number: None,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(%account_id, amount_cents, "withdrawal completed");

    Ok(transaction)
}

/// Request a loan.
///
/// The loan is recorded as pending; the balance only changes once staff
/// approve it.
///
/// # Errors
///
/// - `InvalidRequest`: amount not positive or too large
/// - `LoanLimitReached`: the account already holds `MAX_APPROVED_LOANS`
///   approved loans
pub async fn request_loan(
    pool: &DbPool,
    account_id: Uuid,
    amount_cents: i64,
) -> Result<Transaction, AppError> {
    validate_amount(amount_cents)?;

    let mut tx = pool.begin().await?;

    // Locking the account serialises concurrent loan requests
    let balance_cents = lock_balance(&mut tx, account_id).await?;

    let approved_loans: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM transactions
        WHERE account_id = $1 AND transaction_type = 'loan' AND loan_approved
        "#,
    )
    .bind(account_id)
    .fetch_one(&mut *tx)
    .await?;

    if approved_loans >= MAX_APPROVED_LOANS {
        tx.rollback().await?;
        return Err(AppError::LoanLimitReached);
    }

    let transaction = record_transaction(
        &mut tx,
        NewTransaction {
            account_id,
            kind: TransactionType::Loan,
            amount_cents,
            balance_after_cents: balance_cents,
            loan_approved: false,
            counterparty_account_number: None,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(%account_id, amount_cents, loan_id = %transaction.id, "loan requested");

    Ok(transaction)
}

/// Approve a pending loan and credit the borrower.
///
/// # Errors
///
/// - `LoanNotFound`: no pending-or-approved loan with that id
/// - `InvalidRequest`: the loan was already approved
pub async fn approve_loan(pool: &DbPool, loan_id: Uuid) -> Result<Transaction, AppError> {
    let account_id: Uuid = sqlx::query_scalar(
        "SELECT account_id FROM transactions WHERE id = $1 AND transaction_type = 'loan'",
    )
    .bind(loan_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::LoanNotFound)?;

    let mut tx = pool.begin().await?;

    // Account first, then loan: same lock order as `pay_loan`
    lock_balance(&mut tx, account_id).await?;
    let loan = lock_loan(&mut tx, loan_id, account_id).await?;

    if loan.kind() != Some(TransactionType::Loan) {
        tx.rollback().await?;
        return Err(AppError::LoanNotFound);
    }

    if loan.loan_approved {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Loan is already approved".to_string(),
        ));
    }

    let balance_after = adjust_balance(&mut tx, account_id, loan.amount_cents).await?;

    let loan = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET loan_approved = true,
            balance_after_cents = $1
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(balance_after)
    .bind(loan_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%account_id, %loan_id, amount_cents = loan.amount_cents, "loan approved");

    Ok(loan)
}

/// Repay an approved loan in full from the caller's balance.
///
/// The loan row becomes `loan_paid` and snapshots the balance after
/// repayment.
///
/// # Errors
///
/// - `LoanNotFound`: the loan doesn't exist or belongs to someone else
/// - `InvalidRequest`: the loan was already paid, or the balance is too low
/// - `LoanNotApproved`: staff haven't approved the loan yet
pub async fn pay_loan(
    pool: &DbPool,
    account_id: Uuid,
    loan_id: Uuid,
) -> Result<Transaction, AppError> {
    let mut tx = pool.begin().await?;

    let balance_cents = lock_balance(&mut tx, account_id).await?;
    let loan = lock_loan(&mut tx, loan_id, account_id).await?;

    match loan.kind() {
        Some(TransactionType::Loan) => {}
        Some(TransactionType::LoanPaid) => {
            tx.rollback().await?;
            return Err(AppError::InvalidRequest(
                "Loan is already paid".to_string(),
            ));
        }
        _ => {
            tx.rollback().await?;
            return Err(AppError::LoanNotFound);
        }
    }

    if !loan.loan_approved {
        tx.rollback().await?;
        return Err(AppError::LoanNotApproved);
    }

    if balance_cents < loan.amount_cents {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Loan amount is greater than available balance".to_string(),
        ));
    }

    let balance_after = adjust_balance(&mut tx, account_id, -loan.amount_cents).await?;

    let loan = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET transaction_type = 'loan_paid',
            balance_after_cents = $1
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(balance_after)
    .bind(loan_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%account_id, %loan_id, amount_cents = loan.amount_cents, "loan paid");

    Ok(loan)
}

/// All loans (pending and approved, not yet paid) of an account, oldest first.
pub async fn list_loans(pool: &DbPool, account_id: Uuid) -> Result<Vec<Transaction>, AppError> {
    let loans = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT *
        FROM transactions
        WHERE account_id = $1 AND transaction_type = 'loan'
        ORDER BY created_at, id
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(loans)
}

/// Transaction history of an account plus its current balance.
///
/// Dates are inclusive and compared against the UTC calendar day of each
/// transaction.
///
/// # Errors
///
/// - `InvalidRequest`: `start_date` is after `end_date`
pub async fn report(
    pool: &DbPool,
    account_id: Uuid,
    query: ReportQuery,
) -> Result<ReportResponse, AppError> {
    validate_date_range(query.start_date, query.end_date)?;

    let balance_cents: i64 =
        sqlx::query_scalar("SELECT balance_cents FROM bank_accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::AccountNotFound)?;

    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT *
        FROM transactions
        WHERE account_id = $1
          AND ($2::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date >= $2)
          AND ($3::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date <= $3)
        ORDER BY created_at, id
        "#,
    )
    .bind(account_id)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(pool)
    .await?;

    Ok(ReportResponse {
        balance_cents,
        transactions: transactions.into_iter().map(Into::into).collect(),
    })
}

/// Transfer money to the account with the given public account number.
///
/// # Process
///
/// 1. Validate amount
/// 2. Look up the recipient by account number
/// 3. Lock sender and recipient rows (in id order)
/// 4. Check the sender's balance
/// 5. Move the money and record the transfer on the sender's account
/// 6. Commit both updates atomically
///
/// # Errors
///
/// - `InvalidRequest`: amount not positive, or recipient is the sender
/// - `AccountNotFound`: no account with that number ("Invalid Account No")
/// - `InsufficientBalance`: sender balance below amount; nothing changes
pub async fn transfer(
    pool: &DbPool,
    sender_account_id: Uuid,
    recipient_account_number: i64,
    amount_cents: i64,
) -> Result<TransferOutcome, AppError> {
    validate_amount(amount_cents)?;

    let mut tx = pool.begin().await?;

    let recipient = sqlx::query_as::<_, RecipientRow>(
        r#"
        SELECT a.id AS account_id,
               u.id AS user_id,
               u.username,
               u.email,
               u.first_name,
               u.last_name
        FROM bank_accounts a
        JOIN users u ON u.id = a.user_id
        WHERE a.account_number = $1
        "#,
    )
    .bind(recipient_account_number)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::AccountNotFound)?;

    if recipient.account_id == sender_account_id {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Cannot transfer to your own account".to_string(),
        ));
    }

    // Lock both rows in a stable order
    let locked: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT id, balance_cents FROM bank_accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(vec![sender_account_id, recipient.account_id])
    .fetch_all(&mut *tx)
    .await?;

    let sender_balance = locked
        .iter()
        .find(|(id, _)| *id == sender_account_id)
        .map(|(_, balance)| *balance)
        .ok_or(AppError::AccountNotFound)?;

    if sender_balance < amount_cents {
        tx.rollback().await?;
        tracing::warn!(
            %sender_account_id,
            amount_cents,
            sender_balance,
            "transfer rejected: insufficient balance"
        );
        return Err(AppError::InsufficientBalance);
    }

    let sender_balance_after = adjust_balance(&mut tx, sender_account_id, -amount_cents).await?;
    adjust_balance(&mut tx, recipient.account_id, amount_cents).await?;

    let transaction = record_transaction(
        &mut tx,
        NewTransaction {
            account_id: sender_account_id,
            kind: TransactionType::Transfer,
            amount_cents,
            balance_after_cents: sender_balance_after,
            loan_approved: false,
            counterparty_account_number: Some(recipient_account_number),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        %sender_account_id,
        recipient_account_number,
        amount_cents,
        "transfer completed"
    );

    Ok(TransferOutcome {
        transaction,
        recipient: Recipient {
            user_id: recipient.user_id,
            email: recipient.email,
            name: display_name(&recipient.first_name, &recipient.last_name, &recipient.username),
        },
    })
}

/// Lock an account row and return its balance.
async fn lock_balance(conn: &mut PgConnection, account_id: Uuid) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT balance_cents FROM bank_accounts WHERE id = $1 FOR UPDATE")
        .bind(account_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// Lock a loan row owned by `account_id`.
async fn lock_loan(
    conn: &mut PgConnection,
    loan_id: Uuid,
    account_id: Uuid,
) -> Result<Transaction, AppError> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE id = $1 AND account_id = $2 FOR UPDATE",
    )
    .bind(loan_id)
    .bind(account_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AppError::LoanNotFound)
}

/// Add `delta_cents` (may be negative) to a balance and return the new value.
async fn adjust_balance(
    conn: &mut PgConnection,
    account_id: Uuid,
    delta_cents: i64,
) -> Result<i64, AppError> {
    sqlx::query_scalar(
        r#"
        UPDATE bank_accounts
        SET balance_cents = balance_cents + $1,
            updated_at = NOW()
        WHERE id = $2
        RETURNING balance_cents
        "#,
    )
    .bind(delta_cents)
    .bind(account_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AppError::AccountNotFound)
}

async fn record_transaction(
    conn: &mut PgConnection,
    new: NewTransaction,
) -> Result<Transaction, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            account_id,
            amount_cents,
            balance_after_cents,
            transaction_type,
            loan_approved,
            counterparty_account_number
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new.account_id)
    .bind(new.amount_cents)
    .bind(new.balance_after_cents)
    .bind(new.kind.as_str())
    .bind(new.loan_approved)
    .bind(new.counterparty_account_number)
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}

/// Render cents as a plain decimal amount, e.g. `12345` -> `"123.45"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Any money amount: strictly positive and at most ten digits.
pub fn validate_amount(amount_cents: i64) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(AppError::InvalidRequest(format!(
            "Amount must not exceed {}",
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }

    Ok(())
}

pub fn validate_deposit_amount(amount_cents: i64) -> Result<(), AppError> {
    validate_amount(amount_cents)?;

    if amount_cents < MIN_DEPOSIT_CENTS {
        return Err(AppError::InvalidRequest(format!(
            "You need to deposit at least {} $",
            format_cents(MIN_DEPOSIT_CENTS)
        )));
    }

    Ok(())
}

pub fn validate_withdraw_amount(amount_cents: i64) -> Result<(), AppError> {
    validate_amount(amount_cents)?;

    if amount_cents < MIN_WITHDRAW_CENTS {
        return Err(AppError::InvalidRequest(format!(
            "You can withdraw at least {} $",
            format_cents(MIN_WITHDRAW_CENTS)
        )));
    }

    if amount_cents > MAX_WITHDRAW_CENTS {
        return Err(AppError::InvalidRequest(format!(
            "You can withdraw at most {} $",
            format_cents(MAX_WITHDRAW_CENTS)
        )));
    }

    Ok(())
}

pub fn check_withdraw_balance(amount_cents: i64, balance_cents: i64) -> Result<(), AppError> {
    if amount_cents > balance_cents {
        return Err(AppError::InvalidRequest(format!(
            "You have {} $ in your account. You can not withdraw more than your account balance",
            format_cents(balance_cents)
        )));
    }

    Ok(())
}

pub fn validate_date_range(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if start > end => Err(AppError::InvalidRequest(
            "start_date must not be after end_date".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sqlx::PgPool;

    #[test]
    fn format_cents_pads_fraction() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(12_345), "123.45");
        assert_eq!(format_cents(-150), "-1.50");
    }

    #[test]
    fn amount_must_be_positive() {
        let err = validate_amount(0).expect_err("zero rejected");
        assert_eq!(err.to_string(), "Amount must be greater than zero");
        assert!(validate_amount(-1).is_err());
        assert!(validate_amount(1).is_ok());
    }

    #[test]
    fn amount_is_bounded_to_ten_digits() {
        assert!(validate_amount(MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_amount(MAX_AMOUNT_CENTS + 1).is_err());
    }

    #[test]
    fn deposit_minimum() {
        let err = validate_deposit_amount(9_999).expect_err("below minimum");
        assert_eq!(err.to_string(), "You need to deposit at least 100.00 $");
        assert!(validate_deposit_amount(MIN_DEPOSIT_CENTS).is_ok());
    }

    #[test]
    fn withdraw_limits() {
        assert!(validate_withdraw_amount(MIN_WITHDRAW_CENTS - 1).is_err());
        assert!(validate_withdraw_amount(MIN_WITHDRAW_CENTS).is_ok());
        assert!(validate_withdraw_amount(MAX_WITHDRAW_CENTS).is_ok());
        assert!(validate_withdraw_amount(MAX_WITHDRAW_CENTS + 1).is_err());
    }

    #[test]
    fn withdraw_cannot_exceed_balance() {
        let err = check_withdraw_balance(60_000, 50_000).expect_err("over balance");
        assert_eq!(
            err.to_string(),
            "You have 500.00 $ in your account. You can not withdraw more than your account balance"
        );
        assert!(check_withdraw_balance(50_000, 50_000).is_ok());
    }

    #[test]
    fn date_range_order() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 1);
        let feb = NaiveDate::from_ymd_opt(2025, 2, 1);

        assert!(validate_date_range(jan, feb).is_ok());
        assert!(validate_date_range(jan, jan).is_ok());
        assert!(validate_date_range(None, feb).is_ok());
        assert!(validate_date_range(feb, jan).is_err());
    }

    /// Create a user with a bank account holding `balance_cents`.
    async fn open_account(pool: &PgPool, username: &str, balance_cents: i64) -> (Uuid, i64) {
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'unused') RETURNING id",
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .fetch_one(pool)
        .await
        .expect("insert user");

        sqlx::query_as(
            r#"
            INSERT INTO bank_accounts (user_id, account_type, balance_cents)
            VALUES ($1, 'savings', $2)
            RETURNING id, account_number
            "#,
        )
        .bind(user_id)
        .bind(balance_cents)
        .fetch_one(pool)
        .await
        .expect("insert account")
    }

    async fn balance(pool: &PgPool, account_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT balance_cents FROM bank_accounts WHERE id = $1")
            .bind(account_id)
            .fetch_one(pool)
            .await
            .expect("balance")
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn transfer_moves_money_between_accounts(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 50_000).await;
        let (bob, bob_number) = open_account(&pool, "bob", 1_000).await;

        let outcome = transfer(&pool, alice, bob_number, 20_000)
            .await
            .expect("transfer succeeds");

        assert_eq!(balance(&pool, alice).await, 30_000);
        assert_eq!(balance(&pool, bob).await, 21_000);
        assert_eq!(outcome.transaction.kind(), Some(TransactionType::Transfer));
        assert_eq!(outcome.transaction.balance_after_cents, 30_000);
        assert_eq!(
            outcome.transaction.counterparty_account_number,
            Some(bob_number)
        );
        assert_eq!(outcome.recipient.email, "bob@example.com");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn transfer_more_than_balance_leaves_both_balances_unchanged(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 5_000).await;
        let (bob, bob_number) = open_account(&pool, "bob", 1_000).await;

        let err = transfer(&pool, alice, bob_number, 5_001)
            .await
            .expect_err("insufficient balance");

        assert!(matches!(err, AppError::InsufficientBalance));
        assert_eq!(balance(&pool, alice).await, 5_000);
        assert_eq!(balance(&pool, bob).await, 1_000);

        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(recorded, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn transfer_to_unknown_account_number_fails(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 5_000).await;

        let err = transfer(&pool, alice, 999_999_999, 100)
            .await
            .expect_err("unknown recipient");

        assert!(matches!(err, AppError::AccountNotFound));
        assert_eq!(balance(&pool, alice).await, 5_000);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn transfer_to_own_account_is_rejected(pool: PgPool) {
        let (alice, alice_number) = open_account(&pool, "alice", 5_000).await;

        let err = transfer(&pool, alice, alice_number, 100)
            .await
            .expect_err("self transfer");

        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn deposit_then_withdraw_tracks_balance_snapshots(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 0).await;

        let deposit = deposit(&pool, alice, 100_000).await.expect("deposit");
        assert_eq!(deposit.balance_after_cents, 100_000);

        let initial: Option<NaiveDate> =
            sqlx::query_scalar("SELECT initial_deposit_date FROM bank_accounts WHERE id = $1")
                .bind(alice)
                .fetch_one(&pool)
                .await
                .expect("initial deposit date");
        assert!(initial.is_some());

        let withdrawal = withdraw(&pool, alice, 60_000).await.expect("withdraw");
        assert_eq!(withdrawal.balance_after_cents, 40_000);

        let err = withdraw(&pool, alice, 50_000)
            .await
            .expect_err("more than balance");
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(balance(&pool, alice).await, 40_000);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn loan_lifecycle(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 0).await;

        let loan = request_loan(&pool, alice, 30_000).await.expect("request");
        assert!(!loan.loan_approved);
        assert_eq!(balance(&pool, alice).await, 0);

        let err = pay_loan(&pool, alice, loan.id)
            .await
            .expect_err("not approved");
        assert!(matches!(err, AppError::LoanNotApproved));

        let approved = approve_loan(&pool, loan.id).await.expect("approve");
        assert!(approved.loan_approved);
        assert_eq!(approved.balance_after_cents, 30_000);
        assert_eq!(balance(&pool, alice).await, 30_000);

        assert!(matches!(
            approve_loan(&pool, loan.id).await,
            Err(AppError::InvalidRequest(_))
        ));

        let paid = pay_loan(&pool, alice, loan.id).await.expect("pay");
        assert_eq!(paid.kind(), Some(TransactionType::LoanPaid));
        assert_eq!(paid.balance_after_cents, 0);
        assert!(list_loans(&pool, alice).await.expect("list").is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn loan_payment_needs_enough_balance(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 0).await;
        let (bob, bob_number) = open_account(&pool, "bob", 0).await;

        let loan = request_loan(&pool, alice, 30_000).await.expect("request");
        approve_loan(&pool, loan.id).await.expect("approve");
        transfer(&pool, alice, bob_number, 10_000)
            .await
            .expect("spend some");

        let err = pay_loan(&pool, alice, loan.id).await.expect_err("too poor");
        assert_eq!(
            err.to_string(),
            "Loan amount is greater than available balance"
        );

        let err = pay_loan(&pool, bob, loan.id).await.expect_err("not bob's");
        assert!(matches!(err, AppError::LoanNotFound));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn loan_limit_counts_approved_loans(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 0).await;

        for _ in 0..MAX_APPROVED_LOANS {
            let loan = request_loan(&pool, alice, 10_000).await.expect("request");
            approve_loan(&pool, loan.id).await.expect("approve");
        }

        let err = request_loan(&pool, alice, 10_000)
            .await
            .expect_err("limit reached");
        assert!(matches!(err, AppError::LoanLimitReached));
        assert_eq!(list_loans(&pool, alice).await.expect("list").len(), 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn report_filters_by_inclusive_dates(pool: PgPool) {
        let (alice, _) = open_account(&pool, "alice", 70_000).await;

        for (day, amount) in [(1, 10_000_i64), (15, 20_000), (31, 40_000)] {
            sqlx::query(
                r#"
                INSERT INTO transactions
                    (account_id, amount_cents, balance_after_cents, transaction_type, created_at)
                VALUES ($1, $2, $2, 'deposit', $3)
                "#,
            )
            .bind(alice)
            .bind(amount)
            .bind(
                Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0)
                    .single()
                    .expect("valid timestamp"),
            )
            .execute(&pool)
            .await
            .expect("insert history");
        }

        let all = report(&pool, alice, ReportQuery::default())
            .await
            .expect("report");
        assert_eq!(all.balance_cents, 70_000);
        assert_eq!(all.transactions.len(), 3);
        assert_eq!(all.transactions[0].amount_cents, 10_000);

        let middle = report(
            &pool,
            alice,
            ReportQuery {
                start_date: NaiveDate::from_ymd_opt(2025, 1, 15),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            },
        )
        .await
        .expect("filtered report");
        let amounts: Vec<i64> = middle.transactions.iter().map(|t| t.amount_cents).collect();
        assert_eq!(amounts, vec![20_000, 40_000]);
    }
}

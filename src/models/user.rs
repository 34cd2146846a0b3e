//! User, address and bank account models plus the auth/profile request bodies.
//!
//! A registered user always owns exactly one bank account and one address;
//! `Profile` is the joined view of the three tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of bank account chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Current => "current",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Credentials row used by login and password change.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: Uuid,

    /// Argon2 PHC string, never serialized.
    pub password_hash: String,
}

/// Joined view of a user, their address and their bank account.
///
/// # Database Tables
///
/// Built from `users`, `user_addresses` and `bank_accounts`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,

    pub account_id: Uuid,

    /// Public account number other customers use to send money.
    pub account_number: i64,
    pub account_type: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,

    /// Current balance in cents.
    pub balance_cents: i64,

    /// Date of the first deposit, if any.
    pub initial_deposit_date: Option<NaiveDate>,

    pub street_address: String,
    pub city: String,
    pub postal_code: i32,
    pub country: String,

    pub created_at: DateTime<Utc>,
}

/// Full name, or the username when no name was given.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();

    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

/// Postal address supplied at registration and on profile update.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressRequest {
    pub street_address: String,
    pub city: String,
    pub postal_code: i32,
    pub country: String,
}

/// Request body for `POST /api/v1/auth/register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "first_name": "Alice",
///   "last_name": "Smith",
///   "password": "correct horse",
///   "account_type": "savings",
///   "gender": "female",
///   "birth_date": "1990-04-01",
///   "address": {
///     "street_address": "1 Main St",
///     "city": "Springfield",
///     "postal_code": 12345,
///     "country": "US"
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub account_type: AccountType,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub address: AddressRequest,
}

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /api/v1/auth/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Request body for `PUT /api/v1/profile`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: AddressRequest,
}

/// Returned by register and login.
///
/// The bearer `token` is only ever shown here; the server keeps its hash.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

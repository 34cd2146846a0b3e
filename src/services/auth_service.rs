//! Authentication service - registration, login sessions and passwords.
//!
//! Passwords are stored as argon2 PHC strings. Session tokens are 32 random
//! bytes handed to the client once; the database only keeps their SHA-256.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{
        AddressRequest, ChangePasswordRequest, LoginRequest, RegisterRequest, SessionResponse,
        UserCredentials,
    },
    services::account_service,
};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

/// Verified against when the username is unknown, so a missing user costs
/// the same argon2 work as a wrong password.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$jeHdaXeI3udLu37FBTU+VQ$madls9k3JM1RHL2I/5PrCtT13RwoLfO93cETgDyVLbU";

/// Register a new customer.
///
/// # Process
///
/// 1. Validate the request
/// 2. Hash the password
/// 3. In one database transaction: insert the user, address and bank
///    account (account number comes from `account_number_seq`), and open a
///    session
/// 4. Return the session token and the new profile
///
/// # Errors
///
/// - `InvalidRequest`: a field failed validation
/// - `UsernameTaken`: username already registered
pub async fn register(
    pool: &DbPool,
    request: RegisterRequest,
    session_ttl: Duration,
) -> Result<SessionResponse, AppError> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_address(&request.address)?;

    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(request.username.trim())
    .bind(request.email.trim())
    .bind(request.first_name.trim())
    .bind(request.last_name.trim())
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::UsernameTaken,
        other => AppError::Database(other),
    })?;

    sqlx::query(
        r#"
        INSERT INTO user_addresses (user_id, street_address, city, postal_code, country)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(request.address.street_address.trim())
    .bind(request.address.city.trim())
    .bind(request.address.postal_code)
    .bind(request.address.country.trim())
    .execute(&mut *tx)
    .await?;

    let account_number: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO bank_accounts (user_id, account_type, gender, birth_date)
        VALUES ($1, $2, $3, $4)
        RETURNING account_number
        "#,
    )
    .bind(user_id)
    .bind(request.account_type.as_str())
    .bind(request.gender.map(|g| g.as_str()))
    .bind(request.birth_date)
    .fetch_one(&mut *tx)
    .await?;

    let (token, expires_at) = create_session(&mut *tx, user_id, session_ttl).await?;

    tx.commit().await?;

    tracing::info!(%user_id, account_number, "user registered");

    let profile = account_service::get_profile(pool, user_id).await?;

    Ok(SessionResponse {
        token,
        expires_at,
        profile,
    })
}

/// Log a user in and open a new session.
///
/// Unknown usernames and wrong passwords produce the same
/// `InvalidCredentials` error.
pub async fn login(
    pool: &DbPool,
    request: LoginRequest,
    session_ttl: Duration,
) -> Result<SessionResponse, AppError> {
    let username = request.username.trim();

    let Some(credentials) = fetch_credentials_by_username(pool, username).await? else {
        verify_password(&request.password, DUMMY_PASSWORD_HASH)?;
        tracing::warn!(%username, "failed login");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&request.password, &credentials.password_hash)? {
        tracing::warn!(%username, "failed login");
        return Err(AppError::InvalidCredentials);
    }

    let mut conn = pool.acquire().await?;
    let (token, expires_at) = create_session(&mut *conn, credentials.id, session_ttl).await?;
    drop(conn);

    let profile = account_service::get_profile(pool, credentials.id).await?;

    Ok(SessionResponse {
        token,
        expires_at,
        profile,
    })
}

/// End the session that authenticated the request.
pub async fn logout(pool: &DbPool, auth: &AuthContext) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(auth.session_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Change the caller's password.
///
/// The current session stays valid; every other session of the user is
/// revoked.
///
/// # Errors
///
/// - `InvalidRequest`: old password wrong, new passwords differ or too short
pub async fn change_password(
    pool: &DbPool,
    auth: &AuthContext,
    request: ChangePasswordRequest,
) -> Result<(), AppError> {
    let credentials = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, password_hash
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !verify_password(&request.old_password, &credentials.password_hash)? {
        return Err(AppError::InvalidRequest(
            "Your old password was entered incorrectly. Please enter it again.".to_string(),
        ));
    }

    if request.new_password != request.new_password_confirm {
        return Err(AppError::InvalidRequest(
            "The two password fields didn't match.".to_string(),
        ));
    }

    validate_password(&request.new_password)?;

    let password_hash = hash_password(&request.new_password)?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&password_hash)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

    let revoked = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND id <> $2")
        .bind(auth.user_id)
        .bind(auth.session_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    tracing::info!(user_id = %auth.user_id, revoked, "password changed");

    Ok(())
}

async fn fetch_credentials_by_username(
    pool: &DbPool,
    username: &str,
) -> Result<Option<UserCredentials>, AppError> {
    let credentials = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, password_hash
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(credentials)
}

/// Insert a session row and return the plaintext token with its expiry.
///
/// Expired sessions of every user are purged first.
async fn create_session(
    conn: &mut PgConnection,
    user_id: Uuid,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), AppError> {
    let token = generate_token();
    let expires_at = Utc::now() + ttl;

    let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&mut *conn)
        .await?;

    Ok((token, expires_at))
}

/// SHA-256 of a session token, hex encoded (64 chars).
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// 32 random bytes, hex encoded (64 chars).
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a corrupt stored hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::PasswordHash(e.to_string())),
    }
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(AppError::InvalidRequest("Username is required".to_string()));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AppError::InvalidRequest(
            "Username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };

    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(
            "Enter a valid email address".to_string(),
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidRequest(
            "Password can't be entirely numeric".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_address(address: &AddressRequest) -> Result<(), AppError> {
    let required = [
        ("street_address", &address.street_address),
        ("city", &address.city),
        ("country", &address.country),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::InvalidRequest(format!("{field} is required")));
        }
    }

    if address.postal_code <= 0 {
        return Err(AppError::InvalidRequest(
            "postal_code must be positive".to_string(),
        ));
    }

    Ok(())
}

//! Account service - profile lookup and update.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{Profile, UpdateProfileRequest},
    services::auth_service::{validate_address, validate_email},
};

/// Fetch the joined user/address/bank-account view for a user.
pub async fn get_profile(pool: &DbPool, user_id: Uuid) -> Result<Profile, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT u.id AS user_id,
               u.username,
               u.email,
               u.first_name,
               u.last_name,
               u.is_staff,
               a.id AS account_id,
               a.account_number,
               a.account_type,
               a.gender,
               a.birth_date,
               a.balance_cents,
               a.initial_deposit_date,
               ad.street_address,
               ad.city,
               ad.postal_code,
               ad.country,
               u.created_at
        FROM users u
        JOIN bank_accounts a ON a.user_id = u.id
        JOIN user_addresses ad ON ad.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::AccountNotFound)?;

    Ok(profile)
}

/// Update name, email and address of a user.
///
/// Username, account number and account type are fixed at registration and
/// cannot be changed here.
pub async fn update_profile(
    pool: &DbPool,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> Result<Profile, AppError> {
    validate_email(&request.email)?;
    validate_address(&request.address)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = $1,
            last_name = $2,
            email = $3,
            updated_at = NOW()
        WHERE id = $4
        "#,
    )
    .bind(request.first_name.trim())
    .bind(request.last_name.trim())
    .bind(request.email.trim())
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO user_addresses (user_id, street_address, city, postal_code, country)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
        SET street_address = EXCLUDED.street_address,
            city = EXCLUDED.city,
            postal_code = EXCLUDED.postal_code,
            country = EXCLUDED.country
        "#,
    )
    .bind(user_id)
    .bind(request.address.street_address.trim())
    .bind(request.address.city.trim())
    .bind(request.address.postal_code)
    .bind(request.address.country.trim())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_profile(pool, user_id).await
}

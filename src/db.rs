//! Database connection pool and migration management.
//!
//! Holds the PostgreSQL pool shared by every handler and runs the schema
//! migrations for users, bank accounts, transactions, sessions and the email
//! audit log.

use std::time::Duration;

use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

/// PostgreSQL connection pool used throughout the service.
pub type DbPool = Pool<Postgres>;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 5;

/// How long a request waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new PostgreSQL connection pool.
///
/// Connections are created lazily as requests need them and kept alive for
/// reuse afterwards.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached with the given credentials.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    pool_options().connect(database_url).await
}

/// Create a pool that does not open any connection until first use.
///
/// Router tests use this for paths that are rejected before touching the
/// database.
#[cfg(test)]
pub fn create_lazy_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    pool_options().connect_lazy(database_url)
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Run database migrations from the `migrations/` directory.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each file runs
/// only once.
///
/// # Errors
///
/// Returns an error if a migration file is malformed or fails to apply.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

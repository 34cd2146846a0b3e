//! `GET /health` for load balancers and uptime checks.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::DbPool, error::AppError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub pool: PoolStats,
    pub timestamp: DateTime<Utc>,
}

/// Connection pool usage at the time of the check.
#[derive(Debug, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

/// Round-trips a `SELECT 1`; an unreachable database yields the usual 500
/// error body.
pub async fn health_check(State(pool): State<DbPool>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "connected",
        pool: PoolStats {
            size: pool.size(),
            idle: pool.num_idle(),
        },
        timestamp: Utc::now(),
    }))
}

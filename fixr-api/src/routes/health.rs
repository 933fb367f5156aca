/// Health check endpoint
///
/// Verifies that the server is running and that both backing stores answer.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "redis": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use fixr_shared::db::pool::health_check as database_health;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when every dependency answers, otherwise `degraded`
    pub status: String,

    pub version: String,

    pub database: String,

    pub redis: String,
}

impl HealthResponse {
    fn from_checks(database_ok: bool, redis_ok: bool) -> Self {
        let label = |ok: bool| if ok { "connected" } else { "disconnected" }.to_string();

        Self {
            status: if database_ok && redis_ok { "healthy" } else { "degraded" }.to_string(),
            version: fixr_shared::VERSION.to_string(),
            database: label(database_ok),
            redis: label(redis_ok),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_ok = match database_health(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let redis_ok = match state.redis.ping().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "Redis health check failed");
            false
        }
    };

    Ok(Json(HealthResponse::from_checks(database_ok, redis_ok)))
}

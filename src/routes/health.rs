use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::weather::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when the store is unreachable)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the store answered the liveness probe
    pub database: bool,
}

/// Store connectivity check result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
}

/// Health check endpoint.
///
/// Returns status "degraded" (still 200) if the store is unreachable, so load
/// balancers can distinguish partial failures.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.weather.test_connection().await;

    Json(HealthResponse {
        status: if db_ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_ok,
    })
}

/// Test the ClickHouse connection.
#[utoipa::path(
    get,
    path = "/api/v1/weather/test-connection",
    tag = "Weather",
    responses(
        (status = 200, description = "Connection test result", body = ConnectionStatus),
    )
)]
pub async fn test_connection(State(state): State<AppState>) -> Json<ConnectionStatus> {
    let connected = state.weather.test_connection().await;

    Json(ConnectionStatus {
        success: connected,
        message: if connected {
            "ClickHouse connection successful".to_string()
        } else {
            "ClickHouse connection failed".to_string()
        },
    })
}

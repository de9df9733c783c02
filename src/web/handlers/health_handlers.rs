use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::web::router::AppState;

/// Liveness probe: the process is up
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: 503 until the database answers
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match &state.database {
        Some(database) => match database.health_check().await {
            Ok(health) => json!({ "status": "ok", "response_time_ms": health.response_time_ms }),
            Err(e) => json!({ "status": "unavailable", "error": e.to_string() }),
        },
        None => json!({ "status": "not_configured" }),
    };

    let ready = database["status"] != "unavailable";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "checks": { "database": database },
        })),
    )
}

/// Service summary
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.metrics.uptime_seconds(),
    }))
}

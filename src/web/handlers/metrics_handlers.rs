use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::web::router::AppState;

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.metrics.gather(),
    )
}

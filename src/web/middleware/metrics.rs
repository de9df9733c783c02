use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::web::router::AppState;

/// Track in-flight requests, request counts by method and status, and latency
pub async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    state.metrics.record_request(
        &method,
        response.status().as_u16(),
        start_time.elapsed().as_secs_f64(),
    );

    response
}

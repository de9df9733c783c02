use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::services::AuthError;
use crate::web::middleware::CorrelationId;
use crate::web::responses::ApiError;
use crate::web::router::AppState;

/// Requires a valid Bearer token; the resolved `CurrentUser` is added to the
/// request extensions. Rejects with a 401 envelope before the handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let Some(token) = extract_bearer_token(request.headers()) else {
        tracing::warn!(%correlation_id, "Missing or malformed authorization header");
        return Err(ApiError::InvalidToken);
    };

    let current_user = match state.auth_service.validate_token(token).await {
        Ok(user) => user,
        Err(AuthError::TokenExpired) => {
            tracing::warn!(%correlation_id, "Expired token provided");
            return Err(ApiError::InvalidToken);
        }
        Err(err) => {
            tracing::warn!(%correlation_id, error = %err, "Token rejected");
            return Err(err.into());
        }
    };

    tracing::debug!(%correlation_id, user_id = current_user.id, "Request authenticated");
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

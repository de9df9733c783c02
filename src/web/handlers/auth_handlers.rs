use axum::{extract::State, response::Json};

use crate::metrics::LoginOutcome;
use crate::models::{AuthResult, LoginRequest, ResultEnvelope};
use crate::services::AuthError;
use crate::web::extractors::ValidatedJson;
use crate::web::responses::ApiError;
use crate::web::router::AppState;

pub const LOGIN_SUCCESS_MESSAGE: &str = "User authenticated successfully!";

/// Exchange an email for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ResultEnvelope<AuthResult>>, ApiError> {
    match state.auth_service.login(request).await {
        Ok(result) => {
            state.metrics.record_login(LoginOutcome::Success);
            Ok(Json(ResultEnvelope::ok(LOGIN_SUCCESS_MESSAGE, result)))
        }
        Err(err) => {
            let outcome = match err {
                AuthError::Internal(_) => LoginOutcome::Error,
                _ => LoginOutcome::Rejected,
            };
            state.metrics.record_login(outcome);
            Err(err.into())
        }
    }
}

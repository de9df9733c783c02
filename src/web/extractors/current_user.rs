use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::models::CurrentUser;
use crate::web::responses::ApiError;

/// Extractor for the user resolved by the auth middleware
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::InvalidToken)
    }
}

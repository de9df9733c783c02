use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::web::responses::ApiError;

pub const MALFORMED_QUERY_MESSAGE: &str = "The query string could not be read.";

/// Query string parameters; an unreadable query rejects with a 400 envelope
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::DomainValidation {
                message: MALFORMED_QUERY_MESSAGE.to_string(),
                errors: vec![e.body_text()],
            })?;

        Ok(QueryParams(params))
    }
}

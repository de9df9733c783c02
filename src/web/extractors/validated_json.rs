use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Json, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::services::INVALID_FIELDS_MESSAGE;
use crate::utils::validation_messages;
use crate::web::responses::ApiError;

pub const MALFORMED_BODY_MESSAGE: &str = "The request body could not be read.";

/// JSON body that has passed its `Validate` rules.
///
/// Malformed JSON and rule violations both reject with a 400 envelope, so
/// handlers only ever see well-formed input.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(malformed_body)?;

        data.validate().map_err(|e| ApiError::DomainValidation {
            message: INVALID_FIELDS_MESSAGE.to_string(),
            errors: validation_messages(&e),
        })?;

        Ok(ValidatedJson(data))
    }
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    ApiError::DomainValidation {
        message: MALFORMED_BODY_MESSAGE.to_string(),
        errors: vec![rejection.body_text()],
    }
}

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::models::UserId;
use crate::web::responses::ApiError;

/// Integer user id taken from the path; non-numeric ids reject with a 400 envelope
pub struct IdPath(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::DomainValidation {
                message: "The user id is missing.".to_string(),
                errors: vec![e.body_text()],
            })?;

        raw.parse::<UserId>()
            .map(IdPath)
            .map_err(|_| ApiError::DomainValidation {
                message: format!("'{}' is not a valid user id.", raw),
                errors: Vec::new(),
            })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserView;

/// Body of `POST /api/v1/auth/login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "The login cannot be empty."))]
    pub login: String,

    #[validate(length(min = 1, message = "The email cannot be empty."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password cannot be empty."))]
    pub password: String,
}

/// Payload returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub user: UserView,
    pub token: String,
    pub token_expiry: DateTime<Utc>,
}

/// A freshly issued bearer token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Current user context, resolved from a validated bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: crate::models::UserId,
    pub email: String,
}

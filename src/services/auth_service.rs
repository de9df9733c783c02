use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::models::{AuthResult, CurrentUser, LoginRequest};
use crate::services::{ServiceError, TokenError, TokenGenerator, UserService};

/// Authentication service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<AuthResult, AuthError>;
    async fn validate_token(&self, token: &str) -> Result<CurrentUser, AuthError>;
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AuthError {
    fn from(err: ServiceError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Authentication service implementation
pub struct AuthServiceImpl {
    user_service: Arc<dyn UserService>,
    tokens: Arc<dyn TokenGenerator>,
    verify_password: bool,
}

impl AuthServiceImpl {
    pub fn new(
        user_service: Arc<dyn UserService>,
        tokens: Arc<dyn TokenGenerator>,
        verify_password: bool,
    ) -> Self {
        if !verify_password {
            warn!("Password verification on login is disabled (auth.verify_password = false)");
        }

        Self {
            user_service,
            tokens,
            verify_password,
        }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: LoginRequest) -> Result<AuthResult, AuthError> {
        let user = self
            .user_service
            .get_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.email.to_lowercase() != request.email.to_lowercase() {
            debug!("Email mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if self.verify_password
            && !self
                .user_service
                .verify_password(user.id, &request.password)
                .await?
        {
            debug!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self
            .tokens
            .generate_token(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        info!("User {} authenticated", user.id);
        Ok(AuthResult {
            user,
            token: issued.token,
            token_expiry: issued.expires_at,
        })
    }

    async fn validate_token(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.tokens.validate_token(token).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        Ok(CurrentUser {
            id,
            email: claims.email,
        })
    }
}

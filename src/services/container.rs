use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::repository::{SqlxUserRepository, UserRepository};
use crate::services::{
    AuthService, AuthServiceImpl, JwtTokenGenerator, TokenGenerator, UserService, UserServiceImpl,
};

/// Service container for dependency injection
///
/// Wires the repository, user, token and authentication services together
/// so the web layer only ever sees the trait objects.
#[derive(Clone)]
pub struct ServiceContainer {
    user_service: Arc<dyn UserService>,
    auth_service: Arc<dyn AuthService>,
}

impl ServiceContainer {
    /// Create a container backed by PostgreSQL
    pub fn new(db_pool: PgPool, config: &AppConfig) -> Self {
        let user_repository = Arc::new(SqlxUserRepository::new(db_pool));
        Self::with_repository(user_repository, config)
    }

    /// Create a container over any repository implementation
    pub fn with_repository(user_repository: Arc<dyn UserRepository>, config: &AppConfig) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(user_repository));
        let tokens: Arc<dyn TokenGenerator> = Arc::new(JwtTokenGenerator::new(&config.jwt));
        let auth_service = Arc::new(AuthServiceImpl::new(
            user_service.clone(),
            tokens,
            config.auth.verify_password,
        ));

        Self {
            user_service,
            auth_service,
        }
    }

    /// Get user service instance
    pub fn user_service(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    /// Get authentication service instance
    pub fn auth_service(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }
}

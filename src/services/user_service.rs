use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

use crate::models::{NewUser, UserChanges, UserDto, UserId, UserView};
use crate::repository::{RepositoryError, UserRepository};
use crate::utils::{hash_password, validation_messages, verify_password, PasswordHashError};

pub const INVALID_FIELDS_MESSAGE: &str =
    "Some fields are invalid, please correct the errors below.";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "A user with the given email already exists.";
pub const UNKNOWN_USER_MESSAGE: &str = "No user exists with the given id!";

/// Business-rule violation raised by the service layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DomainValidationError {
    pub message: String,
    pub errors: Vec<String>,
}

impl DomainValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }
}

/// Service error types
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Domain(#[from] DomainValidationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
}

/// User service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, dto: UserDto) -> Result<UserView, ServiceError>;
    async fn update(&self, dto: UserDto) -> Result<UserView, ServiceError>;
    async fn remove(&self, id: UserId) -> Result<(), ServiceError>;
    async fn get(&self, id: UserId) -> Result<Option<UserView>, ServiceError>;
    async fn get_all(&self) -> Result<Vec<UserView>, ServiceError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<UserView>, ServiceError>;
    async fn search_by_name(&self, name: &str) -> Result<Vec<UserView>, ServiceError>;
    async fn search_by_email(&self, email: &str) -> Result<Vec<UserView>, ServiceError>;

    /// Check `password` against the stored hash of user `id`; unknown users never match
    async fn verify_password(&self, id: UserId, password: &str) -> Result<bool, ServiceError>;
}

/// User service implementation
pub struct UserServiceImpl {
    repository: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

fn validate_dto(dto: &UserDto) -> Result<(), DomainValidationError> {
    dto.validate().map_err(|errors| {
        DomainValidationError::with_errors(INVALID_FIELDS_MESSAGE, validation_messages(&errors))
    })
}

fn views(users: Vec<crate::models::User>) -> Vec<UserView> {
    users.into_iter().map(UserView::from).collect()
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create(&self, dto: UserDto) -> Result<UserView, ServiceError> {
        validate_dto(&dto)?;

        if self.repository.email_exists(&dto.email, None).await? {
            return Err(DomainValidationError::new(DUPLICATE_EMAIL_MESSAGE).into());
        }

        let new_user = NewUser {
            name: dto.name,
            email: dto.email,
            password_hash: hash_password(&dto.password)?,
        };

        match self.repository.create(&new_user).await {
            Ok(user) => Ok(user.into()),
            Err(RepositoryError::DuplicateEmail(_)) => {
                Err(DomainValidationError::new(DUPLICATE_EMAIL_MESSAGE).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, dto: UserDto) -> Result<UserView, ServiceError> {
        validate_dto(&dto)?;

        let id = dto
            .id
            .ok_or_else(|| DomainValidationError::new(UNKNOWN_USER_MESSAGE))?;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(DomainValidationError::new(UNKNOWN_USER_MESSAGE).into());
        }

        if self.repository.email_exists(&dto.email, Some(id)).await? {
            return Err(DomainValidationError::new(DUPLICATE_EMAIL_MESSAGE).into());
        }

        let changes = UserChanges {
            name: dto.name,
            email: dto.email,
            password_hash: hash_password(&dto.password)?,
        };

        match self.repository.update(id, &changes).await {
            Ok(user) => Ok(user.into()),
            Err(RepositoryError::NotFound) => {
                Err(DomainValidationError::new(UNKNOWN_USER_MESSAGE).into())
            }
            Err(RepositoryError::DuplicateEmail(_)) => {
                Err(DomainValidationError::new(DUPLICATE_EMAIL_MESSAGE).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, id: UserId) -> Result<(), ServiceError> {
        match self.repository.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => {
                Err(DomainValidationError::new(UNKNOWN_USER_MESSAGE).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: UserId) -> Result<Option<UserView>, ServiceError> {
        Ok(self.repository.find_by_id(id).await?.map(UserView::from))
    }

    async fn get_all(&self) -> Result<Vec<UserView>, ServiceError> {
        Ok(views(self.repository.list().await?))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserView>, ServiceError> {
        Ok(self.repository.find_by_email(email).await?.map(UserView::from))
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<UserView>, ServiceError> {
        Ok(views(self.repository.search_by_name(name).await?))
    }

    async fn search_by_email(&self, email: &str) -> Result<Vec<UserView>, ServiceError> {
        Ok(views(self.repository.search_by_email(email).await?))
    }

    async fn verify_password(&self, id: UserId, password: &str) -> Result<bool, ServiceError> {
        match self.repository.find_by_id(id).await? {
            Some(user) => Ok(verify_password(password, &user.password_hash)?),
            None => Ok(false),
        }
    }
}

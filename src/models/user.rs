use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::UserId;

/// User row as stored in the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public representation of a user. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Body of `POST /api/v1/users/create`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserViewModel {
    #[validate(length(min = 1, message = "The name cannot be empty."))]
    pub name: String,

    #[validate(length(min = 1, message = "The email cannot be empty."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password cannot be empty."))]
    pub password: String,
}

/// Body of `PUT /api/v1/users/update`
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserViewModel {
    #[validate(range(min = 1, message = "The id must be a positive number."))]
    pub id: UserId,

    #[validate(length(min = 1, message = "The name cannot be empty."))]
    pub name: String,

    #[validate(length(min = 1, message = "The email cannot be empty."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password cannot be empty."))]
    pub password: String,
}

/// Boundary object handed to the user service for create/update.
///
/// The domain rules live here; the service validates every DTO before it
/// touches storage.
#[derive(Debug, Clone, Validate)]
pub struct UserDto {
    pub id: Option<UserId>,

    #[validate(length(
        min = 3,
        max = 80,
        message = "The name must be between 3 and 80 characters."
    ))]
    pub name: String,

    #[validate(
        email(message = "The email provided is not valid."),
        length(max = 180, message = "The email must have at most 180 characters.")
    )]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 30,
        message = "The password must be between 6 and 30 characters."
    ))]
    pub password: String,
}

impl From<CreateUserViewModel> for UserDto {
    fn from(view: CreateUserViewModel) -> Self {
        Self {
            id: None,
            name: view.name,
            email: view.email,
            password: view.password,
        }
    }
}

impl From<UpdateUserViewModel> for UserDto {
    fn from(view: UpdateUserViewModel) -> Self {
        Self {
            id: Some(view.id),
            name: view.name,
            email: view.email,
            password: view.password,
        }
    }
}

/// User for database insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Full replacement of a user's mutable fields
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

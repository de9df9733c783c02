use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::models::{NewUser, User, UserChanges, UserId};

/// Unique index over `LOWER(email)`, see `migrations/`
const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Repository error types
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found")]
    NotFound,

    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),
}

/// Data access for the `users` table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find user by email, ignoring case
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Replace the mutable fields of an existing user
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError>;

    /// Hard delete user
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;

    /// Every user, ordered by id
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Users whose name contains `name`, ignoring case
    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, RepositoryError>;

    /// Users whose email contains `email`, ignoring case
    async fn search_by_email(&self, email: &str) -> Result<Vec<User>, RepositoryError>;

    /// Check if the email is taken by a user other than `exclude`
    async fn email_exists(
        &self,
        email: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, RepositoryError>;
}

/// SQLx implementation of UserRepository
pub struct SqlxUserRepository {
    pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-index violation on email to `DuplicateEmail`
fn map_write_error(err: sqlx::Error, email: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(EMAIL_UNIQUE_INDEX) {
            return RepositoryError::DuplicateEmail(email.to_string());
        }
    }
    RepositoryError::Database(err)
}

/// Build an `ILIKE` substring pattern, escaping the wildcard characters of `term`
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        info!("Creating new user with email: {}", user.email);

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!("Failed to create user: {}", e);
            map_write_error(e, &user.email)
        })?;

        info!("Successfully created user with ID: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match &user {
            Some(u) => info!("Found user with ID: {} ({})", id, u.email),
            None => info!("User not found with ID: {}", id),
        }

        Ok(user)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match &user {
            Some(u) => info!("Found user with email: {} (ID: {})", email, u.id),
            None => info!("User not found with email: {}", email),
        }

        Ok(user)
    }

    #[instrument(skip(self, changes), fields(user_id = %id))]
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        info!("Updating user with ID: {}", id);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!("Failed to update user: {}", e);
            map_write_error(e, &changes.email)
        })?
        .ok_or(RepositoryError::NotFound)?;

        info!("Successfully updated user with ID: {}", id);
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        info!("Deleting user with ID: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Successfully deleted user with ID: {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        info!("Retrieved {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(name = %name))]
    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name ILIKE $1 ESCAPE '\\' ORDER BY id"
        ))
        .bind(contains_pattern(name))
        .fetch_all(&self.pool)
        .await?;

        info!("Name search '{}' matched {} users", name, users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn search_by_email(&self, email: &str) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email ILIKE $1 ESCAPE '\\' ORDER BY id"
        ))
        .bind(contains_pattern(email))
        .fetch_all(&self.pool)
        .await?;

        info!("Email search '{}' matched {} users", email, users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn email_exists(
        &self,
        email: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        info!("Email {} exists (excluding {:?}): {}", email, exclude, exists.0);
        Ok(exists.0)
    }
}

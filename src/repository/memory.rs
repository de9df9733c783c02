//! In-memory `UserRepository` used by the HTTP-level tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use super::{RepositoryError, UserRepository};
use crate::models::{NewUser, User, UserChanges, UserId};

#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: UserId,
    users: Vec<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepositoryError::DuplicateEmail(user.email.clone()));
        }

        state.next_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;

        user.name = changes.name.clone();
        user.email = changes.email.clone();
        user.password_hash = changes.password_hash.clone();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| contains_ignore_case(&u.name, name))
            .cloned()
            .collect())
    }

    async fn search_by_email(&self, email: &str) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| contains_ignore_case(&u.email, email))
            .cloned()
            .collect())
    }

    async fn email_exists(
        &self,
        email: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != exclude))
    }
}

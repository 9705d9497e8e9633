//! Mock user directory for testing

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use warden_store::{DirectoryUser, StoreResult, UserDirectory};
use warden_types::UserId;

/// In-memory user directory for testing
#[derive(Default, Clone)]
pub struct MockUserDirectory {
    users: Arc<DashMap<UserId, DirectoryUser>>,
    by_email: Arc<DashMap<String, UserId>>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly
    pub fn insert_user(&self, user: DirectoryUser) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Create an active user with the given email and password
    pub fn create_user(&self, email: &str, password: &str) -> UserId {
        let user = DirectoryUser {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: hash_password(password),
            active: true,
            role: "user".to_string(),
        };
        let id = user.id;
        self.insert_user(user);
        id
    }

    /// Flip a user's active flag
    pub fn set_active(&self, id: UserId, active: bool) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.active = active;
        }
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|u| u.value().clone())))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<DirectoryUser>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }
}

/// Argon2id hash in PHC format
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

//! User directory capability
//!
//! The directory is an external collaborator: this subsystem only reads
//! from it. User CRUD and password-hash creation live elsewhere.

use async_trait::async_trait;

use warden_types::UserId;

use crate::error::StoreResult;

/// User entry as the directory exposes it to authentication
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: UserId,
    pub email: String,
    /// PHC-formatted password hash
    pub password_hash: String,
    /// Disabled accounts authenticate but are refused with Forbidden
    pub active: bool,
    pub role: String,
}

/// User directory lookup interface
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by credential identifier (email)
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<DirectoryUser>>;
}

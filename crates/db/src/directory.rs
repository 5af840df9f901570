//! User directory of the authentication provider: account lookup and
//! privilege changes.

use std::collections::HashMap;

use async_trait::async_trait;
use hackpsu_core::roles::AuthLevel;
use hackpsu_core::types::Uid;
use tokio::sync::RwLock;

use crate::models::admin::DirectoryUser;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("no user matches {0}")]
    NotFound(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    pub fn status(&self) -> u16 {
        match self {
            DirectoryError::NotFound(_) => 404,
            DirectoryError::Unavailable(_) => 500,
        }
    }
}

#[async_trait]
pub trait AuthDirectory: Send + Sync {
    /// Find an account by uid or email address.
    async fn lookup(&self, identifier: &str) -> Result<DirectoryUser, DirectoryError>;

    /// Replace the account's privilege claim.
    async fn elevate(&self, uid: &str, level: AuthLevel) -> Result<(), DirectoryError>;
}

/// In-process directory.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<Uid, DirectoryUser>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: DirectoryUser) {
        self.users.write().await.insert(user.uid.clone(), user);
    }
}

#[async_trait]
impl AuthDirectory for MemoryDirectory {
    async fn lookup(&self, identifier: &str) -> Result<DirectoryUser, DirectoryError> {
        let users = self.users.read().await;
        users
            .get(identifier)
            .or_else(|| users.values().find(|user| user.email.as_deref() == Some(identifier)))
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(identifier.to_string()))
    }

    async fn elevate(&self, uid: &str, level: AuthLevel) -> Result<(), DirectoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| DirectoryError::NotFound(uid.to_string()))?;
        user.privilege = Some(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> DirectoryUser {
        DirectoryUser {
            uid: "u1".into(),
            email: Some("u1@psu.edu".into()),
            privilege: Some(AuthLevel::Volunteer),
        }
    }

    #[tokio::test]
    async fn looks_up_by_uid_or_email() {
        let directory = MemoryDirectory::new();
        directory.insert(user()).await;
        assert_eq!(directory.lookup("u1").await.unwrap().uid, "u1");
        assert_eq!(directory.lookup("u1@psu.edu").await.unwrap().uid, "u1");
        assert_eq!(directory.lookup("nobody").await.unwrap_err().status(), 404);
    }

    #[tokio::test]
    async fn elevate_replaces_the_claim() {
        let directory = MemoryDirectory::new();
        directory.insert(user()).await;
        directory.elevate("u1", AuthLevel::Director).await.unwrap();
        assert_eq!(
            directory.lookup("u1").await.unwrap().privilege,
            Some(AuthLevel::Director)
        );
    }
}

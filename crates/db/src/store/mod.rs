//! The seam between the unit of work and a concrete SQL backend.

use async_trait::async_trait;

use crate::query::ParamQuery;
use crate::Record;

pub mod mock;
pub mod mysql;

pub use mock::MockStore;
pub use mysql::MySqlStore;

/// Errors surfaced by a store. MySQL server errors carry their numeric
/// error code.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error {code}: {message}")]
    Database { code: u16, message: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error(transparent)]
    Driver(sqlx::Error),
}

impl StoreError {
    /// The server error code, if this is a server-side error.
    pub fn code(&self) -> Option<u16> {
        match self {
            StoreError::Database { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A backend that can open transactions on a pooled connection.
#[async_trait]
pub trait SqlStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}

/// An open transaction holding one pooled connection. Committing or
/// rolling back consumes it and returns the connection to the pool.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Execute one statement and return its rows (empty for writes).
    async fn query(&mut self, query: &ParamQuery) -> Result<Vec<Record>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

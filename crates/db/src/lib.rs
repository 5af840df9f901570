//! Data-access layer: query building, the unit of work that executes
//! statements against MySQL, entity models and one data mapper per entity
//! family.

use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;

pub mod cache;
pub mod directory;
pub mod entity;
pub mod error;
pub mod live;
pub mod mapper;
pub mod mappers;
pub mod models;
pub mod opts;
pub mod query;
pub mod response;
pub mod store;
pub mod uow;

pub use error::DbError;
pub use response::{DbResponse, DbResult, Listing};

/// A row as returned by the store, and an entity's storage projection.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub type DbPool = sqlx::MySqlPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

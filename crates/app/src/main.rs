use std::sync::Arc;

use anyhow::Context;
use hackpsu_core::acl::Rbac;
use hackpsu_db::cache::MemCache;
use hackpsu_db::directory::MemoryDirectory;
use hackpsu_db::live::MemoryLiveStore;
use hackpsu_db::mappers::DataMappers;
use hackpsu_db::store::MySqlStore;
use hackpsu_db::uow::MysqlUow;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::{AppConfig, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hackpsu_app=debug,hackpsu_db=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let pool = hackpsu_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(max_connections = config.max_connections, "Database connection pool created");

    hackpsu_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    let cache = Arc::new(MemCache::new(config.cache_capacity));
    cache.set_enabled(config.cache_enabled);
    let sql = Arc::new(MysqlUow::new(Arc::new(MySqlStore::new(pool)), cache));

    let mappers = DataMappers::new(
        Arc::new(Rbac::new()),
        sql,
        Arc::new(MemoryDirectory::new()),
        Arc::new(MemoryLiveStore::new()),
    );
    tracing::debug!(acl = %mappers.acl.debug_information(), "Access control registered");

    match mappers.hackathons.active_hackathon().await {
        Ok(active) => tracing::info!(uid = %active.uid, name = %active.name, "Active hackathon"),
        Err(err) => tracing::warn!(error = %err, "No active hackathon resolved"),
    }

    Ok(())
}

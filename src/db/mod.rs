use sqlx::postgres::{PgPool, PgPoolOptions};
use crate::config::DatabaseConfig;
use anyhow::Result;
use tracing::info;

pub use executor::*;
pub use guard::*;
pub use pool::*;
pub use schema::*;

pub mod executor;
pub mod guard;
pub mod pool;
pub mod schema;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;

    // Test connection
    health_check(&pool).await?;
    info!(max_connections = config.max_connections, "Database pool ready");

    Ok(pool)
}

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// Creates the PostgreSQL connection pool shared by handlers and jobs.
/// Pool sizing comes from config so deployments can tune it per instance.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    info!(
        max_connections = config.db_max_connections,
        "Connecting to PostgreSQL..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    info!("CreatorPulse database pool established");
    Ok(pool)
}

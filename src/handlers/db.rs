use crate::config::Config;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::time::Duration;

pub async fn connect_pool(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
}

pub async fn check_db_connection(pool: &MySqlPool) -> bool {
    match pool.acquire().await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Database connection check failed: {}", e);
            false
        }
    }
}

use redis::aio::ConnectionManager;
use tracing::info;

use crate::retry::{retry_with_backoff, RetryConfig};
use core_config::redis::RedisConfig;

/// Error type for Redis connection setup
#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Connect to Redis and return a [`ConnectionManager`].
///
/// The connection manager transparently reconnects on broken connections,
/// which the event stream consumer relies on.
pub async fn connect(url: &str) -> Result<ConnectionManager, RedisError> {
    info!("Attempting to connect to Redis");

    let client = redis::Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect using a [`RedisConfig`].
pub async fn connect_from_config(config: &RedisConfig) -> Result<ConnectionManager, RedisError> {
    connect(&config.url).await
}

/// Connect from config with automatic retry on failure.
pub async fn connect_from_config_with_retry(
    config: &RedisConfig,
    retry_config: Option<RetryConfig>,
) -> Result<ConnectionManager, RedisError> {
    retry_with_backoff(
        || connect(&config.url),
        retry_config.unwrap_or_default(),
    )
    .await
}

//! Redis connection setup for the delivery queues.

use anyhow::Context;
use redis::Client;
use redis::aio::ConnectionManager;

/// Build the shared connection manager the queue backend clones per call.
/// It reconnects on its own, so a Redis blip degrades a drain pass instead
/// of killing the daemon.
pub async fn create_redis_pool(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url).context("parsing Redis URL")?;
    let manager = ConnectionManager::new(client)
        .await
        .context("connecting to Redis")?;

    tracing::info!("Redis queue backend ready");
    Ok(manager)
}

//! Postgres pool setup, shared by the one-shot engine binary and the
//! notifier daemon.

use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Build the connection pool backing the record and dedupe stores.
///
/// The engine holds connections only for the duration of one catalog scan;
/// the notifier daemon keeps the pool for its lifetime, so `max_connections`
/// (`DB_MAX_CONNECTIONS`) is sized for the daemon's per-queue workers.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("connecting to PostgreSQL")?;

    tracing::info!(max_connections, "PostgreSQL pool ready");
    Ok(pool)
}

use std::sync::Arc;

use tenure_common::clock::SystemClock;
use tenure_common::config::AppConfig;
use tenure_common::queue::RedisQueue;
use tenure_common::store::{PgDedupeStore, PgRecordStore};
use tenure_common::{db, redis_pool};
use tenure_engine::evaluator::RuleEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenure_engine=info,tenure_common=info".into()),
        )
        .json()
        .init();

    tracing::info!("Tenure milestone scheduler starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Connect to Redis
    let redis = redis_pool::create_redis_pool(&config.redis_url).await?;

    let engine = RuleEngine::new(
        Arc::new(PgRecordStore::new(pool.clone())),
        Arc::new(PgDedupeStore::new(pool)),
        Arc::new(RedisQueue::new(redis)),
        Arc::new(SystemClock),
        config.digest_recipient.clone(),
        config.confirm_url.clone(),
    );

    // One full catalog scan per invocation; the external trigger cadence
    // (cron or similar) decides how often this binary runs.
    engine.run().await;

    tracing::info!("Milestone scan complete.");
    Ok(())
}

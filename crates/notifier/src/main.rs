use std::sync::Arc;
use std::time::Duration;

use tenure_common::config::AppConfig;
use tenure_common::queue::RedisQueue;
use tenure_common::store::{PgDedupeStore, PgRecordStore};
use tenure_common::types::ALL_QUEUES;
use tenure_common::{db, redis_pool};
use tenure_notifier::transport::ResendMailer;
use tenure_notifier::worker::Worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenure_notifier=info,tenure_common=info".into()),
        )
        .json()
        .init();

    tracing::info!("Tenure notifier starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Connect to Redis
    let redis = redis_pool::create_redis_pool(&config.redis_url).await?;

    let transport = ResendMailer::from_config(&config)?;
    let worker = Arc::new(Worker::new(
        Arc::new(PgRecordStore::new(pool.clone())),
        Arc::new(PgDedupeStore::new(pool)),
        Arc::new(RedisQueue::new(redis)),
        Arc::new(transport),
    ));

    let poll_interval = Duration::from_millis(config.worker_poll_interval_ms);

    // One polling task per queue. Queues are independent, so a slow digest
    // send never delays anniversary mail.
    for queue_name in ALL_QUEUES {
        let worker = worker.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                let summary = worker.drain(queue_name).await;
                if summary.processed() > 0 {
                    tracing::info!(
                        queue = queue_name,
                        sent = summary.sent,
                        dropped = summary.dropped,
                        failed = summary.failed,
                        "Drained queue"
                    );
                }
            }
        });
        tracing::info!(queue = queue_name, "Worker started");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");
    Ok(())
}

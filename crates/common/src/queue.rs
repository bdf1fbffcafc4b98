//! Delivery queue seam — named queues with at-least-once delivery and no
//! ordering guarantee. Production backend is a Redis list per queue.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::AppError;
use crate::types::QueueItem;

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn enqueue(&self, queue: &str, item: &QueueItem) -> Result<(), AppError>;

    /// Pop one item, or `None` when the queue is currently empty.
    async fn dequeue(&self, queue: &str) -> Result<Option<QueueItem>, AppError>;
}

/// Redis list per queue: `LPUSH` to enqueue, `RPOP` to dequeue, JSON bodies.
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn redis_key(queue: &str) -> String {
        format!("queue:{}", queue)
    }
}

#[async_trait]
impl DeliveryQueue for RedisQueue {
    async fn enqueue(&self, queue: &str, item: &QueueItem) -> Result<(), AppError> {
        let body = serde_json::to_string(item)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(Self::redis_key(queue), body).await?;

        tracing::debug!(queue, item_id = %item.id, mail_key = %item.mail_key, "Item enqueued");
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<QueueItem>, AppError> {
        let mut conn = self.conn.clone();
        let body: Option<String> = conn.rpop(Self::redis_key(queue), None).await?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}

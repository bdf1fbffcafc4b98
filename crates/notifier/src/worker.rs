//! Queue workers.
//!
//! Each item ends in exactly one of three states. `Sent` writes the dedupe
//! entry, `Dropped` discards the item without sending, and `Failed` leaves
//! no dedupe entry so the next engine scan re-enqueues the milestone.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;

use tenure_common::error::AppError;
use tenure_common::queue::DeliveryQueue;
use tenure_common::store::{DedupeStore, RecordStore};
use tenure_common::types::{DeliveryOutcome, MailPayload, QueueItem, valid_email};

use crate::render;
use crate::transport::MailTransport;

/// Outcome counts for one drain pass over a queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub sent: u32,
    pub dropped: u32,
    pub failed: u32,
}

impl DrainSummary {
    pub fn processed(&self) -> u32 {
        self.sent + self.dropped + self.failed
    }
}

pub struct Worker {
    records: Arc<dyn RecordStore>,
    dedupe: Arc<dyn DedupeStore>,
    queue: Arc<dyn DeliveryQueue>,
    transport: Arc<dyn MailTransport>,
}

impl Worker {
    pub fn new(
        records: Arc<dyn RecordStore>,
        dedupe: Arc<dyn DedupeStore>,
        queue: Arc<dyn DeliveryQueue>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            records,
            dedupe,
            queue,
            transport,
        }
    }

    /// Drain a queue to empty.
    ///
    /// Items are processed concurrently, one task each, so a slow send
    /// never stalls the other items behind it. The dedupe store's
    /// insert-if-absent makes concurrent processing safe.
    pub async fn drain(self: &Arc<Self>, queue_name: &str) -> DrainSummary {
        let mut tasks = JoinSet::new();
        loop {
            let item = match self.queue.dequeue(queue_name).await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, queue = queue_name, "Dequeue failed");
                    break;
                }
            };

            let worker = Arc::clone(self);
            tasks.spawn(async move {
                match worker.process(&item).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(error = %e, item_id = %item.id, "Item processing failed");
                        DeliveryOutcome::Failed
                    }
                }
            });
        }

        let mut summary = DrainSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(DeliveryOutcome::Sent) => summary.sent += 1,
                Ok(DeliveryOutcome::Dropped) => summary.dropped += 1,
                Ok(DeliveryOutcome::Failed) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, queue = queue_name, "Worker task panicked");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Process one queue item to a terminal state.
    pub async fn process(&self, item: &QueueItem) -> Result<DeliveryOutcome, AppError> {
        if !valid_email(&item.to) {
            tracing::warn!(item_id = %item.id, to = %item.to, "Invalid recipient, dropping item");
            return Ok(DeliveryOutcome::Dropped);
        }

        // Re-check volatile record state at send time. Conditions may have
        // changed between enqueue and drain.
        match &item.payload {
            MailPayload::VisaReminder { record_id, .. } => {
                let Some(record) = self.records.load(*record_id).await? else {
                    tracing::info!(record_id, "Record vanished, dropping item");
                    return Ok(DeliveryOutcome::Dropped);
                };
                if record.visa_created {
                    tracing::info!(record_id, "Visa already created, dropping reminder");
                    return Ok(DeliveryOutcome::Dropped);
                }
            }
            MailPayload::Anniversary { record_id, .. }
            | MailPayload::InterestCheck { record_id, .. } => {
                if self.records.load(*record_id).await?.is_none() {
                    tracing::info!(record_id, "Record vanished, dropping item");
                    return Ok(DeliveryOutcome::Dropped);
                }
            }
            MailPayload::AcademyDigest { rows, .. } => {
                if rows.is_empty() {
                    tracing::info!(item_id = %item.id, "Empty digest, dropping item");
                    return Ok(DeliveryOutcome::Dropped);
                }
            }
        }

        let mail = render::render(item);
        let delivered = self
            .transport
            .send(&item.to, &mail.subject, &mail.body, mail.is_html)
            .await?;

        if !delivered {
            tracing::error!(item_id = %item.id, mail_key = %item.mail_key, "Send failed");
            return Ok(DeliveryOutcome::Failed);
        }

        self.dedupe.record(&item.dedupe_key(), Utc::now()).await?;
        tracing::info!(
            item_id = %item.id,
            mail_key = %item.mail_key,
            to = %item.to,
            "Milestone mail sent"
        );
        Ok(DeliveryOutcome::Sent)
    }
}

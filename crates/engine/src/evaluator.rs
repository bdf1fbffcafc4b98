//! The rule engine — one generic evaluation pass per milestone rule.
//!
//! For each rule:
//! 1. Fetch candidate records matching the rule's eligibility filter
//! 2. Parse the join date and compute `anchor = join ± offset`
//! 3. Keep candidates whose exact-day due window contains "now"
//! 4. Skip anything the dedupe store has already seen
//! 5. Enqueue single items directly, or aggregate digest rows per anchor
//!    day and enqueue one grouped item after the scan
//!
//! Data errors (bad dates, bad addresses) skip the candidate; a rule
//! failure never aborts evaluation of the other rules.

use std::sync::Arc;

use tenure_common::clock::Clock;
use tenure_common::error::AppError;
use tenure_common::queue::DeliveryQueue;
use tenure_common::store::{DedupeStore, RecordStore};
use tenure_common::types::{
    DedupeKey, DigestRow, EmployeeRecord, MailPayload, QueueItem, valid_email,
};

use crate::digest::DigestBuilder;
use crate::rules::{Delivery, MilestoneRule, PayloadKind, Recipient, catalog};
use crate::window::{DueWindow, parse_anchor};

/// Evaluates the milestone catalog against the record population and feeds
/// the delivery queues. Invoked once per external trigger.
pub struct RuleEngine {
    records: Arc<dyn RecordStore>,
    dedupe: Arc<dyn DedupeStore>,
    queue: Arc<dyn DeliveryQueue>,
    clock: Arc<dyn Clock>,
    digest_recipient: String,
    confirm_url: String,
}

impl RuleEngine {
    pub fn new(
        records: Arc<dyn RecordStore>,
        dedupe: Arc<dyn DedupeStore>,
        queue: Arc<dyn DeliveryQueue>,
        clock: Arc<dyn Clock>,
        digest_recipient: String,
        confirm_url: String,
    ) -> Self {
        Self {
            records,
            dedupe,
            queue,
            clock,
            digest_recipient,
            confirm_url,
        }
    }

    /// Evaluate the full catalog. Rules touch disjoint milestone keys, so
    /// one rule failing only costs that rule's items this invocation.
    pub async fn run(&self) {
        for rule in catalog() {
            match self.evaluate(&rule).await {
                Ok(count) => {
                    tracing::info!(count, key = rule.key, "Scheduled milestone items");
                }
                Err(e) => {
                    tracing::error!(error = %e, key = rule.key, "Rule evaluation failed");
                }
            }
        }
    }

    /// Evaluate one rule. Returns the number of items enqueued.
    pub async fn evaluate(&self, rule: &MilestoneRule) -> Result<u32, AppError> {
        let now = self.clock.now_local();
        let candidates = self.records.find_eligible(&rule.filter).await?;

        let mut digest = DigestBuilder::new();
        let mut enqueued = 0u32;

        for record in &candidates {
            if rule.visa_gate && record.visa_created {
                continue;
            }

            let Some(raw) = record.join_date.as_deref() else {
                continue;
            };
            let Some(join) = parse_anchor(raw) else {
                tracing::warn!(record_id = record.id, value = raw, "Invalid join date, skipping record");
                continue;
            };
            let Some(anchor) = rule.offset.apply(join) else {
                tracing::warn!(record_id = record.id, key = rule.key, "Join date out of range, skipping record");
                continue;
            };

            let window = DueWindow::around(anchor);
            if !window.contains(now) {
                continue;
            }

            match &rule.delivery {
                Delivery::Single(kind) => {
                    let key = DedupeKey::employee(record.id, rule.key);
                    if self.dedupe.has_sent(&key).await? {
                        continue;
                    }
                    let Some(to) = self.resolve_recipient(rule, record) else {
                        continue;
                    };
                    let item =
                        QueueItem::new(rule.key, to, self.build_payload(kind, rule, record, join));
                    self.queue.enqueue(rule.queue, &item).await?;
                    enqueued += 1;
                }
                Delivery::Digest => {
                    digest.push(window.anchor_day(), digest_row(record, join));
                }
            }
        }

        // Grouped rules defer enqueue until all candidates are scanned:
        // one item per populated anchor day, deduped under the synthetic
        // digest key so at most one digest goes out per milestone per day.
        if matches!(rule.delivery, Delivery::Digest) {
            for (day, rows) in digest.into_groups() {
                let key = DedupeKey::digest(rule.key, day);
                if self.dedupe.has_sent(&key).await? {
                    continue;
                }
                let item = QueueItem::new(
                    rule.key,
                    self.digest_recipient.clone(),
                    MailPayload::AcademyDigest {
                        subject: rule.subject.to_string(),
                        anchor_day: day,
                        rows,
                    },
                );
                self.queue.enqueue(rule.queue, &item).await?;
                enqueued += 1;
            }
        }

        Ok(enqueued)
    }

    fn resolve_recipient(&self, rule: &MilestoneRule, record: &EmployeeRecord) -> Option<String> {
        let candidate = match rule.recipient {
            Recipient::Employee => record.email.clone(),
            Recipient::Manager => record.manager_email.clone(),
            Recipient::DigestAddress => return Some(self.digest_recipient.clone()),
        };

        match candidate {
            Some(addr) if valid_email(&addr) => Some(addr),
            Some(addr) => {
                tracing::warn!(
                    record_id = record.id,
                    key = rule.key,
                    address = %addr,
                    "Invalid recipient address, skipping record"
                );
                None
            }
            None => {
                tracing::warn!(
                    record_id = record.id,
                    key = rule.key,
                    "No recipient available, skipping record"
                );
                None
            }
        }
    }

    fn build_payload(
        &self,
        kind: &PayloadKind,
        rule: &MilestoneRule,
        record: &EmployeeRecord,
        join: chrono::NaiveDateTime,
    ) -> MailPayload {
        match kind {
            PayloadKind::Anniversary { months } => MailPayload::Anniversary {
                record_id: record.id,
                name: record.name.clone(),
                months: *months,
            },
            PayloadKind::VisaReminder => MailPayload::VisaReminder {
                record_id: record.id,
                name: record.name.clone(),
                subject: rule.subject.to_string(),
                is_academy: record.academy,
            },
            PayloadKind::InterestCheck => MailPayload::InterestCheck {
                record_id: record.id,
                name: record.name.clone(),
                subject: rule.subject.to_string(),
                join_date: join.format("%B %-d, %Y").to_string(),
                confirm_url: self.confirm_url.clone(),
            },
        }
    }
}

fn digest_row(record: &EmployeeRecord, join: chrono::NaiveDateTime) -> DigestRow {
    DigestRow {
        record_id: record.id,
        name: record.name.clone(),
        manager_name: record.manager_name.clone().unwrap_or_default(),
        manager_email: record.manager_email.clone().unwrap_or_default(),
        visa_status: record.visa_status.clone().unwrap_or_default(),
        email: record.email.clone().unwrap_or_default(),
        join_date: join.date().format("%Y-%m-%d").to_string(),
    }
}

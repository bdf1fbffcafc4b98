use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue names, one per milestone family.
///
/// All three visa reminders share a single queue and worker; both academy
/// digests share the digest queue.
pub const QUEUE_VISA_REMINDER: &str = "milestones.visa_reminder";
pub const QUEUE_THREE_MONTH: &str = "milestones.employee_three_month";
pub const QUEUE_SIX_MONTH: &str = "milestones.employee_six_month";
pub const QUEUE_ACADEMY_DIGEST: &str = "milestones.academy_digest";
pub const QUEUE_INTEREST_CHECK: &str = "milestones.interest_check";

/// Every queue the notifier daemon drains.
pub const ALL_QUEUES: [&str; 5] = [
    QUEUE_VISA_REMINDER,
    QUEUE_THREE_MONTH,
    QUEUE_SIX_MONTH,
    QUEUE_ACADEMY_DIGEST,
    QUEUE_INTEREST_CHECK,
];

/// What kind of subject a dedupe entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Employee,
    Digest,
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectType::Employee => write!(f, "employee"),
            SubjectType::Digest => write!(f, "digest"),
        }
    }
}

/// Uniqueness key for the send log: one entry per (subject, milestone).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupeKey {
    pub subject_type: SubjectType,
    pub subject_id: i64,
    pub mail_key: String,
}

impl DedupeKey {
    /// Key for a per-employee milestone send.
    pub fn employee(record_id: i64, mail_key: &str) -> Self {
        Self {
            subject_type: SubjectType::Employee,
            subject_id: record_id,
            mail_key: mail_key.to_string(),
        }
    }

    /// Synthetic key for a grouped digest send: subject id 0, the anchor day
    /// folded into the milestone key so one digest fires per day at most.
    pub fn digest(mail_key: &str, anchor_day: NaiveDate) -> Self {
        Self {
            subject_type: SubjectType::Digest,
            subject_id: 0,
            mail_key: format!("{}:{}", mail_key, anchor_day.format("%Y-%m-%d")),
        }
    }
}

/// Result of a dedupe insert. Duplicate inserts are a defined outcome,
/// never an error surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

/// Terminal state of one processed queue item.
///
/// `Sent` and `Dropped` are terminal for the (subject, milestone) pair;
/// `Failed` leaves no dedupe entry, so the next engine invocation
/// re-evaluates and re-enqueues the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Dropped,
    Failed,
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::Dropped => write!(f, "dropped"),
            DeliveryOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// An employee/candidate record, read-only to the scheduler.
///
/// `join_date` holds the raw field value — upstream imports write either a
/// date ("2025-01-15") or a datetime ("2025-01-15T09:00:00"). The engine
/// parses it per evaluation; unparseable values are logged and skipped.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeRecord {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub join_date: Option<String>,
    pub visa_created: bool,
    pub visa_status: Option<String>,
    pub academy: bool,
    pub manager_name: Option<String>,
    pub manager_email: Option<String>,
    pub active: bool,
}

/// Eligibility filter pushed down to the record store.
///
/// Active status and a present join date are always required; the flags add
/// the rule-specific requirements on top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub require_email: bool,
    pub require_manager: bool,
    pub academy_only: bool,
}

/// One line of an academy digest table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestRow {
    pub record_id: i64,
    pub name: String,
    pub manager_name: String,
    pub manager_email: String,
    pub visa_status: String,
    pub email: String,
    pub join_date: String,
}

/// Rendered-payload fields carried through the delivery queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MailPayload {
    Anniversary {
        record_id: i64,
        name: String,
        months: u32,
    },
    VisaReminder {
        record_id: i64,
        name: String,
        subject: String,
        is_academy: bool,
    },
    InterestCheck {
        record_id: i64,
        name: String,
        subject: String,
        join_date: String,
        confirm_url: String,
    },
    AcademyDigest {
        subject: String,
        anchor_day: NaiveDate,
        rows: Vec<DigestRow>,
    },
}

/// An item on a delivery queue. Consumed logically once, physically at
/// least once, by a notifier worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub mail_key: String,
    pub to: String,
    pub enqueued_at: DateTime<Utc>,
    pub payload: MailPayload,
}

impl QueueItem {
    pub fn new(mail_key: &str, to: String, payload: MailPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            mail_key: mail_key.to_string(),
            to,
            enqueued_at: Utc::now(),
            payload,
        }
    }

    /// The dedupe key this item writes after a successful send.
    pub fn dedupe_key(&self) -> DedupeKey {
        match &self.payload {
            MailPayload::Anniversary { record_id, .. }
            | MailPayload::VisaReminder { record_id, .. }
            | MailPayload::InterestCheck { record_id, .. } => {
                DedupeKey::employee(*record_id, &self.mail_key)
            }
            MailPayload::AcademyDigest { anchor_day, .. } => {
                DedupeKey::digest(&self.mail_key, *anchor_day)
            }
        }
    }
}

/// Minimal address sanity check, matching what the original system accepted:
/// exactly one `@`, non-empty local part, a dot somewhere in the domain,
/// and no whitespace.
pub fn valid_email(addr: &str) -> bool {
    if addr.is_empty() || addr.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = addr.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

//! Declarative milestone rule catalog.
//!
//! Each lifecycle milestone is one descriptor evaluated by the generic
//! engine in [`crate::evaluator`] — an anchor offset, an eligibility
//! filter, a recipient source, and a delivery mode. Adding a milestone
//! means adding one entry here, not another copy of the window math.

use chrono::{Duration, Months, NaiveDateTime};

use tenure_common::types::{
    QUEUE_ACADEMY_DIGEST, QUEUE_INTEREST_CHECK, QUEUE_SIX_MONTH, QUEUE_THREE_MONTH,
    QUEUE_VISA_REMINDER, RecordFilter,
};

/// Magnitude of a rule offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Days(u32),
    Months(u32),
}

/// Signed offset from the join date to the milestone anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    BeforeJoin(Span),
    AfterJoin(Span),
}

impl Offset {
    /// `join ± offset`. `None` on calendar overflow.
    pub fn apply(&self, join: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Offset::AfterJoin(Span::Days(d)) => join.checked_add_signed(Duration::days(*d as i64)),
            Offset::AfterJoin(Span::Months(m)) => join.checked_add_months(Months::new(*m)),
            Offset::BeforeJoin(Span::Days(d)) => join.checked_sub_signed(Duration::days(*d as i64)),
            Offset::BeforeJoin(Span::Months(m)) => join.checked_sub_months(Months::new(*m)),
        }
    }
}

/// Who receives a single-recipient milestone mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The record's own contact address.
    Employee,
    /// The responsible manager referenced by the record.
    Manager,
    /// The configured digest address.
    DigestAddress,
}

/// Payload kind for single-recipient rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Anniversary { months: u32 },
    VisaReminder,
    InterestCheck,
}

/// One item per due record, or one grouped item per anchor day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Single(PayloadKind),
    Digest,
}

/// A milestone rule descriptor.
#[derive(Debug, Clone)]
pub struct MilestoneRule {
    /// Unique milestone key, also the dedupe mail-key.
    pub key: &'static str,
    /// Queue this rule's items land on.
    pub queue: &'static str,
    /// Subject line carried into the payload (anniversary workers derive
    /// theirs from the months count instead, as the mail copy differs).
    pub subject: &'static str,
    pub offset: Offset,
    pub filter: RecordFilter,
    pub recipient: Recipient,
    /// Only fire while the record's visa has not been created yet.
    pub visa_gate: bool,
    pub delivery: Delivery,
}

/// The full milestone catalog, evaluated once per invocation.
pub fn catalog() -> Vec<MilestoneRule> {
    vec![
        // Before-join visa reminders to the manager, only while the visa is
        // not created. All three share one queue and worker.
        MilestoneRule {
            key: "visa_reminder_14d",
            queue: QUEUE_VISA_REMINDER,
            subject: "Visa reminder - 2 weeks before start",
            offset: Offset::BeforeJoin(Span::Days(14)),
            filter: RecordFilter {
                require_manager: true,
                ..Default::default()
            },
            recipient: Recipient::Manager,
            visa_gate: true,
            delivery: Delivery::Single(PayloadKind::VisaReminder),
        },
        MilestoneRule {
            key: "visa_reminder_7d",
            queue: QUEUE_VISA_REMINDER,
            subject: "Visa reminder - 1 week before start",
            offset: Offset::BeforeJoin(Span::Days(7)),
            filter: RecordFilter {
                require_manager: true,
                ..Default::default()
            },
            recipient: Recipient::Manager,
            visa_gate: true,
            delivery: Delivery::Single(PayloadKind::VisaReminder),
        },
        MilestoneRule {
            key: "visa_reminder_3d",
            queue: QUEUE_VISA_REMINDER,
            subject: "Visa reminder - 3 days before start",
            offset: Offset::BeforeJoin(Span::Days(3)),
            filter: RecordFilter {
                require_manager: true,
                ..Default::default()
            },
            recipient: Recipient::Manager,
            visa_gate: true,
            delivery: Delivery::Single(PayloadKind::VisaReminder),
        },
        // After-join anniversaries to the employee.
        MilestoneRule {
            key: "employee_three_month",
            queue: QUEUE_THREE_MONTH,
            subject: "Congratulations on 3 months!",
            offset: Offset::AfterJoin(Span::Months(3)),
            filter: RecordFilter {
                require_email: true,
                ..Default::default()
            },
            recipient: Recipient::Employee,
            visa_gate: false,
            delivery: Delivery::Single(PayloadKind::Anniversary { months: 3 }),
        },
        MilestoneRule {
            key: "employee_six_month",
            queue: QUEUE_SIX_MONTH,
            subject: "Half-year milestone!",
            offset: Offset::AfterJoin(Span::Months(6)),
            filter: RecordFilter {
                require_email: true,
                ..Default::default()
            },
            recipient: Recipient::Employee,
            visa_gate: false,
            delivery: Delivery::Single(PayloadKind::Anniversary { months: 6 }),
        },
        // Academy arrivals digest to the tech committee, one mail per day.
        MilestoneRule {
            key: "academy_digest_7d",
            queue: QUEUE_ACADEMY_DIGEST,
            subject: "Academy arrivals - 1 week",
            offset: Offset::BeforeJoin(Span::Days(7)),
            filter: RecordFilter {
                academy_only: true,
                ..Default::default()
            },
            recipient: Recipient::DigestAddress,
            visa_gate: false,
            delivery: Delivery::Digest,
        },
        MilestoneRule {
            key: "academy_digest_3d",
            queue: QUEUE_ACADEMY_DIGEST,
            subject: "Academy arrivals - 3 days",
            offset: Offset::BeforeJoin(Span::Days(3)),
            filter: RecordFilter {
                academy_only: true,
                ..Default::default()
            },
            recipient: Recipient::DigestAddress,
            visa_gate: false,
            delivery: Delivery::Digest,
        },
        // Candidate interest check one month before start.
        MilestoneRule {
            key: "interest_check_1m",
            queue: QUEUE_INTEREST_CHECK,
            subject: "Quick check: still joining us next month?",
            offset: Offset::BeforeJoin(Span::Months(1)),
            filter: RecordFilter {
                require_email: true,
                ..Default::default()
            },
            recipient: Recipient::Employee,
            visa_gate: false,
            delivery: Delivery::Single(PayloadKind::InterestCheck),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_catalog_keys_are_unique() {
        let rules = catalog();
        let keys: HashSet<&str> = rules.iter().map(|r| r.key).collect();
        assert_eq!(keys.len(), rules.len());
        assert_eq!(rules.len(), 8);
    }

    #[test]
    fn test_offset_days_after_join() {
        let join = dt(2025, 1, 15);
        let anchor = Offset::AfterJoin(Span::Days(14)).apply(join).unwrap();
        assert_eq!(anchor, dt(2025, 1, 29));
    }

    #[test]
    fn test_offset_days_before_join() {
        let join = dt(2025, 3, 10);
        let anchor = Offset::BeforeJoin(Span::Days(7)).apply(join).unwrap();
        assert_eq!(anchor, dt(2025, 3, 3));
    }

    #[test]
    fn test_offset_months_clamps_to_month_end() {
        // Oct 31 + 3 months: chrono clamps to Jan 31; Nov 30 + 3 months
        // clamps Feb 30 -> Feb 28.
        let anchor = Offset::AfterJoin(Span::Months(3))
            .apply(dt(2024, 11, 30))
            .unwrap();
        assert_eq!(anchor, dt(2025, 2, 28));
    }

    #[test]
    fn test_offset_months_before_join() {
        let anchor = Offset::BeforeJoin(Span::Months(1))
            .apply(dt(2025, 4, 10))
            .unwrap();
        assert_eq!(anchor, dt(2025, 3, 10));
    }

    #[test]
    fn test_visa_rules_share_one_queue() {
        let queues: HashSet<&str> = catalog()
            .iter()
            .filter(|r| r.visa_gate)
            .map(|r| r.queue)
            .collect();
        assert_eq!(queues.len(), 1);
    }
}

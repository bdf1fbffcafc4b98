//! Payload to mail-body rendering.
//!
//! Single milestones render as plain text; the academy digest renders as an
//! HTML table grouped by joining date.

use std::collections::BTreeMap;

use tenure_common::types::{DigestRow, MailPayload, QueueItem};

pub struct RenderedMail {
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

pub fn render(item: &QueueItem) -> RenderedMail {
    match &item.payload {
        MailPayload::Anniversary { name, months, .. } => RenderedMail {
            subject: anniversary_subject(*months),
            body: format!(
                "Hi {},\n\nCongratulations on reaching your {}-month milestone with us.\nWe appreciate your contributions!\n\nBest,\nHR Team",
                name, months
            ),
            is_html: false,
        },
        MailPayload::VisaReminder {
            name,
            subject,
            is_academy,
            ..
        } => {
            let academy_line = if *is_academy {
                "\nNote: this new joiner is an academy participant assigned to you."
            } else {
                ""
            };
            RenderedMail {
                subject: subject.clone(),
                body: format!(
                    "Hello,\n\nThe joining date for '{}' is approaching and this is a reminder to prepare their working environment.{}\n\nThanks.",
                    name, academy_line
                ),
                is_html: false,
            }
        }
        MailPayload::InterestCheck {
            name,
            subject,
            join_date,
            confirm_url,
            ..
        } => RenderedMail {
            subject: subject.clone(),
            body: format!(
                "Hi {},\n\nYour joining date of {} is a month away and we are looking forward to having you.\nPlease confirm you are still planning to join us: {}\n\nBest,\nHR Team",
                name, join_date, confirm_url
            ),
            is_html: false,
        },
        MailPayload::AcademyDigest { subject, rows, .. } => RenderedMail {
            subject: subject.clone(),
            body: digest_html(rows),
            is_html: true,
        },
    }
}

fn anniversary_subject(months: u32) -> String {
    match months {
        3 => "Congratulations on 3 months!".to_string(),
        6 => "Half-year milestone!".to_string(),
        other => format!("Congratulations on {} months!", other),
    }
}

fn digest_html(rows: &[DigestRow]) -> String {
    let mut by_join_date: BTreeMap<&str, Vec<&DigestRow>> = BTreeMap::new();
    for row in rows {
        by_join_date.entry(&row.join_date).or_default().push(row);
    }

    let mut html = String::new();
    html.push_str("<p>Hello,</p>");
    html.push_str("<p>The following academy participants are joining soon:</p>");

    for (join_date, group) in by_join_date {
        html.push_str(&format!(
            "<h3>Joining date: {}</h3>",
            escape(join_date)
        ));
        html.push_str(
            "<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\
             <tr><th>Name</th><th>Manager</th><th>Visa status</th><th>Email</th></tr>",
        );
        for row in group {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&row.name),
                escape(&row.manager_name),
                escape(&row.visa_status),
                escape(&row.email),
            ));
        }
        html.push_str("</table>");
    }

    html.push_str("<p>Thanks.</p>");
    html
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_anniversary_renders_plain_text() {
        let item = QueueItem::new(
            "employee_three_month",
            "jane@example.com".to_string(),
            MailPayload::Anniversary {
                record_id: 1,
                name: "Jane".to_string(),
                months: 3,
            },
        );
        let mail = render(&item);
        assert_eq!(mail.subject, "Congratulations on 3 months!");
        assert!(!mail.is_html);
        assert!(mail.body.contains("Hi Jane,"));
        assert!(mail.body.contains("3-month milestone"));
    }

    #[test]
    fn test_visa_reminder_mentions_academy_only_when_set() {
        let payload = |is_academy| MailPayload::VisaReminder {
            record_id: 1,
            name: "New Joiner".to_string(),
            subject: "Visa reminder - 1 week before start".to_string(),
            is_academy,
        };

        let plain = render(&QueueItem::new(
            "visa_reminder_7d",
            "lead@example.com".to_string(),
            payload(false),
        ));
        assert!(!plain.body.contains("academy participant"));

        let academy = render(&QueueItem::new(
            "visa_reminder_7d",
            "lead@example.com".to_string(),
            payload(true),
        ));
        assert!(academy.body.contains("academy participant"));
    }

    #[test]
    fn test_interest_check_includes_date_and_link() {
        let item = QueueItem::new(
            "interest_check_1m",
            "jane@example.com".to_string(),
            MailPayload::InterestCheck {
                record_id: 1,
                name: "Jane".to_string(),
                subject: "Quick check: still joining us next month?".to_string(),
                join_date: "April 10, 2025".to_string(),
                confirm_url: "https://example.com/confirm".to_string(),
            },
        );
        let mail = render(&item);
        assert!(mail.body.contains("April 10, 2025"));
        assert!(mail.body.contains("https://example.com/confirm"));
    }

    #[test]
    fn test_digest_renders_html_table_with_escaping() {
        let item = QueueItem::new(
            "academy_digest_7d",
            "committee@example.com".to_string(),
            MailPayload::AcademyDigest {
                subject: "Academy arrivals - 1 week".to_string(),
                anchor_day: NaiveDate::from_ymd_opt(2025, 9, 27).unwrap(),
                rows: vec![DigestRow {
                    record_id: 1,
                    name: "Alice <QA>".to_string(),
                    manager_name: "Bob & Co".to_string(),
                    manager_email: "bob@example.com".to_string(),
                    visa_status: "pending".to_string(),
                    email: "alice@example.com".to_string(),
                    join_date: "2025-10-04".to_string(),
                }],
            },
        );
        let mail = render(&item);
        assert!(mail.is_html);
        assert!(mail.body.contains("Joining date: 2025-10-04"));
        assert!(mail.body.contains("Alice &lt;QA&gt;"));
        assert!(mail.body.contains("Bob &amp; Co"));
        assert!(!mail.body.contains("<QA>"));
    }
}

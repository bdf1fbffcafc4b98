//! Digest aggregation — many due records, one outbound item per anchor day.
//!
//! Built transiently during a single rule pass and flushed by the
//! evaluator; never persisted apart from the resulting queue items.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use tenure_common::types::DigestRow;

/// Accumulates digest rows grouped by anchor day.
#[derive(Debug, Default)]
pub struct DigestBuilder {
    groups: BTreeMap<NaiveDate, Vec<DigestRow>>,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, anchor_day: NaiveDate, row: DigestRow) {
        self.groups.entry(anchor_day).or_default().push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Ordered groups, one per populated anchor day.
    pub fn into_groups(self) -> BTreeMap<NaiveDate, Vec<DigestRow>> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str) -> DigestRow {
        DigestRow {
            record_id: id,
            name: name.to_string(),
            manager_name: String::new(),
            manager_email: String::new(),
            visa_status: String::new(),
            email: format!("{}@example.com", name.to_lowercase()),
            join_date: "2025-10-04".to_string(),
        }
    }

    #[test]
    fn test_rows_sharing_a_day_form_one_group() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 27).unwrap();
        let mut builder = DigestBuilder::new();
        builder.push(day, row(1, "Ada"));
        builder.push(day, row(2, "Ben"));
        builder.push(day, row(3, "Cyd"));

        let groups = builder.into_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&day].len(), 3);
        // Insertion order preserved within the group.
        assert_eq!(groups[&day][0].name, "Ada");
        assert_eq!(groups[&day][2].name, "Cyd");
    }

    #[test]
    fn test_distinct_days_form_distinct_groups() {
        let d1 = NaiveDate::from_ymd_opt(2025, 9, 27).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 9, 28).unwrap();
        let mut builder = DigestBuilder::new();
        assert!(builder.is_empty());
        builder.push(d1, row(1, "Ada"));
        builder.push(d2, row(2, "Ben"));
        assert!(!builder.is_empty());

        let groups = builder.into_groups();
        assert_eq!(groups.len(), 2);
    }
}

//! Exact-day window math, in server-local time.
//!
//! A milestone is due on exactly one calendar day: the day of its anchor.
//! The due window is `[start_of_day(anchor), start_of_day(anchor) + 1 day)`,
//! so a milestone fires once even if the scan runs many times that day, and
//! never on any other day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a raw anchor field value.
///
/// Upstream writes either a date ("2025-01-15") or a datetime
/// ("2025-01-15T09:00:00", sometimes space-separated). Anything else is
/// unparseable and the caller skips the record.
pub fn parse_anchor(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// The half-open calendar-day window around an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DueWindow {
    pub fn around(anchor: NaiveDateTime) -> Self {
        let start = anchor.date().and_time(NaiveTime::MIN);
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// Due iff `now` is inside `[start, end)`.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        now >= self.start && now < self.end
    }

    /// The calendar day this window covers.
    pub fn anchor_day(&self) -> NaiveDate {
        self.start.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Offset, Span};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_anchor("2025-01-15"), Some(dt(2025, 1, 15, 0, 0, 0)));
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(
            parse_anchor("2025-01-15T09:30:00"),
            Some(dt(2025, 1, 15, 9, 30, 0))
        );
        assert_eq!(
            parse_anchor("2025-01-15 09:30:00"),
            Some(dt(2025, 1, 15, 9, 30, 0))
        );
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_anchor("").is_none());
        assert!(parse_anchor("soon").is_none());
        assert!(parse_anchor("15/01/2025").is_none());
    }

    #[test]
    fn test_after_join_window_is_exact_day() {
        // join 2025-01-15, offset +14d: due only in
        // [2025-01-29T00:00, 2025-01-30T00:00).
        let join = dt(2025, 1, 15, 0, 0, 0);
        let anchor = Offset::AfterJoin(Span::Days(14)).apply(join).unwrap();
        let window = DueWindow::around(anchor);

        assert!(window.contains(dt(2025, 1, 29, 0, 0, 0)));
        assert!(window.contains(dt(2025, 1, 29, 23, 59, 59)));
        // One second outside either boundary is not due.
        assert!(!window.contains(dt(2025, 1, 28, 23, 59, 59)));
        assert!(!window.contains(dt(2025, 1, 30, 0, 0, 0)));
    }

    #[test]
    fn test_before_join_window_is_exact_day() {
        // join 2025-03-10, offset -7d: due window [2025-03-03, 2025-03-04).
        let join = dt(2025, 3, 10, 0, 0, 0);
        let anchor = Offset::BeforeJoin(Span::Days(7)).apply(join).unwrap();
        let window = DueWindow::around(anchor);

        assert!(window.contains(dt(2025, 3, 3, 0, 0, 0)));
        assert!(window.contains(dt(2025, 3, 3, 12, 0, 0)));
        assert!(!window.contains(dt(2025, 3, 2, 23, 59, 59)));
        assert!(!window.contains(dt(2025, 3, 4, 0, 0, 0)));
    }

    #[test]
    fn test_datetime_anchor_truncates_to_day() {
        // A datetime join date still yields a whole-day window.
        let window = DueWindow::around(dt(2025, 1, 29, 17, 45, 0));
        assert!(window.contains(dt(2025, 1, 29, 0, 0, 0)));
        assert!(window.contains(dt(2025, 1, 29, 23, 59, 59)));
        assert_eq!(
            window.anchor_day(),
            NaiveDate::from_ymd_opt(2025, 1, 29).unwrap()
        );
    }
}

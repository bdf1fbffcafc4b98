//! Injected clock so window-boundary decisions are deterministic in tests.
//!
//! All milestone window math happens in server-local wall-clock time (the
//! only timezone this system models), hence `NaiveDateTime`.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};

/// Source of "now" for rule evaluation.
pub trait Clock: Send + Sync {
    fn now_local(&self) -> NaiveDateTime;
}

/// Wall-clock time in the server-local zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests.
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock_is_settable() {
        let t1 = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let t2 = t1 + chrono::Duration::days(1);

        let clock = FixedClock::new(t1);
        assert_eq!(clock.now_local(), t1);
        clock.set(t2);
        assert_eq!(clock.now_local(), t2);
    }
}

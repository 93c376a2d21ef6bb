//! Wall-clock access
//!
//! The store asks a [`Clock`] for "now" so that day-state derivation and the
//! rollover watcher can be driven by a fixed time in tests.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use std::sync::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant, used for `last_updated` stamps.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the user's local time zone.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests. `today()` is the date of the stored local time.
#[derive(Debug)]
pub struct FixedClock {
    local: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            local: Mutex::new(local),
        }
    }

    /// Clock fixed at noon of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }

    pub fn set(&self, local: NaiveDateTime) {
        if let Ok(mut guard) = self.local.lock() {
            *guard = local;
        }
    }

    fn local(&self) -> NaiveDateTime {
        self.local.lock().map(|guard| *guard).unwrap_or_default()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.local().and_utc()
    }

    fn today(&self) -> NaiveDate {
        self.local().date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_can_advance() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let clock = FixedClock::at_date(day);
        assert_eq!(clock.today(), day);

        let next = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        clock.set(next.and_hms_opt(0, 0, 1).unwrap());
        assert_eq!(clock.today(), next);
    }
}

//! Calendar source for streak accounting.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;

/// Supplies "today" as a calendar date.
pub trait Clock: Send + Sync {
    /// The current calendar date in the user's timezone.
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that returns whatever date it was last set to.
///
/// Clones share the date, so a test can keep a handle and advance the
/// clock the store was built with.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    /// Start at `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    /// Jump to `date`.
    pub fn set(&self, date: NaiveDate) {
        *self.date.lock() = date;
    }

    /// Move forward by `days` (backwards if negative).
    pub fn advance_days(&self, days: i64) {
        let mut date = self.date.lock();
        *date += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock()
    }
}

//! Injectable "today"
//!
//! Scheduling code never reads the wall clock directly; it asks a `Clock`.

use chrono::{NaiveDate, Utc};
use std::sync::Mutex;

/// Source of the current calendar day
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock day in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to a settable day, for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    day: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self { day: Mutex::new(day) }
    }

    /// Move the clock to `day`
    pub fn set(&self, day: NaiveDate) {
        let mut guard = self.day.lock().unwrap_or_else(|e| e.into_inner());
        *guard = day;
    }

    /// Move the clock forward by `days`
    pub fn advance_days(&self, days: u64) {
        let mut guard = self.day.lock().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + chrono::Days::new(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap_or_else(|e| e.into_inner())
    }
}

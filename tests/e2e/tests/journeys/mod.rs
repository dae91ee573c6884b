//! Journey Tests
//!
//! Complete learner workflows against a real SQLite database:
//! - Scheduling scenarios with exact expected dates
//! - Walking a unit through every cycle
//! - Late reviews, manual moves and completion signals
//! - Persistence across reopen and concurrent learners

mod concurrency;
mod cycle_journey;
mod persistence;
mod scenarios;

use chrono::NaiveDate;

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

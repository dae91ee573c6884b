//! Scheduling Module
//!
//! The repetition scheduling engine, leaves first:
//!
//! 1. **Interval Calculator**: raw target date for the i-th review of a cycle
//! 2. **Load Balancer**: nudges dates off days that are already busy
//! 3. **Schedule Generator**: five ordered, spaced slots for one cycle
//! 4. **Cycle Progression**: advances finished cycles and regenerates
//! 5. **Rescheduler**: moves pending future slots after completions
//! 6. **Coordinator**: bootstrap, due-date cache, effective start date
//!
//! Calculator, balancer and generator are pure. The remaining components
//! read and write through the `storage` interfaces and receive "today" from
//! the caller.

mod balancer;
mod coordinator;
mod generator;
mod interval;
mod progression;
mod rescheduler;

use chrono::{Days, NaiveDate};

pub use balancer::{DateLoad, LoadBalancer};
pub use coordinator::Coordinator;
pub use generator::ScheduleGenerator;
pub use interval::{AdjustmentMode, IntervalCalculator};
pub use progression::{CycleAdvance, CycleProgression};
pub use rescheduler::Rescheduler;

/// `date`, pushed forward to at least `gap` days after `previous`
#[inline]
pub(crate) fn enforce_min_gap(date: NaiveDate, previous: NaiveDate, gap: u32) -> NaiveDate {
    date.max(previous + Days::new(u64::from(gap)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforce_min_gap() {
        let prev = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let early = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();

        assert_eq!(enforce_min_gap(early, prev, 3), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
        assert_eq!(enforce_min_gap(late, prev, 3), late);
        assert_eq!(enforce_min_gap(prev, prev, 1), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
    }
}

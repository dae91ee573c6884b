//! Load Balancer
//!
//! Spreads reviews across calendar days. A candidate day that already carries
//! more than `load_threshold` pending reviews (across all learners) is nudged
//! forward to the first recorded day within the search window that has room.
//! When nothing in the window qualifies the review drifts by one day rather
//! than failing: perfect balancing is not guaranteed, only "no worse than
//! +1 day when saturated".

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};

use chrono::{Days, NaiveDate};

use crate::config::SchedulerConfig;

// ============================================================================
// DATE LOAD HISTOGRAM
// ============================================================================

/// Pending reviews per calendar day.
///
/// A snapshot, not a live view. Days without an entry carry no load.
/// Entries never hold zero: decrementing to zero removes the day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateLoad {
    counts: BTreeMap<NaiveDate, u32>,
}

impl DateLoad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reviews scheduled on `day`
    #[inline]
    pub fn count(&self, day: NaiveDate) -> u32 {
        self.counts.get(&day).copied().unwrap_or(0)
    }

    /// Add `n` reviews on `day`
    pub fn add(&mut self, day: NaiveDate, n: u32) {
        if n > 0 {
            *self.counts.entry(day).or_insert(0) += n;
        }
    }

    pub fn increment(&mut self, day: NaiveDate) {
        self.add(day, 1);
    }

    /// Remove one review from `day`
    pub fn decrement(&mut self, day: NaiveDate) {
        if let Some(count) = self.counts.get_mut(&day) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&day);
            }
        }
    }

    /// Recorded days in `(after, until]`, ascending
    pub fn recorded_between(
        &self,
        after: NaiveDate,
        until: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        let range = if until > after {
            Some(self.counts.range((Excluded(after), Included(until))))
        } else {
            None
        };
        range.into_iter().flatten().map(|(day, count)| (*day, *count))
    }

    /// All recorded days, ascending
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.counts.iter().map(|(day, count)| (*day, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total reviews in the snapshot
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }
}

impl FromIterator<(NaiveDate, u32)> for DateLoad {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u32)>>(iter: I) -> Self {
        let mut load = DateLoad::new();
        for (day, count) in iter {
            load.add(day, count);
        }
        load
    }
}

// ============================================================================
// LOAD BALANCER
// ============================================================================

/// Settles candidate review dates against a load snapshot
#[derive(Debug, Clone, Copy)]
pub struct LoadBalancer {
    threshold: u32,
    search_window_days: u32,
}

impl LoadBalancer {
    pub fn new(threshold: u32, search_window_days: u32) -> Self {
        Self {
            threshold,
            search_window_days,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.load_threshold, config.search_window_days)
    }

    /// Adjusted date for `candidate`. Never earlier than `today`.
    pub fn settle(&self, candidate: NaiveDate, load: &DateLoad, today: NaiveDate) -> NaiveDate {
        let candidate = candidate.max(today);
        if load.count(candidate) <= self.threshold {
            return candidate;
        }

        let window_end = candidate + Days::new(u64::from(self.search_window_days));
        let settled = load
            .recorded_between(candidate, window_end)
            .find(|&(_, count)| count <= self.threshold)
            .map(|(day, _)| day)
            .unwrap_or_else(|| candidate + Days::new(1));

        tracing::debug!(
            %candidate,
            %settled,
            load = load.count(candidate),
            "Candidate day saturated, review moved"
        );
        settled
    }
}

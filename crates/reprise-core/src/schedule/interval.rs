//! Interval Calculator
//!
//! Computes the raw target date of the i-th review of a cycle from the unit's
//! difficulty, the cycle depth, and the learner's completion signal.
//!
//! ## Formula
//!
//! - Difficulty factor: `wf = min(max(size, min_size) / base_size, max_factor)`
//! - Multiplier `m` from the per-index table (last entry reused past the end)
//! - Shallow: `wf * min(max_interval, depth * m)`
//! - Deep (`depth >= 3` and `i >= 2`): `sqrt(depth * m) * wf * 5`
//! - Times the call-site adjustment factor, times `percent / 100` when the
//!   learner has reported any completion
//! - Rounded to whole days and clamped to `[0, 60]` past the base date
//!
//! Pure and deterministic: identical inputs give identical dates.

use chrono::{Days, NaiveDate};

use crate::config::SchedulerConfig;
use crate::model::Progress;

/// Which call site is asking, selecting the adjustment factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentMode {
    /// Uncorrected output. The engine's own paths never select it; it is
    /// there for callers previewing raw intervals through the calculator.
    Fresh,
    /// Recompute after a review was completed; scales by completion
    AfterCompletion,
    /// Schedule generation and explicit reschedules; composite of cycle
    /// depth, completion and difficulty
    Reschedule,
}

/// Raw review-date calculator
#[derive(Debug, Clone, Copy)]
pub struct IntervalCalculator<'a> {
    config: &'a SchedulerConfig,
}

impl<'a> IntervalCalculator<'a> {
    pub fn new(config: &'a SchedulerConfig) -> Self {
        Self { config }
    }

    /// Difficulty factor from the unit size
    pub fn difficulty_factor(&self, unit_size: u32) -> f64 {
        let size = f64::from(unit_size.max(self.config.min_unit_size));
        (size / f64::from(self.config.base_unit_size)).min(self.config.max_difficulty_factor)
    }

    /// Call-site adjustment factor
    pub fn adjustment_factor(&self, progress: &Progress, mode: AdjustmentMode) -> f64 {
        let completion = progress.completion_ratio();
        match mode {
            AdjustmentMode::Fresh => 1.0,
            // No completion reported yet means no signal, not "shrink to zero"
            AdjustmentMode::AfterCompletion if progress.percent_complete == 0 => 1.0,
            AdjustmentMode::AfterCompletion => completion,
            AdjustmentMode::Reschedule => {
                let depth = f64::from(progress.cycle_state.depth());
                let depth_factor = 1.0 + 0.1 * (depth - 1.0);
                let completion_factor = if progress.percent_complete > 0 {
                    0.8 + 0.4 * completion
                } else {
                    1.0
                };
                let difficulty_factor = 1.0 + 0.1 * (self.difficulty_factor(progress.unit.size) - 1.0);
                depth_factor * completion_factor * difficulty_factor
            }
        }
    }

    /// Unadjusted interval in fractional days
    pub fn base_interval(&self, progress: &Progress, index: usize) -> f64 {
        let depth = progress.cycle_state.depth();
        let multiplier = self.config.multiplier(index);
        let wf = self.difficulty_factor(progress.unit.size);
        let scaled = f64::from(depth.saturating_mul(multiplier));

        if depth >= self.config.deep_cycle_depth && index >= self.config.deep_cycle_min_index {
            scaled.sqrt() * wf * self.config.deep_cycle_scale
        } else {
            wf * scaled.min(f64::from(self.config.max_interval_days))
        }
    }

    /// Whole-day offset from the base date, within `[0, max_date_constraint_days]`
    pub fn offset_days(&self, progress: &Progress, index: usize, mode: AdjustmentMode) -> u64 {
        let mut days = self.base_interval(progress, index) * self.adjustment_factor(progress, mode);
        if progress.percent_complete > 0 {
            days *= progress.completion_ratio();
        }
        if !days.is_finite() {
            return 0;
        }
        days.round()
            .clamp(0.0, f64::from(self.config.max_date_constraint_days)) as u64
    }

    /// Candidate date of slot `index`, never before `base`
    pub fn target_date(
        &self,
        progress: &Progress,
        index: usize,
        base: NaiveDate,
        mode: AdjustmentMode,
    ) -> NaiveDate {
        base + Days::new(self.offset_days(progress, index, mode))
    }
}

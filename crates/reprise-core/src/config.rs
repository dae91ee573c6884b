//! Scheduler configuration
//!
//! Every tunable of the engine lives here instead of in global constants so
//! tests and deployments can vary them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::model::SLOTS_PER_CYCLE;

/// Default interval multipliers per slot index
pub const DEFAULT_INTERVAL_MULTIPLIERS: [u32; 6] = [2, 4, 8, 13, 19, 26];

/// Default minimum gaps (days) between consecutive slots:
/// `(0,1)`, `(1,2)`, `(2,3)`, `(3,4)`
pub const DEFAULT_MIN_GAPS: [u32; SLOTS_PER_CYCLE - 1] = [1, 2, 3, 5];

/// Configuration for the scheduling engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Unit size that maps to a difficulty factor of 1.0
    pub base_unit_size: u32,
    /// Sizes below this are treated as this size
    pub min_unit_size: u32,
    /// Upper bound of the difficulty factor
    pub max_difficulty_factor: f64,
    /// Interval multiplier per slot index; the last entry is reused past the end
    pub interval_multipliers: Vec<u32>,
    /// Cap on `depth * multiplier` before the difficulty factor is applied
    pub max_interval_days: u32,
    /// Cycle depth from which square-root damping applies
    pub deep_cycle_depth: u32,
    /// Slot index from which square-root damping applies
    pub deep_cycle_min_index: usize,
    /// Scale of the damped interval
    pub deep_cycle_scale: f64,
    /// No computed date lands further than this past its base date
    pub max_date_constraint_days: u32,
    /// Days with at most this many scheduled reviews are acceptable
    pub load_threshold: u32,
    /// How far past a saturated day the balancer looks for room
    pub search_window_days: u32,
    /// Horizon of the load histogram snapshot
    pub load_window_days: u32,
    /// Minimum days between slot `i` and `i + 1`
    pub min_gaps: Vec<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_unit_size: 100,
            min_unit_size: 50,
            max_difficulty_factor: 3.0,
            interval_multipliers: DEFAULT_INTERVAL_MULTIPLIERS.to_vec(),
            max_interval_days: 45,
            deep_cycle_depth: 3,
            deep_cycle_min_index: 2,
            deep_cycle_scale: 5.0,
            max_date_constraint_days: 60,
            load_threshold: 3,
            search_window_days: 7,
            load_window_days: 60,
            min_gaps: DEFAULT_MIN_GAPS.to_vec(),
        }
    }
}

impl SchedulerConfig {
    /// Interval multiplier for a slot index
    pub fn multiplier(&self, index: usize) -> u32 {
        self.interval_multipliers
            .get(index)
            .or_else(|| self.interval_multipliers.last())
            .copied()
            .unwrap_or(1)
    }

    /// Minimum gap between slot `index - 1` and slot `index`.
    ///
    /// `None` for index 0 or when the table is too short.
    pub fn min_gap_before(&self, index: usize) -> Option<u32> {
        index.checked_sub(1).and_then(|i| self.min_gaps.get(i).copied())
    }

    /// Days past its anchor that scheduling one cycle can reach: the load
    /// snapshot plus, per slot, the date clamp, the balancer window and the
    /// minimum gap.
    pub fn horizon_days(&self) -> u64 {
        let per_slot = u64::from(self.max_date_constraint_days)
            + u64::from(self.search_window_days)
            + 1;
        let gaps: u64 = self.min_gaps.iter().map(|&gap| u64::from(gap)).sum();
        let snapshot = u64::from(self.load_window_days.max(self.max_date_constraint_days))
            + u64::from(self.search_window_days);
        snapshot + per_slot * SLOTS_PER_CYCLE as u64 + gaps
    }

    /// Whether the gap table covers every consecutive pair of a cycle
    pub fn covers_full_cycle(&self) -> bool {
        self.min_gaps.len() >= SLOTS_PER_CYCLE - 1
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.base_unit_size == 0 {
            return Err(SchedulerError::InvalidConfig("baseUnitSize must be positive".into()));
        }
        if !(self.max_difficulty_factor.is_finite() && self.max_difficulty_factor > 0.0) {
            return Err(SchedulerError::InvalidConfig(
                "maxDifficultyFactor must be a positive number".into(),
            ));
        }
        if !(self.deep_cycle_scale.is_finite() && self.deep_cycle_scale > 0.0) {
            return Err(SchedulerError::InvalidConfig(
                "deepCycleScale must be a positive number".into(),
            ));
        }
        if self.interval_multipliers.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "intervalMultipliers must not be empty".into(),
            ));
        }
        if !self.covers_full_cycle() {
            return Err(SchedulerError::InvalidConfig(format!(
                "minGaps needs {} entries, got {}",
                SLOTS_PER_CYCLE - 1,
                self.min_gaps.len()
            )));
        }
        if self.min_gaps.iter().any(|&gap| gap == 0) {
            return Err(SchedulerError::InvalidConfig(
                "minGaps entries must be at least one day".into(),
            ));
        }
        if self.load_window_days == 0 {
            return Err(SchedulerError::InvalidConfig("loadWindowDays must be positive".into()));
        }
        Ok(())
    }
}

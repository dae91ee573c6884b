//! Schedule Generator
//!
//! Produces the five ordered review slots of one cycle generation. Slots are
//! placed sequentially: each raw date is clamped to at least the configured
//! minimum gap after the previous slot's *settled* date, then settled by the
//! load balancer. The balancer only ever moves dates forward, so later slots
//! can never land on or before an earlier one.

use chrono::NaiveDate;

use super::{AdjustmentMode, DateLoad, IntervalCalculator, LoadBalancer, enforce_min_gap};
use crate::config::SchedulerConfig;
use crate::model::{Progress, ReviewSlot, SLOTS_PER_CYCLE, SlotOrder};

/// Builds one cycle's worth of review slots
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGenerator<'a> {
    config: &'a SchedulerConfig,
}

impl<'a> ScheduleGenerator<'a> {
    pub fn new(config: &'a SchedulerConfig) -> Self {
        Self { config }
    }

    /// Slots for the progress's current cycle anchored at `base`.
    ///
    /// Returns an empty schedule when the gap table cannot cover a full
    /// cycle. `load` is a snapshot; slots placed here are added to a working
    /// copy so later slots of the same generation see them.
    pub fn generate(
        &self,
        progress: &Progress,
        base: NaiveDate,
        load: &DateLoad,
        today: NaiveDate,
    ) -> Vec<ReviewSlot> {
        if !self.config.covers_full_cycle() {
            tracing::warn!(
                progress_id = %progress.id,
                gaps = self.config.min_gaps.len(),
                "Gap table shorter than a cycle, no slots generated"
            );
            return Vec::new();
        }

        let calculator = IntervalCalculator::new(self.config);
        let balancer = LoadBalancer::from_config(self.config);
        let mut working = load.clone();
        let mut previous: Option<NaiveDate> = None;
        let mut slots = Vec::with_capacity(SLOTS_PER_CYCLE);

        for order in SlotOrder::all() {
            let index = order.index();
            let raw = calculator.target_date(progress, index, base, AdjustmentMode::Reschedule);
            let spaced = match (previous, self.config.min_gap_before(index)) {
                (Some(prev), Some(gap)) => enforce_min_gap(raw, prev, gap),
                _ => raw,
            };
            let settled = balancer.settle(spaced, &working, today);

            tracing::debug!(
                progress_id = %progress.id,
                order = order.get(),
                %raw,
                %settled,
                "Slot placed"
            );

            working.increment(settled);
            previous = Some(settled);
            slots.push(ReviewSlot::new(
                progress.id.as_str(),
                progress.cycle_state,
                order,
                settled,
            ));
        }

        slots
    }
}

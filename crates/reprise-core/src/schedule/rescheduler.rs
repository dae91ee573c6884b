//! Rescheduler
//!
//! Recomputes the dates of pending slots that come after a pivot slot in the
//! current generation. Two entry points:
//!
//! - `reschedule`: explicit move, anchored on a caller-chosen date
//! - `after_completion`: anchored on the later of the completed slot's
//!   scheduled date and today
//!
//! The moved slots' own dates are removed from the load snapshot before
//! walking, so running the same reschedule twice changes nothing.

use chrono::NaiveDate;

use super::{AdjustmentMode, Coordinator, IntervalCalculator, LoadBalancer, enforce_min_gap};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::model::{Progress, ReviewSlot, SlotOrder};
use crate::storage::Store;

/// Moves future pending slots of the current generation
pub struct Rescheduler<'a, S: Store + ?Sized> {
    store: &'a S,
    config: &'a SchedulerConfig,
}

impl<'a, S: Store + ?Sized> Rescheduler<'a, S> {
    pub fn new(store: &'a S, config: &'a SchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Re-place every pending slot after `current_order`, anchored at
    /// `new_start_date`. Returns the number of slots whose date changed.
    pub fn reschedule(
        &self,
        progress: &mut Progress,
        current_order: SlotOrder,
        new_start_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<usize> {
        self.walk(
            progress,
            current_order,
            new_start_date,
            AdjustmentMode::Reschedule,
            today,
        )
    }

    /// Re-place the slots after a just-completed one.
    pub fn after_completion(
        &self,
        progress: &mut Progress,
        completed: &ReviewSlot,
        today: NaiveDate,
    ) -> Result<usize> {
        let anchor = completed.review_date.max(today);
        self.walk(
            progress,
            completed.order,
            anchor,
            AdjustmentMode::AfterCompletion,
            today,
        )
    }

    fn walk(
        &self,
        progress: &mut Progress,
        pivot: SlotOrder,
        anchor: NaiveDate,
        mode: AdjustmentMode,
        today: NaiveDate,
    ) -> Result<usize> {
        if pivot.is_last() {
            return Ok(0);
        }

        let generation = self
            .store
            .find_generation(&progress.id, progress.cycle_state)?;
        let pivot_date = generation
            .iter()
            .find(|slot| slot.order == pivot)
            .map(|slot| slot.review_date);
        let (targets, fixed): (Vec<ReviewSlot>, Vec<ReviewSlot>) = generation
            .into_iter()
            .filter(|slot| slot.order > pivot)
            .partition(|slot| slot.is_pending());

        let coordinator = Coordinator::new(self.store, self.config);
        let mut load = coordinator.load_snapshot(today, anchor)?;
        for slot in &targets {
            load.decrement(slot.review_date);
        }

        let calculator = IntervalCalculator::new(self.config);
        let balancer = LoadBalancer::from_config(self.config);
        // Dates within a generation strictly increase, so nothing lands on or
        // before the pivot even when the anchor is earlier
        let mut previous = pivot_date.map_or(anchor, |day| day.max(anchor));
        let mut changed = Vec::new();

        for mut slot in targets {
            // Completed or skipped slots in between keep their date and still
            // bound the ones after them
            if let Some(bound) = fixed
                .iter()
                .filter(|f| f.order < slot.order)
                .map(|f| f.review_date)
                .max()
            {
                previous = previous.max(bound);
            }

            let index = slot.order.index();
            let raw = calculator.target_date(progress, index, anchor, mode);
            let spaced = match self.config.min_gap_before(index) {
                Some(gap) => enforce_min_gap(raw, previous, gap),
                None => raw,
            };
            let settled = balancer.settle(spaced, &load, today);

            load.increment(settled);
            previous = settled;

            if settled != slot.review_date {
                tracing::debug!(
                    progress_id = %progress.id,
                    order = slot.order.get(),
                    from = %slot.review_date,
                    to = %settled,
                    "Slot moved"
                );
                slot.review_date = settled;
                changed.push(slot);
            }
        }

        if !changed.is_empty() {
            self.store.save_all(&changed)?;
        }
        coordinator.refresh_due_date(progress)?;

        Ok(changed.len())
    }
}

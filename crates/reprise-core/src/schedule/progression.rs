//! Cycle Progression
//!
//! Advances a progress to its next cycle once every slot of the current
//! generation is completed, then generates the next generation anchored on
//! the day after the last completion.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Coordinator;
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::model::{CycleState, Progress, ReviewSlot, SlotStatus};
use crate::storage::Store;

/// Record of one cycle transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleAdvance {
    pub from: CycleState,
    pub to: CycleState,
    /// Day logged as the start of `to`
    pub started_on: NaiveDate,
    /// Anchor the new generation was built from
    pub anchor: NaiveDate,
    /// Slots of the new generation
    pub slots: Vec<ReviewSlot>,
}

/// Completion check and cycle advancement
pub struct CycleProgression<'a, S: Store + ?Sized> {
    store: &'a S,
    config: &'a SchedulerConfig,
}

impl<'a, S: Store + ?Sized> CycleProgression<'a, S> {
    pub fn new(store: &'a S, config: &'a SchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Advance `progress` if its current generation is fully completed.
    ///
    /// Returns `None` when there are no slots, some are still open (skipped
    /// slots count as open), or the cycle is terminal.
    pub fn check_and_advance(
        &self,
        progress: &mut Progress,
        today: NaiveDate,
    ) -> Result<Option<CycleAdvance>> {
        let current = progress.cycle_state;
        let total = self.store.count_total(&progress.id, current)?;
        if total == 0 {
            return Ok(None);
        }
        let completed = self
            .store
            .count_by_status(&progress.id, current, SlotStatus::Completed)?;
        if completed < total {
            return Ok(None);
        }
        if current.is_terminal() {
            tracing::debug!(progress_id = %progress.id, "Terminal cycle completed, staying put");
            return Ok(None);
        }

        let next = current.next();
        let mut finished = self.store.find_generation(&progress.id, current)?;

        let anchor = finished
            .iter()
            .filter(|slot| slot.status == SlotStatus::Completed)
            .map(ReviewSlot::effective_completion_date)
            .max()
            .map(|last| last + Days::new(1))
            .or(progress.first_learning_date)
            .unwrap_or(today);

        // Counts said complete; close anything a concurrent writer reopened
        let mut forced = Vec::new();
        for slot in finished.iter_mut().filter(|s| s.status != SlotStatus::Completed) {
            slot.complete(today);
            forced.push(slot.clone());
        }
        if !forced.is_empty() {
            tracing::warn!(
                progress_id = %progress.id,
                count = forced.len(),
                "Force-completing leftover slots of finished cycle"
            );
            self.store.save_all(&forced)?;
        }

        self.store.append(&progress.id, next, today)?;
        progress.cycle_state = next;
        self.store.save_progress(progress)?;

        let coordinator = Coordinator::new(self.store, self.config);
        let slots = coordinator.generate_and_save(progress, anchor, today)?;
        coordinator.refresh_due_date(progress)?;

        tracing::info!(
            progress_id = %progress.id,
            from = %current,
            to = %next,
            %anchor,
            slots = slots.len(),
            "Cycle advanced"
        );

        Ok(Some(CycleAdvance {
            from: current,
            to: next,
            started_on: today,
            anchor,
            slots,
        }))
    }
}

//! Schedule Coordinator
//!
//! Owns the bookkeeping around generation:
//! - bootstrapping the first cycle (first learning date + `FirstTime` log entry)
//! - the denormalized `next_due_date` cache
//! - the effective start date of the current cycle
//! - the load snapshot handed to the balancer

use chrono::{Days, NaiveDate};

use super::{DateLoad, ScheduleGenerator};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::model::{CycleState, Progress, ReviewSlot};
use crate::storage::Store;

/// Bootstrap, due-date and snapshot bookkeeping over a store
pub struct Coordinator<'a, S: Store + ?Sized> {
    store: &'a S,
    config: &'a SchedulerConfig,
}

impl<'a, S: Store + ?Sized> Coordinator<'a, S> {
    pub fn new(store: &'a S, config: &'a SchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Start the first cycle if it was never logged.
    ///
    /// Sets `first_learning_date` (today when unset) and logs a `FirstTime`
    /// entry at that date. Returns whether anything was written.
    pub fn bootstrap(&self, progress: &mut Progress, today: NaiveDate) -> Result<bool> {
        if self
            .store
            .latest_start_for(&progress.id, CycleState::FirstTime)?
            .is_some()
        {
            return Ok(false);
        }

        let started = *progress.first_learning_date.get_or_insert(today);
        self.store.save_progress(progress)?;
        self.store.append(&progress.id, CycleState::FirstTime, started)?;

        tracing::debug!(progress_id = %progress.id, %started, "First cycle bootstrapped");
        Ok(true)
    }

    /// Recompute `next_due_date` from pending slots, saving only on change.
    pub fn refresh_due_date(&self, progress: &mut Progress) -> Result<bool> {
        let earliest = self
            .store
            .find_pending(&progress.id)?
            .iter()
            .map(|slot| slot.review_date)
            .min();

        if earliest == progress.next_due_date {
            return Ok(false);
        }

        progress.next_due_date = earliest;
        self.store.save_progress(progress)?;
        Ok(true)
    }

    /// When the current cycle started.
    ///
    /// Latest log entry for the current state, else the first learning date,
    /// else today. The last fallback means data is missing.
    pub fn effective_start_date(&self, progress: &Progress, today: NaiveDate) -> Result<NaiveDate> {
        if let Some(start) = self
            .store
            .latest_start_for(&progress.id, progress.cycle_state)?
        {
            return Ok(start);
        }
        if let Some(first) = progress.first_learning_date {
            return Ok(first);
        }

        tracing::warn!(
            progress_id = %progress.id,
            cycle = %progress.cycle_state,
            "No cycle log entry or first learning date, starting from today"
        );
        Ok(today)
    }

    /// Population-wide load from today through the reach of `anchor`.
    ///
    /// Covers every day the balancer could pick for a slot anchored at
    /// `anchor`; an empty result means no load anywhere.
    pub fn load_snapshot(&self, today: NaiveDate, anchor: NaiveDate) -> Result<DateLoad> {
        let reach = u64::from(self.config.load_window_days)
            .max(u64::from(self.config.max_date_constraint_days))
            + u64::from(self.config.search_window_days);
        let end = anchor.max(today) + Days::new(reach);
        Ok(self.store.count_by_date_range(today, end)?)
    }

    /// Generate and persist slots for the current cycle anchored at `base`.
    ///
    /// If the current generation already has slots they are returned
    /// unchanged: order values are unique within a generation.
    pub fn generate_and_save(
        &self,
        progress: &Progress,
        base: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<ReviewSlot>> {
        let existing = self
            .store
            .find_generation(&progress.id, progress.cycle_state)?;
        if !existing.is_empty() {
            tracing::debug!(
                progress_id = %progress.id,
                cycle = %progress.cycle_state,
                "Generation already exists, not regenerating"
            );
            return Ok(existing);
        }

        let load = self.load_snapshot(today, base)?;
        let slots = ScheduleGenerator::new(self.config).generate(progress, base, &load, today);
        if !slots.is_empty() {
            self.store.save_all(&slots)?;
        }
        Ok(slots)
    }

    /// Make sure the progress has a bootstrapped, populated current cycle.
    pub fn ensure_schedule(&self, progress: &mut Progress, today: NaiveDate) -> Result<Vec<ReviewSlot>> {
        self.bootstrap(progress, today)?;

        let base = self.effective_start_date(progress, today)?;
        let slots = self.generate_and_save(progress, base, today)?;
        self.refresh_due_date(progress)?;
        Ok(slots)
    }
}

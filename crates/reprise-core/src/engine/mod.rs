//! Engine - the public entry point
//!
//! Wires the scheduling components to a store and a clock, and serializes
//! mutations per progress record. Every mutating operation runs its whole
//! read-modify-write sequence under that progress's lock.
//!
//! The load histogram is read without any global lock. Two learners
//! scheduled at the same moment may both see a day as free, so the
//! threshold is a soft target and can be exceeded by concurrent writers.

mod locks;

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::model::{CycleLogEntry, LearningUnit, Progress, ReviewSlot, SlotOrder, SlotStatus};
use crate::schedule::{Coordinator, CycleAdvance, CycleProgression, DateLoad, Rescheduler};
use crate::storage::Store;

pub use locks::ProgressLocks;

/// What completing a slot did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// The slot as stored after completion
    pub slot: ReviewSlot,
    /// Later slots whose date moved
    pub rescheduled: usize,
    /// Set when this completion finished the cycle
    pub advance: Option<CycleAdvance>,
    /// Progress after all updates
    pub progress: Progress,
}

/// Scheduling engine over a store
pub struct Engine<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    locks: ProgressLocks,
}

impl<S: Store> Engine<S> {
    /// Create an engine, rejecting invalid configuration
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            locks: ProgressLocks::new(),
        })
    }

    /// Engine with the default configuration
    pub fn with_defaults(store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(store, clock, SchedulerConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Today according to the injected clock
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Start tracking `unit` for `learner_id` and schedule its first cycle.
    pub fn start_progress(
        &self,
        learner_id: &str,
        unit: LearningUnit,
        first_learning_date: Option<NaiveDate>,
    ) -> Result<Progress> {
        require("learner id", learner_id)?;
        require("unit id", &unit.id)?;
        let today = self.today();
        if let Some(day) = first_learning_date {
            self.check_anchor("first learning date", day, today)?;
        }
        let pair_key = format!("{}\u{1f}{}", learner_id, unit.id);

        self.locks.with_lock(&pair_key, || {
            if self.store.exists_for_learner_and_unit(learner_id, &unit.id)? {
                return Err(SchedulerError::AlreadyExists {
                    learner_id: learner_id.to_string(),
                    unit_id: unit.id.clone(),
                });
            }

            let mut progress = Progress::new(learner_id, unit.clone());
            progress.first_learning_date = first_learning_date;
            self.store.save_progress(&progress)?;

            let slots = self.coordinator().ensure_schedule(&mut progress, today)?;
            tracing::info!(
                progress_id = %progress.id,
                learner_id,
                unit_id = %progress.unit.id,
                slots = slots.len(),
                next_due = ?progress.next_due_date,
                "Progress started"
            );
            Ok(progress)
        })
    }

    /// Bootstrap and populate the current cycle if needed. Idempotent.
    pub fn ensure_schedule(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        require("progress id", progress_id)?;
        let today = self.today();

        self.locks.with_lock(progress_id, || {
            let mut progress = self.load_progress(progress_id)?;
            self.coordinator().ensure_schedule(&mut progress, today)
        })
    }

    /// Mark a slot of the current cycle completed today.
    ///
    /// Later pending slots are re-placed, then the cycle advances if this
    /// was the last open slot. Completing an already completed slot changes
    /// nothing.
    pub fn complete_slot(&self, progress_id: &str, order: SlotOrder) -> Result<CompletionOutcome> {
        require("progress id", progress_id)?;
        let today = self.today();

        self.locks.with_lock(progress_id, || {
            let mut progress = self.load_progress(progress_id)?;
            let mut slot = self.find_slot(&progress, order)?;

            let rescheduled = if slot.status == SlotStatus::Completed {
                tracing::debug!(progress_id, order = order.get(), "Slot already completed");
                0
            } else {
                slot.complete(today);
                self.store.save_all(std::slice::from_ref(&slot))?;
                self.rescheduler()
                    .after_completion(&mut progress, &slot, today)?
            };

            let advance = self.progression().check_and_advance(&mut progress, today)?;
            self.coordinator().refresh_due_date(&mut progress)?;

            tracing::info!(
                progress_id,
                order = order.get(),
                rescheduled,
                advanced = advance.is_some(),
                "Slot completed"
            );

            Ok(CompletionOutcome {
                slot,
                rescheduled,
                advance,
                progress,
            })
        })
    }

    /// Mark a pending slot of the current cycle skipped.
    ///
    /// A skipped slot keeps the cycle open until it is completed.
    pub fn skip_slot(&self, progress_id: &str, order: SlotOrder) -> Result<Progress> {
        require("progress id", progress_id)?;

        self.locks.with_lock(progress_id, || {
            let mut progress = self.load_progress(progress_id)?;
            let mut slot = self.find_slot(&progress, order)?;

            match slot.status {
                SlotStatus::Completed => {
                    return Err(SchedulerError::Precondition(format!(
                        "slot {} is already completed",
                        order
                    )));
                }
                SlotStatus::Skipped => return Ok(progress),
                SlotStatus::NotStarted => {}
            }

            slot.skip();
            self.store.save_all(std::slice::from_ref(&slot))?;
            self.coordinator().refresh_due_date(&mut progress)?;

            tracing::info!(progress_id, order = order.get(), "Slot skipped");
            Ok(progress)
        })
    }

    /// Move every pending slot after `current_order`, anchored at
    /// `new_start_date`. Returns how many slots moved.
    pub fn reschedule(
        &self,
        progress_id: &str,
        current_order: SlotOrder,
        new_start_date: NaiveDate,
    ) -> Result<usize> {
        require("progress id", progress_id)?;
        let today = self.today();
        self.check_anchor("new start date", new_start_date, today)?;

        self.locks.with_lock(progress_id, || {
            let mut progress = self.load_progress(progress_id)?;
            self.find_slot(&progress, current_order)?;

            let moved = self
                .rescheduler()
                .reschedule(&mut progress, current_order, new_start_date, today)?;
            tracing::info!(
                progress_id,
                after = current_order.get(),
                %new_start_date,
                moved,
                "Schedule moved"
            );
            Ok(moved)
        })
    }

    /// Record the learner's completion percentage.
    ///
    /// Takes effect on the next reschedule or generation; existing dates stay.
    pub fn set_percent_complete(&self, progress_id: &str, percent: u8) -> Result<Progress> {
        require("progress id", progress_id)?;
        if percent > 100 {
            return Err(SchedulerError::Precondition(format!(
                "percent complete must be 0..=100, got {}",
                percent
            )));
        }

        self.locks.with_lock(progress_id, || {
            let mut progress = self.load_progress(progress_id)?;
            if progress.percent_complete != percent {
                progress.percent_complete = percent;
                self.store.save_progress(&progress)?;
            }
            Ok(progress)
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn progress(&self, progress_id: &str) -> Result<Progress> {
        require("progress id", progress_id)?;
        self.load_progress(progress_id)
    }

    /// Full slot history, by cycle then order
    pub fn slots(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        require("progress id", progress_id)?;
        Ok(self.store.find_all_ordered(progress_id)?)
    }

    /// Slots of the current cycle, by order
    pub fn current_slots(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        let progress = self.progress(progress_id)?;
        Ok(self
            .store
            .find_generation(&progress.id, progress.cycle_state)?)
    }

    pub fn cycle_log(&self, progress_id: &str) -> Result<Vec<CycleLogEntry>> {
        require("progress id", progress_id)?;
        Ok(self.store.entries_for(progress_id)?)
    }

    /// Progress records due on or before `on` (today when `None`)
    pub fn due(&self, on: Option<NaiveDate>) -> Result<Vec<Progress>> {
        let on = on.unwrap_or_else(|| self.today());
        Ok(self.store.list_due(on)?)
    }

    /// Pending reviews per day from today through `days` ahead
    pub fn load(&self, days: u32) -> Result<DateLoad> {
        let today = self.today();
        Ok(self
            .store
            .count_by_date_range(today, today + Days::new(u64::from(days)))?)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn coordinator(&self) -> Coordinator<'_, S> {
        Coordinator::new(&*self.store, &self.config)
    }

    fn rescheduler(&self) -> Rescheduler<'_, S> {
        Rescheduler::new(&*self.store, &self.config)
    }

    fn progression(&self) -> CycleProgression<'_, S> {
        CycleProgression::new(&*self.store, &self.config)
    }

    /// A cycle anchored at `day` must stay inside the calendar
    fn check_anchor(&self, name: &str, day: NaiveDate, today: NaiveDate) -> Result<()> {
        let horizon = Days::new(self.config.horizon_days());
        if day.max(today).checked_add_days(horizon).is_none() {
            return Err(SchedulerError::Precondition(format!(
                "{} {} is too far in the future to schedule from",
                name, day
            )));
        }
        Ok(())
    }

    fn load_progress(&self, progress_id: &str) -> Result<Progress> {
        self.store
            .get_progress(progress_id)?
            .ok_or_else(|| SchedulerError::ProgressNotFound(progress_id.to_string()))
    }

    fn find_slot(&self, progress: &Progress, order: SlotOrder) -> Result<ReviewSlot> {
        self.store
            .find_generation(&progress.id, progress.cycle_state)?
            .into_iter()
            .find(|slot| slot.order == order)
            .ok_or_else(|| SchedulerError::SlotNotFound {
                progress_id: progress.id.clone(),
                cycle: progress.cycle_state,
                order,
            })
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SchedulerError::Precondition(format!("{} must not be empty", name)));
    }
    Ok(())
}

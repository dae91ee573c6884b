//! In-process store
//!
//! Backs tests, benches and short-lived embedders. Every operation takes one
//! lock over all three tables, so each call is atomic on its own.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::{CycleLog, ProgressStore, Result, SlotStore, StorageError};
use crate::model::{CycleLogEntry, CycleState, Progress, ReviewSlot, SlotStatus, latest_start};
use crate::schedule::DateLoad;

#[derive(Default)]
struct Tables {
    progress: HashMap<String, Progress>,
    slots: HashMap<String, ReviewSlot>,
    cycle_log: Vec<CycleLogEntry>,
    slot_writes: usize,
}

/// `HashMap`-backed store
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slot rows written so far
    pub fn slot_writes(&self) -> usize {
        self.lock().map(|t| t.slot_writes).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Init("Store lock poisoned".into()))
    }
}

impl ProgressStore for MemoryStore {
    fn get_progress(&self, id: &str) -> Result<Option<Progress>> {
        Ok(self.lock()?.progress.get(id).cloned())
    }

    fn save_progress(&self, progress: &Progress) -> Result<()> {
        self.lock()?
            .progress
            .insert(progress.id.clone(), progress.clone());
        Ok(())
    }

    fn exists_for_learner_and_unit(&self, learner_id: &str, unit_id: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .progress
            .values()
            .any(|p| p.learner_id == learner_id && p.unit.id == unit_id))
    }

    fn list_due(&self, on: NaiveDate) -> Result<Vec<Progress>> {
        let tables = self.lock()?;
        let mut due: Vec<Progress> = tables
            .progress
            .values()
            .filter(|p| p.next_due_date.is_some_and(|d| d <= on))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_due_date.cmp(&b.next_due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }
}

impl SlotStore for MemoryStore {
    fn count_total(&self, progress_id: &str, cycle: CycleState) -> Result<usize> {
        Ok(self
            .lock()?
            .slots
            .values()
            .filter(|s| s.progress_id == progress_id && s.cycle == cycle)
            .count())
    }

    fn count_by_status(
        &self,
        progress_id: &str,
        cycle: CycleState,
        status: SlotStatus,
    ) -> Result<usize> {
        Ok(self
            .lock()?
            .slots
            .values()
            .filter(|s| s.progress_id == progress_id && s.cycle == cycle && s.status == status)
            .count())
    }

    fn find_all_ordered(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        let tables = self.lock()?;
        let mut slots: Vec<ReviewSlot> = tables
            .slots
            .values()
            .filter(|s| s.progress_id == progress_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.cycle, s.order));
        Ok(slots)
    }

    fn find_generation(&self, progress_id: &str, cycle: CycleState) -> Result<Vec<ReviewSlot>> {
        let tables = self.lock()?;
        let mut slots: Vec<ReviewSlot> = tables
            .slots
            .values()
            .filter(|s| s.progress_id == progress_id && s.cycle == cycle)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.order);
        Ok(slots)
    }

    fn find_pending(&self, progress_id: &str) -> Result<Vec<ReviewSlot>> {
        let tables = self.lock()?;
        let mut slots: Vec<ReviewSlot> = tables
            .slots
            .values()
            .filter(|s| s.progress_id == progress_id && s.is_pending())
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.review_date, s.order));
        Ok(slots)
    }

    fn save_all(&self, slots: &[ReviewSlot]) -> Result<()> {
        let mut tables = self.lock()?;

        // Same uniqueness rule as the SQLite schema; reject the whole batch
        for slot in slots {
            let clash = tables.slots.values().any(|s| {
                s.id != slot.id
                    && s.progress_id == slot.progress_id
                    && s.cycle == slot.cycle
                    && s.order == slot.order
            });
            if clash {
                return Err(StorageError::InvalidData(format!(
                    "Duplicate slot {} in cycle {} for progress {}",
                    slot.order, slot.cycle, slot.progress_id
                )));
            }
        }

        for slot in slots {
            tables.slots.insert(slot.id.clone(), slot.clone());
        }
        tables.slot_writes += slots.len();
        Ok(())
    }

    fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DateLoad> {
        Ok(self
            .lock()?
            .slots
            .values()
            .filter(|s| s.is_pending() && s.review_date >= start && s.review_date <= end)
            .fold(DateLoad::new(), |mut load, s| {
                load.increment(s.review_date);
                load
            }))
    }
}

impl CycleLog for MemoryStore {
    fn append(&self, progress_id: &str, state: CycleState, start_date: NaiveDate) -> Result<()> {
        self.lock()?
            .cycle_log
            .push(CycleLogEntry::new(progress_id, state, start_date));
        Ok(())
    }

    fn latest_start_for(&self, progress_id: &str, state: CycleState) -> Result<Option<NaiveDate>> {
        let tables = self.lock()?;
        let entries: Vec<CycleLogEntry> = tables
            .cycle_log
            .iter()
            .filter(|e| e.progress_id == progress_id)
            .cloned()
            .collect();
        Ok(latest_start(&entries, state))
    }

    fn entries_for(&self, progress_id: &str) -> Result<Vec<CycleLogEntry>> {
        Ok(self
            .lock()?
            .cycle_log
            .iter()
            .filter(|e| e.progress_id == progress_id)
            .cloned()
            .collect())
    }
}

//! Storage Module
//!
//! The engine reads and writes through three narrow interfaces:
//! - `ProgressStore`: progress records and their due-date cache
//! - `SlotStore`: review slots plus the population-wide load histogram
//! - `CycleLog`: append-only cycle start records
//!
//! Two implementations ship with the crate: `MemoryStore` (in-process) and
//! `SqliteStore` (SQLite with WAL and versioned migrations).

mod memory;
mod migrations;
mod sqlite;

use chrono::NaiveDate;

use crate::model::{CycleLogEntry, CycleState, Progress, ReviewSlot, SlotStatus};
use crate::schedule::DateLoad;

pub use memory::MemoryStore;
pub use migrations::MIGRATIONS;
pub use sqlite::SqliteStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Stored value has an unexpected shape
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORE INTERFACES
// ============================================================================

/// Progress records
pub trait ProgressStore: Send + Sync {
    /// Progress by id
    fn get_progress(&self, id: &str) -> Result<Option<Progress>>;

    /// Insert or replace a progress record
    fn save_progress(&self, progress: &Progress) -> Result<()>;

    /// Whether the learner already tracks the unit
    fn exists_for_learner_and_unit(&self, learner_id: &str, unit_id: &str) -> Result<bool>;

    /// Progress records whose cached due date is on or before `on`,
    /// earliest first
    fn list_due(&self, on: NaiveDate) -> Result<Vec<Progress>>;
}

/// Review slots.
///
/// Counting and generation queries are scoped to one generation, identified
/// by `(progress_id, cycle)`; order values repeat across generations.
pub trait SlotStore: Send + Sync {
    /// Slots in one generation
    fn count_total(&self, progress_id: &str, cycle: CycleState) -> Result<usize>;

    /// Slots in one generation with the given status
    fn count_by_status(&self, progress_id: &str, cycle: CycleState, status: SlotStatus)
        -> Result<usize>;

    /// Full slot history of a progress, by cycle then order
    fn find_all_ordered(&self, progress_id: &str) -> Result<Vec<ReviewSlot>>;

    /// Slots of one generation, by order
    fn find_generation(&self, progress_id: &str, cycle: CycleState) -> Result<Vec<ReviewSlot>>;

    /// `NotStarted` slots of a progress, by review date then order
    fn find_pending(&self, progress_id: &str) -> Result<Vec<ReviewSlot>>;

    /// Insert or update slots by id
    fn save_all(&self, slots: &[ReviewSlot]) -> Result<()>;

    /// Pending reviews per day across all learners, `start..=end`
    fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DateLoad>;
}

/// Append-only cycle log
pub trait CycleLog: Send + Sync {
    /// Record that `state` started on `start_date`
    fn append(&self, progress_id: &str, state: CycleState, start_date: NaiveDate) -> Result<()>;

    /// Latest start date recorded for `state`
    fn latest_start_for(&self, progress_id: &str, state: CycleState) -> Result<Option<NaiveDate>>;

    /// All entries of a progress in insertion order
    fn entries_for(&self, progress_id: &str) -> Result<Vec<CycleLogEntry>>;
}

/// Everything the engine needs from persistence
pub trait Store: ProgressStore + SlotStore + CycleLog {}

impl<T: ProgressStore + SlotStore + CycleLog> Store for T {}

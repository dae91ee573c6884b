//! Scheduler error types

use crate::model::{CycleState, SlotOrder};
use crate::storage::StorageError;

/// Errors surfaced by the scheduling engine.
///
/// `Precondition` and `InvalidConfig` are programming errors: the caller
/// passed something the engine can never accept. They are not retried.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// No progress with this id
    #[error("Progress not found: {0}")]
    ProgressNotFound(String),
    /// No slot with this order in the current generation
    #[error("Slot {order} not found for progress {progress_id} in cycle {cycle}")]
    SlotNotFound {
        progress_id: String,
        cycle: CycleState,
        order: SlotOrder,
    },
    /// Learner already tracks this unit
    #[error("Progress already exists for learner {learner_id} and unit {unit_id}")]
    AlreadyExists { learner_id: String, unit_id: String },
    /// Missing or out-of-range argument
    #[error("Precondition violated: {0}")]
    Precondition(String),
    /// Configuration rejected at construction
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

/// Scheduler result type
pub type Result<T> = std::result::Result<T, SchedulerError>;

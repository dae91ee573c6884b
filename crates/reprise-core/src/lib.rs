//! # Reprise Core
//!
//! Repetition scheduling engine. Decides *when* a learner should revisit a
//! learning unit:
//!
//! - **Review Cycles**: five-state progression from first exposure to
//!   long-term maintenance, each cycle owning five review slots
//! - **Interval Calculation**: per-slot intervals scaled by unit size,
//!   cycle depth and the learner's reported completion
//! - **Load Balancing**: review dates nudged off days that are already busy
//!   across the whole learner population
//! - **Retroactive Rescheduling**: completing a review late or early re-places
//!   the remaining slots of the cycle
//! - **Cycle Log**: append-only record of when each cycle started
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reprise_core::{Engine, LearningUnit, SlotOrder, SqliteStore, SystemClock};
//!
//! # fn main() -> reprise_core::Result<()> {
//! // Open the store (platform data directory when no path is given)
//! let store = Arc::new(SqliteStore::new(None)?);
//! let engine = Engine::with_defaults(store, Arc::new(SystemClock))?;
//!
//! // Track a unit and schedule its first cycle
//! let progress = engine.start_progress("learner-1", LearningUnit::new("unit-42", 180), None)?;
//!
//! // The learner did the first review
//! let outcome = engine.complete_slot(&progress.id, SlotOrder::FIRST)?;
//! println!("next due: {:?}", outcome.progress.next_due_date);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): SQLite compiled into the crate
//! - `encryption`: SQLCipher instead of SQLite; key from `REPRISE_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod schedule;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DEFAULT_INTERVAL_MULTIPLIERS, DEFAULT_MIN_GAPS, SchedulerConfig};
pub use engine::{CompletionOutcome, Engine, ProgressLocks};
pub use error::{Result, SchedulerError};
pub use model::{
    CycleLogEntry, CycleState, LearningUnit, Progress, ReviewSlot, SLOTS_PER_CYCLE, SlotOrder,
    SlotStatus,
};
pub use schedule::{
    AdjustmentMode, Coordinator, CycleAdvance, CycleProgression, DateLoad, IntervalCalculator,
    LoadBalancer, Rescheduler, ScheduleGenerator,
};
pub use storage::{
    CycleLog, MemoryStore, ProgressStore, SlotStore, SqliteStore, Store, StorageError,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Clock, CycleState, Engine, LearningUnit, Progress, ReviewSlot, SchedulerConfig,
        SchedulerError, SlotOrder, SlotStatus, SqliteStore, Store, SystemClock,
    };
}

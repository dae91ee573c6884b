//! Model module - Core types of the scheduling engine
//!
//! - Progress records with their cycle state and due-date cache
//! - The append-only cycle log
//! - Review slots grouped into per-cycle generations

mod cycle;
mod progress;
mod slot;

pub use cycle::{latest_start, CycleLogEntry, CycleState};
pub use progress::{LearningUnit, Progress};
pub use slot::{ReviewSlot, SlotOrder, SlotStatus, SLOTS_PER_CYCLE};

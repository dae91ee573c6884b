//! Test Engine Manager
//!
//! Provides isolated engine instances for testing:
//! - Temporary SQLite databases that are automatically cleaned up
//! - A fixed, settable clock so journeys can walk through calendar time
//! - Helpers that act like a learner doing their reviews

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use reprise_core::{
    CompletionOutcome, Engine, FixedClock, LearningUnit, Progress, ReviewSlot, SchedulerConfig,
    SqliteStore,
};
use tempfile::TempDir;

/// Engine over a temporary database
///
/// # Example
///
/// ```rust,ignore
/// let t = TestEngine::new_temp(day(2024, 1, 1));
/// let p = t.start("alice", "unit-1", 100);
/// t.complete_next(&p.id);
/// // Database is automatically deleted when `t` goes out of scope
/// ```
pub struct TestEngine {
    /// The engine under test
    pub engine: Arc<Engine<SqliteStore>>,
    /// Clock shared with the engine
    pub clock: Arc<FixedClock>,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestEngine {
    /// Default configuration, clock set to `today`
    pub fn new_temp(today: NaiveDate) -> Self {
        Self::with_config(today, SchedulerConfig::default())
    }

    /// Custom configuration, clock set to `today`
    pub fn with_config(today: NaiveDate, config: SchedulerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_reprise.db");
        let mut engine = Self::open(&db_path, today, config);
        engine._temp_dir = Some(temp_dir);
        engine
    }

    /// Open a database at a specific path. Not deleted afterwards.
    pub fn open(path: &Path, today: NaiveDate, config: SchedulerConfig) -> Self {
        let store = SqliteStore::new(Some(path.to_path_buf())).expect("Failed to create test store");
        let clock = Arc::new(FixedClock::new(today));
        let engine = Engine::new(Arc::new(store), clock.clone(), config).expect("Invalid config");

        Self {
            engine: Arc::new(engine),
            clock,
            _temp_dir: None,
            db_path: path.to_path_buf(),
        }
    }

    /// Reopen the same database file with a fresh engine
    pub fn reopen(&self) -> Self {
        Self::open(&self.db_path, self.today(), self.engine.config().clone())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn today(&self) -> NaiveDate {
        self.engine.today()
    }

    pub fn set_today(&self, day: NaiveDate) {
        self.clock.set(day);
    }

    /// Start tracking a unit, first learning date defaulting to today
    pub fn start(&self, learner: &str, unit: &str, size: u32) -> Progress {
        self.engine
            .start_progress(learner, LearningUnit::new(unit, size), None)
            .expect("Failed to start progress")
    }

    pub fn progress(&self, progress_id: &str) -> Progress {
        self.engine.progress(progress_id).expect("Progress missing")
    }

    pub fn current_slots(&self, progress_id: &str) -> Vec<ReviewSlot> {
        self.engine
            .current_slots(progress_id)
            .expect("Failed to read slots")
    }

    /// Earliest pending slot of the current cycle
    pub fn next_slot(&self, progress_id: &str) -> Option<ReviewSlot> {
        self.current_slots(progress_id)
            .into_iter()
            .filter(|s| s.is_pending())
            .min_by_key(|s| (s.review_date, s.order))
    }

    /// Move the clock to the next pending review and complete it on time
    pub fn complete_next(&self, progress_id: &str) -> CompletionOutcome {
        let slot = self.next_slot(progress_id).expect("Nothing pending");
        self.set_today(slot.review_date.max(self.today()));
        self.engine
            .complete_slot(progress_id, slot.order)
            .expect("Failed to complete slot")
    }

    /// Complete every slot of the current cycle on its due date
    pub fn finish_cycle(&self, progress_id: &str) -> CompletionOutcome {
        loop {
            let outcome = self.complete_next(progress_id);
            if outcome.advance.is_some() || self.next_slot(progress_id).is_none() {
                return outcome;
            }
        }
    }
}

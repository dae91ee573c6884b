//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Learners with units of assorted sizes
//! - Batch generation for load and concurrency tests
//! - Crowded calendar days written straight into the store

use chrono::NaiveDate;
use reprise_core::{
    CycleState, Engine, LearningUnit, Progress, ProgressStore, ReviewSlot, SlotOrder, SlotStore,
    SqliteStore,
};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let t = TestEngine::new_temp(day(2024, 1, 1));
///
/// // Thirty learners on the same unit
/// let batch = TestDataFactory::start_batch(&t.engine, &BatchConfig::default());
///
/// // Four other reviews already booked on Jan 3rd
/// TestDataFactory::crowd_day(&t.engine, day(2024, 1, 3), 4);
/// ```
pub struct TestDataFactory;

/// Configuration for batch progress generation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of learners to create
    pub count: usize,
    /// Learner id prefix
    pub learner_prefix: String,
    /// Unit every learner studies
    pub unit_id: String,
    /// Unit sizes, cycled through per learner
    pub sizes: Vec<u32>,
    /// First learning date (None = today)
    pub first_learning_date: Option<NaiveDate>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 30,
            learner_prefix: "learner".to_string(),
            unit_id: "unit-1".to_string(),
            sizes: vec![100],
            first_learning_date: None,
        }
    }
}

impl TestDataFactory {
    /// Short unit, long unit, and one in the middle
    pub fn assorted_sizes() -> Vec<u32> {
        vec![20, 100, 180, 260, 900]
    }

    /// Start one progress per learner described by `config`
    pub fn start_batch(engine: &Engine<SqliteStore>, config: &BatchConfig) -> Vec<Progress> {
        (0..config.count)
            .map(|i| {
                let size = config.sizes[i % config.sizes.len().max(1)];
                engine
                    .start_progress(
                        &format!("{}-{}", config.learner_prefix, i),
                        LearningUnit::new(config.unit_id.clone(), size),
                        config.first_learning_date,
                    )
                    .expect("Failed to start progress")
            })
            .collect()
    }

    /// Book `count` pending reviews of unrelated learners on `day`
    pub fn crowd_day(engine: &Engine<SqliteStore>, day: NaiveDate, count: usize) {
        let store = engine.store();
        for _ in 0..count {
            let learner = format!("crowd-{}", uuid::Uuid::new_v4());
            let progress = Progress::new(learner, LearningUnit::new("crowd-unit", 100));
            store.save_progress(&progress).expect("Failed to save crowd progress");
            let slot = ReviewSlot::new(progress.id.as_str(), CycleState::FirstTime, SlotOrder::FIRST, day);
            store.save_all(&[slot]).expect("Failed to save crowd slot");
        }
    }
}

//! Progress - a learner's tracked engagement with one learning unit

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CycleState;

/// The slice of a learning unit the scheduler cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUnit {
    pub id: String,
    /// Word count of the unit; used as the difficulty proxy
    pub size: u32,
}

impl LearningUnit {
    pub fn new(id: impl Into<String>, size: u32) -> Self {
        Self { id: id.into(), size }
    }
}

/// One learner's progress on one learning unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: String,
    pub learner_id: String,
    pub unit: LearningUnit,
    pub cycle_state: CycleState,
    /// Set once, when learning began
    pub first_learning_date: Option<NaiveDate>,
    /// Earliest pending review date; maintained by the coordinator
    pub next_due_date: Option<NaiveDate>,
    /// Completion / mastery signal, 0..=100
    pub percent_complete: u8,
}

impl Progress {
    /// Fresh progress in `FirstTime` with a new id
    pub fn new(learner_id: impl Into<String>, unit: LearningUnit) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.into(),
            unit,
            cycle_state: CycleState::FirstTime,
            first_learning_date: None,
            next_due_date: None,
            percent_complete: 0,
        }
    }

    /// Builder-style first learning date
    pub fn with_first_learning_date(mut self, date: NaiveDate) -> Self {
        self.first_learning_date = Some(date);
        self
    }

    /// Builder-style completion percentage, capped at 100
    pub fn with_percent_complete(mut self, percent: u8) -> Self {
        self.percent_complete = percent.min(100);
        self
    }

    /// Completion as a fraction in `0.0..=1.0`
    #[inline]
    pub fn completion_ratio(&self) -> f64 {
        f64::from(self.percent_complete.min(100)) / 100.0
    }
}

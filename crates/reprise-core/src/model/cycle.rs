//! Review cycles
//!
//! A learner passes through five review cycles per learning unit. Each cycle
//! is one full pass over five scheduled reviews. The cycle state only ever
//! moves forward and `MoreThanThreeReviews` is absorbing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// CYCLE STATE
// ============================================================================

/// Position of a progress record in the fixed cycle sequence.
///
/// | State                  | Depth | Next                   |
/// |------------------------|-------|------------------------|
/// | FirstTime              | 1     | FirstReview            |
/// | FirstReview            | 2     | SecondReview           |
/// | SecondReview           | 3     | ThirdReview            |
/// | ThirdReview            | 4     | MoreThanThreeReviews   |
/// | MoreThanThreeReviews   | 5     | MoreThanThreeReviews   |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleState {
    /// The unit is being learned for the first time
    #[default]
    FirstTime,
    /// First review pass
    FirstReview,
    /// Second review pass
    SecondReview,
    /// Third review pass
    ThirdReview,
    /// Maintenance; terminal
    MoreThanThreeReviews,
}

impl CycleState {
    /// All states in transition order
    pub const ALL: [CycleState; 5] = [
        CycleState::FirstTime,
        CycleState::FirstReview,
        CycleState::SecondReview,
        CycleState::ThirdReview,
        CycleState::MoreThanThreeReviews,
    ];

    /// Transition function. The terminal state maps to itself.
    pub fn next(self) -> CycleState {
        match self {
            CycleState::FirstTime => CycleState::FirstReview,
            CycleState::FirstReview => CycleState::SecondReview,
            CycleState::SecondReview => CycleState::ThirdReview,
            CycleState::ThirdReview => CycleState::MoreThanThreeReviews,
            CycleState::MoreThanThreeReviews => CycleState::MoreThanThreeReviews,
        }
    }

    /// Whether no further transition exists
    #[inline]
    pub fn is_terminal(self) -> bool {
        self.next() == self
    }

    /// Cycle depth used by the interval calculator (1-based)
    pub fn depth(self) -> u32 {
        match self {
            CycleState::FirstTime => 1,
            CycleState::FirstReview => 2,
            CycleState::SecondReview => 3,
            CycleState::ThirdReview => 4,
            CycleState::MoreThanThreeReviews => 5,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::FirstTime => "FIRST_TIME",
            CycleState::FirstReview => "FIRST_REVIEW",
            CycleState::SecondReview => "SECOND_REVIEW",
            CycleState::ThirdReview => "THIRD_REVIEW",
            CycleState::MoreThanThreeReviews => "MORE_THAN_THREE_REVIEWS",
        }
    }

    /// Parse from string name. Unknown names yield `None`; stored data is
    /// never silently coerced to a default state.
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FIRST_TIME" => Some(CycleState::FirstTime),
            "FIRST_REVIEW" => Some(CycleState::FirstReview),
            "SECOND_REVIEW" => Some(CycleState::SecondReview),
            "THIRD_REVIEW" => Some(CycleState::ThirdReview),
            "MORE_THAN_THREE_REVIEWS" => Some(CycleState::MoreThanThreeReviews),
            _ => None,
        }
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_name(s).ok_or_else(|| format!("Unknown cycle state: {}", s))
    }
}

// ============================================================================
// CYCLE LOG
// ============================================================================

/// One append-only record of a cycle starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleLogEntry {
    /// Progress the entry belongs to
    pub progress_id: String,
    /// State that started
    pub cycle_state: CycleState,
    /// Day the state started
    pub start_date: NaiveDate,
}

impl CycleLogEntry {
    pub fn new(progress_id: impl Into<String>, cycle_state: CycleState, start_date: NaiveDate) -> Self {
        Self {
            progress_id: progress_id.into(),
            cycle_state,
            start_date,
        }
    }
}

/// Latest start date recorded for `state` among `entries`.
///
/// This is the projection the coordinator uses to find the effective start
/// of the current cycle; replays and manual corrections may leave several
/// entries for one state and the latest one wins.
pub fn latest_start(entries: &[CycleLogEntry], state: CycleState) -> Option<NaiveDate> {
    entries
        .iter()
        .filter(|e| e.cycle_state == state)
        .map(|e| e.start_date)
        .max()
}

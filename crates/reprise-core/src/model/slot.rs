//! Review slots - the scheduled reviews of one cycle generation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CycleState;

/// Number of review slots generated per cycle
pub const SLOTS_PER_CYCLE: usize = 5;

// ============================================================================
// SLOT ORDER
// ============================================================================

/// Position of a slot within its cycle, `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotOrder(u8);

impl SlotOrder {
    pub const FIRST: SlotOrder = SlotOrder(1);
    pub const LAST: SlotOrder = SlotOrder(SLOTS_PER_CYCLE as u8);

    /// Create an order value, `None` outside `1..=5`
    pub fn new(order: u8) -> Option<Self> {
        if (1..=SLOTS_PER_CYCLE as u8).contains(&order) {
            Some(Self(order))
        } else {
            None
        }
    }

    /// Order for a zero-based slot index
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index + 1).ok().and_then(Self::new)
    }

    /// All orders of a cycle, ascending
    pub fn all() -> impl Iterator<Item = SlotOrder> {
        (1..=SLOTS_PER_CYCLE as u8).map(SlotOrder)
    }

    /// The 1-based value
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index used by the interval calculator
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    #[inline]
    pub fn is_last(self) -> bool {
        self == Self::LAST
    }
}

impl TryFrom<u8> for SlotOrder {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SlotOrder::new(value)
            .ok_or_else(|| format!("Slot order must be between 1 and {}, got {}", SLOTS_PER_CYCLE, value))
    }
}

impl From<SlotOrder> for u8 {
    fn from(order: SlotOrder) -> Self {
        order.0
    }
}

impl std::fmt::Display for SlotOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SLOT STATUS
// ============================================================================

/// Lifecycle status of a review slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    /// Scheduled and still pending
    #[default]
    NotStarted,
    /// Reviewed by the learner (or force-completed on cycle advance)
    Completed,
    /// Passed over by the learner
    Skipped,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::NotStarted => "NOT_STARTED",
            SlotStatus::Completed => "COMPLETED",
            SlotStatus::Skipped => "SKIPPED",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NOT_STARTED" => Some(SlotStatus::NotStarted),
            "COMPLETED" => Some(SlotStatus::Completed),
            "SKIPPED" => Some(SlotStatus::Skipped),
            _ => None,
        }
    }

    #[inline]
    pub fn is_pending(self) -> bool {
        self == SlotStatus::NotStarted
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// REVIEW SLOT
// ============================================================================

/// One scheduled review.
///
/// Slots are never deleted. A slot belongs to the generation identified by
/// `(progress_id, cycle)` and is unique per `order` within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSlot {
    pub id: String,
    pub progress_id: String,
    /// Generation the slot was created for
    pub cycle: CycleState,
    pub order: SlotOrder,
    pub status: SlotStatus,
    pub review_date: NaiveDate,
    /// Day the review was actually done
    pub completed_on: Option<NaiveDate>,
}

impl ReviewSlot {
    /// New pending slot with a fresh id
    pub fn new(
        progress_id: impl Into<String>,
        cycle: CycleState,
        order: SlotOrder,
        review_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            progress_id: progress_id.into(),
            cycle,
            order,
            status: SlotStatus::NotStarted,
            review_date,
            completed_on: None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Mark completed on `day`. Completing twice keeps the first day.
    pub fn complete(&mut self, day: NaiveDate) {
        self.status = SlotStatus::Completed;
        if self.completed_on.is_none() {
            self.completed_on = Some(day);
        }
    }

    pub fn skip(&mut self) {
        self.status = SlotStatus::Skipped;
    }

    /// Day the review happened, falling back to the scheduled day
    pub fn effective_completion_date(&self) -> NaiveDate {
        self.completed_on.unwrap_or(self.review_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_order_bounds() {
        assert!(SlotOrder::new(0).is_none());
        assert!(SlotOrder::new(6).is_none());
        assert_eq!(SlotOrder::new(3).unwrap().index(), 2);
        assert_eq!(SlotOrder::from_index(4), Some(SlotOrder::LAST));
        assert!(SlotOrder::from_index(5).is_none());
        assert_eq!(SlotOrder::all().count(), SLOTS_PER_CYCLE);
        assert!(SlotOrder::try_from(9u8).is_err());
    }

    #[test]
    fn test_complete_keeps_first_day() {
        let day1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut slot = ReviewSlot::new("p", CycleState::FirstTime, SlotOrder::FIRST, day1);
        assert!(slot.is_pending());
        assert_eq!(slot.effective_completion_date(), day1);

        slot.complete(day2);
        slot.complete(day1);
        assert_eq!(slot.status, SlotStatus::Completed);
        assert_eq!(slot.completed_on, Some(day2));
        assert_eq!(slot.effective_completion_date(), day2);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(SlotStatus::parse_name("skipped"), Some(SlotStatus::Skipped));
        assert_eq!(SlotStatus::parse_name("DONE"), None);
        assert_eq!(SlotStatus::NotStarted.to_string(), "NOT_STARTED");
    }
}

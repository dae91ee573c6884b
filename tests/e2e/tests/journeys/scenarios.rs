//! Reference scheduling scenarios

use chrono::Days;
use reprise_core::{CycleState, SlotStatus};
use reprise_e2e_tests::{TestDataFactory, TestEngine};

use super::day;

#[test]
fn test_fresh_unit_first_review_two_days_out() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);

    let slots = t.current_slots(&p.id);
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[0].review_date, day(2024, 1, 3));
    assert!(slots[4].review_date >= slots[3].review_date + Days::new(5));
    assert_eq!(t.progress(&p.id).next_due_date, Some(day(2024, 1, 3)));
}

#[test]
fn test_busy_day_pushes_review_to_first_quiet_day() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    TestDataFactory::crowd_day(&t.engine, day(2024, 1, 3), 5);
    TestDataFactory::crowd_day(&t.engine, day(2024, 1, 5), 1);

    let p = t.start("alice", "unit-1", 100);
    let slots = t.current_slots(&p.id);

    // 2024-01-04 has no recorded load, so the scan lands on 2024-01-05
    assert_eq!(slots[0].review_date, day(2024, 1, 5));
    assert!(slots.windows(2).all(|w| w[0].review_date < w[1].review_date));
}

#[test]
fn test_saturated_week_drifts_one_day() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    for offset in 0..=7 {
        TestDataFactory::crowd_day(&t.engine, day(2024, 1, 3) + Days::new(offset), 4);
    }

    let p = t.start("alice", "unit-1", 100);
    assert_eq!(t.current_slots(&p.id)[0].review_date, day(2024, 1, 4));
}

#[test]
fn test_finished_first_cycle_opens_first_review() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);

    let outcome = t.finish_cycle(&p.id);
    let advance = outcome.advance.expect("cycle should advance");
    let today = t.today();

    assert_eq!(advance.from, CycleState::FirstTime);
    assert_eq!(advance.to, CycleState::FirstReview);
    assert_eq!(advance.started_on, today);

    let log = t.engine.cycle_log(&p.id).unwrap();
    assert_eq!(log.last().map(|e| (e.cycle_state, e.start_date)), Some((CycleState::FirstReview, today)));

    let fresh = t.current_slots(&p.id);
    assert_eq!(fresh.len(), 5);
    assert!(fresh.iter().all(|s| s.status == SlotStatus::NotStarted));
    assert!(fresh.iter().all(|s| s.cycle == CycleState::FirstReview));
    assert!(fresh[0].review_date > today);
}

#[test]
fn test_large_units_space_out_further() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let small = t.start("alice", "short-poem", 40);
    let large = t.start("alice", "long-essay", 600);

    let small_last = t.current_slots(&small.id)[4].review_date;
    let large_last = t.current_slots(&large.id)[4].review_date;
    assert!(large_last > small_last);
    // Offsets never exceed the 60 day clamp plus balancing drift
    assert!(large_last <= day(2024, 1, 1) + Days::new(60 + 5));
}

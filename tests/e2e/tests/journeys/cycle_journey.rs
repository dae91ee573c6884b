//! Walking units through their cycles

use chrono::Days;
use reprise_core::{CycleState, SlotOrder, SlotStatus};
use reprise_e2e_tests::TestEngine;

use super::day;

#[test]
fn test_all_cycles_to_terminal() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 150);

    let mut seen = vec![CycleState::FirstTime];
    for _ in 0..4 {
        let outcome = t.finish_cycle(&p.id);
        let advance = outcome.advance.expect("each finished cycle advances");
        assert_eq!(advance.to, advance.from.next());
        seen.push(advance.to);
    }
    assert_eq!(seen, CycleState::ALL.to_vec());

    // The terminal cycle can be finished but never left
    let outcome = t.finish_cycle(&p.id);
    assert!(outcome.advance.is_none());
    let progress = t.progress(&p.id);
    assert_eq!(progress.cycle_state, CycleState::MoreThanThreeReviews);
    assert_eq!(progress.next_due_date, None);

    assert_eq!(t.engine.slots(&p.id).unwrap().len(), 25);
    let log = t.engine.cycle_log(&p.id).unwrap();
    assert_eq!(log.len(), 5);
    assert!(log.windows(2).all(|w| w[0].start_date <= w[1].start_date));
}

#[test]
fn test_late_review_pushes_rest_of_cycle() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    let before = t.current_slots(&p.id);

    // Due 2024-01-03, done ten days late
    t.set_today(day(2024, 1, 13));
    let outcome = t.engine.complete_slot(&p.id, SlotOrder::FIRST).unwrap();
    assert!(outcome.rescheduled > 0);
    assert_eq!(outcome.slot.completed_on, Some(day(2024, 1, 13)));

    let after = t.current_slots(&p.id);
    assert_eq!(after[0].review_date, before[0].review_date);
    assert!(after[1..].iter().all(|s| s.review_date > day(2024, 1, 13)));
    assert_eq!(t.progress(&p.id).next_due_date, Some(after[1].review_date));
}

#[test]
fn test_early_review_keeps_scheduled_anchor() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);

    // Done on 2024-01-02, a day before it was due; the anchor stays 2024-01-03
    t.set_today(day(2024, 1, 2));
    t.engine.complete_slot(&p.id, SlotOrder::FIRST).unwrap();

    let after = t.current_slots(&p.id);
    assert_eq!(after[1].review_date, day(2024, 1, 3) + Days::new(4));
}

#[test]
fn test_vacation_reschedule_is_idempotent() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    t.complete_next(&p.id);

    let back = day(2024, 2, 1);
    let moved = t.engine.reschedule(&p.id, SlotOrder::FIRST, back).unwrap();
    assert_eq!(moved, 4);
    let settled = t.current_slots(&p.id);
    assert!(settled[1..].iter().all(|s| s.review_date > back));

    assert_eq!(t.engine.reschedule(&p.id, SlotOrder::FIRST, back).unwrap(), 0);
    assert_eq!(t.current_slots(&p.id), settled);
}

#[test]
fn test_completion_signal_shortens_rescheduled_intervals() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let a = t.start("alice", "unit-1", 100);
    let b = t.start("bob", "unit-1", 100);

    t.engine.set_percent_complete(&b.id, 40).unwrap();
    let anchor = day(2024, 3, 1);
    t.engine.reschedule(&a.id, SlotOrder::FIRST, anchor).unwrap();
    t.engine.reschedule(&b.id, SlotOrder::FIRST, anchor).unwrap();

    let last_a = t.current_slots(&a.id)[4].review_date;
    let last_b = t.current_slots(&b.id)[4].review_date;
    assert!(last_b < last_a);
}

#[test]
fn test_skipped_review_holds_the_cycle_open() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);

    t.engine.skip_slot(&p.id, SlotOrder::new(2).unwrap()).unwrap();
    while t.next_slot(&p.id).is_some() {
        assert!(t.complete_next(&p.id).advance.is_none());
    }
    let slots = t.current_slots(&p.id);
    assert_eq!(slots[1].status, SlotStatus::Skipped);
    assert_eq!(t.progress(&p.id).cycle_state, CycleState::FirstTime);

    let outcome = t.engine.complete_slot(&p.id, SlotOrder::new(2).unwrap()).unwrap();
    assert_eq!(outcome.advance.map(|a| a.to), Some(CycleState::FirstReview));
}

#[test]
fn test_reschedule_earlier_than_pivot_keeps_order() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    t.engine.set_percent_complete(&p.id, 50).unwrap();

    // Slot 2 is due 2024-01-05; restart the rest from before it
    t.engine
        .reschedule(&p.id, SlotOrder::new(2).unwrap(), day(2024, 1, 1))
        .unwrap();

    let slots = t.current_slots(&p.id);
    let gaps = &t.engine.config().min_gaps;
    assert!(slots.iter().all(|s| s.status == SlotStatus::NotStarted));
    for (pair, &gap) in slots.windows(2).zip(gaps) {
        assert!(pair[1].review_date >= pair[0].review_date + Days::new(u64::from(gap)));
    }
    assert_eq!(slots[2].review_date, day(2024, 1, 7));
}

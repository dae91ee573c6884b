//! State survives reopening the database

use reprise_core::{CycleState, SlotOrder};
use reprise_e2e_tests::TestEngine;

use super::day;

#[test]
fn test_reopen_preserves_schedule_and_log() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    t.finish_cycle(&p.id);
    t.complete_next(&p.id);

    let reopened = t.reopen();
    assert_eq!(reopened.progress(&p.id), t.progress(&p.id));
    assert_eq!(reopened.current_slots(&p.id), t.current_slots(&p.id));
    assert_eq!(
        reopened.engine.cycle_log(&p.id).unwrap(),
        t.engine.cycle_log(&p.id).unwrap()
    );
    assert_eq!(reopened.progress(&p.id).cycle_state, CycleState::FirstReview);
}

#[test]
fn test_ensure_schedule_after_reopen_adds_nothing() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);

    let reopened = t.reopen();
    reopened.set_today(day(2024, 1, 9));
    let mut slots = reopened.engine.ensure_schedule(&p.id).unwrap();
    slots.sort_by_key(|s| s.order);

    assert_eq!(slots, t.current_slots(&p.id));
    assert_eq!(reopened.engine.slots(&p.id).unwrap().len(), 5);
    assert_eq!(reopened.engine.cycle_log(&p.id).unwrap().len(), 1);
}

#[test]
fn test_due_list_follows_the_clock() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let a = t.start("alice", "unit-1", 100);
    let b = t.start("bob", "unit-1", 100);

    assert!(t.engine.due(None).unwrap().is_empty());

    t.set_today(day(2024, 1, 3));
    let due: Vec<String> = t.engine.due(None).unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(due.len(), 2);
    assert!(due.contains(&a.id) && due.contains(&b.id));

    t.engine.complete_slot(&a.id, SlotOrder::FIRST).unwrap();
    let due: Vec<String> = t.engine.due(None).unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(due, vec![b.id.clone()]);
}

#[test]
fn test_outcome_serializes_camel_case() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    let outcome = t.complete_next(&p.id);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["slot"]["status"], "COMPLETED");
    assert_eq!(json["slot"]["reviewDate"], "2024-01-03");
    assert_eq!(json["progress"]["cycleState"], "FIRST_TIME");
    assert!(json["advance"].is_null());
}

//! Many learners at once

use std::thread;

use reprise_core::{CycleState, SlotOrder};
use reprise_e2e_tests::{BatchConfig, TestDataFactory, TestEngine};

use super::day;

#[test]
fn test_batch_of_learners_spreads_load() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let batch = TestDataFactory::start_batch(
        &t.engine,
        &BatchConfig {
            count: 24,
            ..Default::default()
        },
    );
    assert_eq!(batch.len(), 24);

    let load = t.engine.load(120).unwrap();
    assert_eq!(load.total(), 24 * 5);

    // Sequential starts see each other's bookings
    let first_day = load.count(day(2024, 1, 3));
    assert!(first_day <= t.engine.config().load_threshold + 1);
    assert!(load.len() > 5);
}

#[test]
fn test_parallel_learners_complete_independently() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let batch = TestDataFactory::start_batch(
        &t.engine,
        &BatchConfig {
            count: 8,
            sizes: TestDataFactory::assorted_sizes(),
            ..Default::default()
        },
    );

    let handles: Vec<_> = batch
        .iter()
        .map(|p| {
            let engine = t.engine.clone();
            let id = p.id.clone();
            thread::spawn(move || {
                SlotOrder::all()
                    .filter_map(|order| engine.complete_slot(&id, order).unwrap().advance)
                    .count()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), 1);
    }
    for p in &batch {
        assert_eq!(t.progress(&p.id).cycle_state, CycleState::FirstReview);
        assert_eq!(t.engine.slots(&p.id).unwrap().len(), 10);
    }
}

#[test]
fn test_racing_completions_of_one_slot() {
    let t = TestEngine::new_temp(day(2024, 1, 1));
    let p = t.start("alice", "unit-1", 100);
    t.set_today(day(2024, 1, 3));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = t.engine.clone();
            let id = p.id.clone();
            thread::spawn(move || engine.complete_slot(&id, SlotOrder::FIRST).unwrap())
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // One thread did the work, the rest saw a completed slot
    assert_eq!(outcomes.iter().filter(|o| o.rescheduled > 0).count(), 1);
    assert!(outcomes.iter().all(|o| o.slot.completed_on == Some(day(2024, 1, 3))));
    assert!(outcomes.iter().all(|o| o.advance.is_none()));
    assert_eq!(t.engine.slots(&p.id).unwrap().len(), 5);
}

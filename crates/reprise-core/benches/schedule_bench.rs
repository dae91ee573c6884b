//! Reprise Scheduling Benchmarks
//!
//! Benchmarks for the pure scheduling paths using Criterion.
//! Run with: cargo bench -p reprise-core

use chrono::{Days, NaiveDate};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use reprise_core::{
    AdjustmentMode, CycleState, DateLoad, IntervalCalculator, LearningUnit, LoadBalancer,
    Progress, ScheduleGenerator, SchedulerConfig,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn busy_load(days: u64, per_day: u32) -> DateLoad {
    (0..days)
        .map(|i| (base_date() + Days::new(i), per_day))
        .collect()
}

fn bench_interval_offsets(c: &mut Criterion) {
    let config = SchedulerConfig::default();
    let calc = IntervalCalculator::new(&config);
    let progresses: Vec<Progress> = CycleState::ALL
        .iter()
        .map(|&state| {
            let mut p = Progress::new("bench", LearningUnit::new("unit", 240)).with_percent_complete(60);
            p.cycle_state = state;
            p
        })
        .collect();

    c.bench_function("interval_offsets_all_cycles", |b| {
        b.iter(|| {
            for p in &progresses {
                for i in 0..5 {
                    black_box(calc.offset_days(p, i, AdjustmentMode::Reschedule));
                }
            }
        })
    });
}

fn bench_balancer_saturated(c: &mut Criterion) {
    let balancer = LoadBalancer::from_config(&SchedulerConfig::default());
    let load = busy_load(120, 8);

    c.bench_function("settle_saturated_window", |b| {
        b.iter(|| {
            black_box(balancer.settle(base_date() + Days::new(30), &load, base_date()));
        })
    });
}

fn bench_generate_cycle(c: &mut Criterion) {
    let config = SchedulerConfig::default();
    let generator = ScheduleGenerator::new(&config);
    let progress = Progress::new("bench", LearningUnit::new("unit", 180)).with_first_learning_date(base_date());
    let empty = DateLoad::new();
    let crowded = busy_load(90, 3);

    c.bench_function("generate_cycle_empty_load", |b| {
        b.iter(|| black_box(generator.generate(&progress, base_date(), &empty, base_date())))
    });

    c.bench_function("generate_cycle_crowded_load", |b| {
        b.iter(|| black_box(generator.generate(&progress, base_date(), &crowded, base_date())))
    });
}

criterion_group!(
    benches,
    bench_interval_offsets,
    bench_balancer_saturated,
    bench_generate_cycle,
);
criterion_main!(benches);

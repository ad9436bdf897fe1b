//! Planet tick benchmarks for stellar_core.
//!
//! Run with: `cargo bench -p stellar_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use stellar_test_utils::fixtures::{self, resources, START};

/// Profile computation, state reads and queued ticks on a developed planet.
pub fn planet_tick_benchmark(c: &mut Criterion) {
    let engine = fixtures::engine();
    let player = fixtures::player(1);
    let planet = fixtures::developed_planet(engine.catalog(), 1, 1);

    c.bench_function("production_profile", |b| {
        b.iter(|| black_box(engine.profile(black_box(&planet), &player)));
    });

    c.bench_function("current_state", |b| {
        b.iter_batched(
            || (planet.clone(), player.clone()),
            |(mut planet, mut player)| {
                black_box(engine.current_state(&mut planet, &mut player, START.plus(3_600)))
            },
            BatchSize::SmallInput,
        );
    });

    let mut queued = planet.clone();
    let mut owner = player.clone();
    engine
        .set_research_level(&mut owner, "combustion_drive", 1, START)
        .expect("research set");
    engine
        .add_resources(
            &mut queued,
            &mut owner,
            resources(100_000_000, 100_000_000, 100_000_000),
            true,
            START,
        )
        .expect("resources added");
    engine
        .enqueue_by_name(&mut queued, &mut owner, "metal_mine", 1, START)
        .expect("mine queued");
    for _ in 0..10 {
        engine
            .enqueue_by_name(&mut queued, &mut owner, "light_fighter", 50, START)
            .expect("fighters queued");
    }

    c.bench_function("tick_through_queues", |b| {
        b.iter_batched(
            || (queued.clone(), owner.clone()),
            |(mut planet, mut player)| {
                black_box(engine.tick(&mut planet, &mut player, START.plus(7 * 24 * 3_600)))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, planet_tick_benchmark);
criterion_main!(benches);

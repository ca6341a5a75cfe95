//! Benchmarks of the timer hot path (start and stop) and of collection.

#![expect(missing_docs, reason = "benchmarks do not require API documentation")]

use std::hint::black_box;
use std::time::Instant;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use tick_tock::{CycleCounter, Engine, Key, MonotonicTicks, TickSource, key};

const PAIRS_PER_COLLECT: usize = 1000;

fn hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("hot_path");

    let monotonic: Engine = Engine::builder().build();
    group.bench_function("start_stop_monotonic", |b| {
        b.iter_custom(|iters| {
            let started = Instant::now();

            for _ in 0..iters {
                black_box(monotonic.start_timer(black_box("bench")).unwrap());
                black_box(monotonic.stop_timer(black_box("bench")).unwrap());
            }

            let elapsed = started.elapsed();

            // Keep the log from growing across samples, outside the measured region.
            monotonic.collect().unwrap();
            drop(monotonic.take_samples());

            elapsed
        });
    });

    let cycles: Engine<Key, CycleCounter> = Engine::builder()
        .tick_source(CycleCounter::new())
        .build();
    group.bench_function("start_stop_cycles_interned", |b| {
        b.iter_custom(|iters| {
            let started = Instant::now();

            for _ in 0..iters {
                black_box(cycles.start_timer(key!("bench")).unwrap());
                black_box(cycles.stop_timer(None).unwrap());
            }

            let elapsed = started.elapsed();

            cycles.collect().unwrap();
            drop(cycles.take_samples());

            elapsed
        });
    });

    group.finish();
}

fn tick_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_source_now");

    let monotonic = MonotonicTicks::new();
    group.bench_function("monotonic", |b| b.iter(|| black_box(monotonic.now())));

    let cycles = CycleCounter::new();
    group.bench_function("cycle_counter", |b| b.iter(|| black_box(cycles.now())));

    group.finish();
}

fn collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect");

    for depth in [1_usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("nested", depth), &depth, |b, &depth| {
            b.iter_batched_ref(
                || {
                    let engine: Engine = Engine::builder()
                        .capacity(PAIRS_PER_COLLECT * 2)
                        .build();

                    for _ in 0..PAIRS_PER_COLLECT / depth {
                        for _ in 0..depth {
                            engine.start_timer("nested").unwrap();
                        }
                        for _ in 0..depth {
                            engine.stop_timer(None).unwrap();
                        }
                    }

                    engine
                },
                |engine| {
                    black_box(engine.collect().unwrap());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, hot_path, tick_sources, collect);
criterion_main!(benches);

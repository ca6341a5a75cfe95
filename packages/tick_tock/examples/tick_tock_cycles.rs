//! Example that times work with the processor cycle counter and the process-wide engine.
//!
//! The first conversion to time calibrates the cycle counter, which may take a moment.

use std::hint::black_box;

use tick_tock::{Calibration, CycleCounter, TickSource, global};

fn busy_work(rounds: u64) -> u64 {
    (0..rounds).fold(0_u64, |acc, x| acc.wrapping_mul(31).wrapping_add(black_box(x)))
}

fn main() {
    let counter = CycleCounter::new();
    let rate = counter.rate_with(&Calibration::default());
    println!("Cycle counter ticks {rate} times per second");

    for rounds in [1_000, 10_000, 100_000] {
        global::start_timer("busy_work").expect("global log is growable");
        black_box(busy_work(rounds));
        global::stop_timer("busy_work").expect("timer was started above");
    }

    global::collect().expect("every stop has a matching start");

    global::with_engine(|engine| {
        for &delta in engine.samples_for(&"busy_work").iter() {
            println!(
                "busy_work: {delta} ticks = {:?}",
                engine.tick_source().to_duration(delta)
            );
        }
    });
}

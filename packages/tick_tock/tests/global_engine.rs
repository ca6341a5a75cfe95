//! Integration test for the process-wide engine.
//!
//! This test is in a separate integration test binary to avoid sharing
//! the global engine with other tests.

use std::thread;

use tick_tock::{Error, TickSource, global};

#[test]
fn global_engine_pairs_timers_from_many_threads() {
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    global::start_timer("global_work").unwrap();
                    global::stop_timer("global_work").unwrap();
                }
            });
        }
    });

    let stats = global::collect().unwrap();
    assert_eq!(stats.samples(), 40);
    assert_eq!(stats.open(), 0);

    global::with_engine(|engine| {
        let samples = engine.samples_for(&"global_work");

        assert_eq!(samples.len(), 40);
        assert!(samples.iter().all(|&delta| delta >= 0));

        // Converting ticks to time calibrates the cycle counter.
        assert!(engine.tick_source().rate() > 0);
    });

    // Nothing is open any more.
    assert!(matches!(global::stop_timer(None), Err(Error::Underflow)));
}

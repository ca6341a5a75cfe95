//! Example that demonstrates recording and collecting timers.
//!
//! Times a few pretend requests with nested phases, then prints the durations per phase.

use std::thread;
use std::time::Duration;

use tick_tock::{Engine, TickSource};

fn main() {
    println!("=== tick_tock README Example ===");

    let engine: Engine = Engine::builder().capacity(1024).build();
    engine.attributes().set("scenario", "readme");

    for request in 0..3_u64 {
        let _request = engine.timer("request").expect("log is growable");

        {
            let _parse = engine.timer("parse").expect("log is growable");
            thread::sleep(Duration::from_millis(1));
        }

        engine.start_timer("query").expect("log is growable");
        thread::sleep(Duration::from_millis(2 + request));
        engine.stop_timer(None).expect("query timer is open");
    }

    let stats = engine.collect().expect("every stop has a matching start");
    println!(
        "Collected {} events into {} samples, {} timers still open",
        stats.events(),
        stats.samples(),
        stats.open()
    );

    for name in ["request", "parse", "query"] {
        let durations = engine
            .samples_for(&name)
            .iter()
            .map(|&delta| engine.tick_source().to_duration(delta))
            .collect::<Vec<_>>();

        println!("{name}: {durations:?}");
    }

    print!("{}", engine.samples());
    println!("README example completed successfully!");
}

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # tick_tock
//!
//! Measure the elapsed time between paired start/stop calls with a hot path that does nothing
//! but read a tick counter and append to a buffer.
//!
//! Pairing of starts with stops is deferred to an explicit [`Engine::collect()`] pass, which
//! reconciles all the recorded events into per-name sequences of tick deltas. Nested timers
//! with the same name are paired innermost-first (last in, first out).
//!
//! # Recording timers
//!
//! ```
//! use tick_tock::{Engine, ManualTicks};
//!
//! let ticks = ManualTicks::new(1_000_000_000);
//! let engine = Engine::builder().tick_source(ticks.clone()).build();
//!
//! ticks.set(100);
//! engine.start_timer("parse").unwrap();
//! ticks.set(250);
//! engine.stop_timer("parse").unwrap();
//!
//! engine.collect().unwrap();
//!
//! assert_eq!(&*engine.samples_for(&"parse"), &[150]);
//! ```
//!
//! A stop without a name closes the most recently started timer that is still open,
//! whatever its name:
//!
//! ```
//! use tick_tock::{Engine, ManualTicks};
//!
//! let ticks = ManualTicks::new(1_000_000_000);
//! let engine = Engine::builder().tick_source(ticks.clone()).build();
//!
//! ticks.set(100);
//! engine.start_timer("a").unwrap();
//! ticks.set(110);
//! engine.start_timer("a").unwrap();
//! ticks.set(120);
//! engine.stop_timer(None).unwrap();
//! ticks.set(200);
//! engine.stop_timer("a").unwrap();
//!
//! engine.collect().unwrap();
//!
//! // The inner pair completed first.
//! assert_eq!(&*engine.samples_for(&"a"), &[10, 100]);
//! ```
//!
//! # Scoped timers
//!
//! [`Engine::timer()`] returns a [`Timer`] that stops itself when dropped, so an early return
//! never leaves a timer open:
//!
//! ```
//! use tick_tock::Engine;
//!
//! let engine = Engine::builder().build();
//!
//! fn handle_request(engine: &Engine<&'static str>) -> Result<(), tick_tock::Error> {
//!     let _timer = engine.timer("handle_request")?;
//!     // ...
//!     Ok(())
//! }
//!
//! handle_request(&engine).unwrap();
//! engine.collect().unwrap();
//!
//! assert_eq!(engine.samples_for(&"handle_request").len(), 1);
//! ```
//!
//! # Interned keys
//!
//! String keys are hashed and compared on every lookup during collection. The [`key!`] macro
//! interns a literal name once per call site and afterwards yields a small integer [`Key`]:
//!
//! ```
//! use tick_tock::{Engine, Key, key};
//!
//! let engine: Engine<Key> = Engine::builder().build();
//!
//! engine.start_timer(key!("db_query")).unwrap();
//! engine.stop_timer(key!("db_query")).unwrap();
//! engine.collect().unwrap();
//!
//! assert_eq!(engine.samples_for(&Key::intern("db_query")).len(), 1);
//! ```
//!
//! # Tick sources
//!
//! * [`MonotonicTicks`] - nanoseconds from the standard monotonic clock. The default.
//! * [`CycleCounter`] - the processor cycle counter, with a calibrated and cached rate.
//! * [`ManualTicks`] - ticks set by hand, for deterministic tests.
//!
//! # Threading
//!
//! An [`Engine`] has no internal synchronization. It can be moved between threads but not
//! shared. Either use one engine per thread and merge their [`SampleStore`]s, or put the engine
//! behind a lock. The [`global`] module provides the latter as an opt-in process-wide engine.
//!
//! # Collection failures
//!
//! [`Engine::collect()`] is all-or-nothing. If any pending event cannot be paired, nothing
//! from that batch is committed and the pending events remain in place for inspection.

mod attributes;
mod constants;
mod cycle_counter;
mod engine;
mod engine_builder;
mod error;
mod event;
mod event_log;
pub mod global;
mod key;
mod open_timers;
mod pal;
mod sample_store;
mod tick_source;
mod timer;

pub use attributes::*;
pub use constants::{DEFAULT_CALIBRATION_SLEEP, DEFAULT_LOG_CAPACITY};
pub(crate) use constants::*;
pub use cycle_counter::*;
pub use engine::*;
pub use engine_builder::*;
pub use error::{Error, Result};
pub use event::*;
pub use event_log::*;
pub use key::*;
pub use open_timers::RunningTimer;
pub(crate) use open_timers::*;
pub use sample_store::*;
pub use tick_source::*;
pub use timer::*;

/// A reading from a [`TickSource`].
///
/// Only the difference between two ticks from the same source has meaning.
pub type Tick = u64;

/// The difference between two ticks, as stored in a [`SampleStore`].
///
/// Signed so that a misbehaving tick source can be detected rather than wrapped around.
pub type TickDelta = i64;

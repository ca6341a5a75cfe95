//! A process-wide engine for code that cannot pass an engine around.
//!
//! The engine is created on first use, timestamps events with a [`CycleCounter`] and sits
//! behind a mutex, so every call here takes a lock. Prefer an [`Engine`] per thread on hot
//! paths and use this for coarse-grained timers.
//!
//! # Example
//!
//! ```
//! use tick_tock::global;
//!
//! global::start_timer("startup").unwrap();
//! global::stop_timer("startup").unwrap();
//! global::collect().unwrap();
//!
//! let count = global::with_engine(|engine| engine.samples_for(&"startup").len());
//! assert_eq!(count, 1);
//! ```

use std::sync::{LazyLock, Mutex};

use crate::{CollectStats, CycleCounter, ERR_POISONED_LOCK, Engine, Result};

/// The engine type behind the functions in this module.
pub type GlobalEngine = Engine<&'static str, CycleCounter>;

static ENGINE: LazyLock<Mutex<GlobalEngine>> = LazyLock::new(|| {
    Mutex::new(
        Engine::builder()
            .tick_source(CycleCounter::new())
            .build(),
    )
});

/// Starts a timer on the process-wide engine.
///
/// # Errors
///
/// See [`Engine::start_timer()`].
///
/// # Panics
///
/// Panics if a previous call panicked while holding the engine lock.
pub fn start_timer(name: &'static str) -> Result<usize> {
    ENGINE.lock().expect(ERR_POISONED_LOCK).start_timer(name)
}

/// Stops a timer on the process-wide engine.
///
/// # Errors
///
/// See [`Engine::stop_timer()`].
///
/// # Panics
///
/// Panics if a previous call panicked while holding the engine lock.
pub fn stop_timer(name: impl Into<Option<&'static str>>) -> Result<usize> {
    ENGINE.lock().expect(ERR_POISONED_LOCK).stop_timer(name)
}

/// Pairs the pending events of the process-wide engine.
///
/// # Errors
///
/// See [`Engine::collect()`].
///
/// # Panics
///
/// Panics if a previous call panicked while holding the engine lock.
pub fn collect() -> Result<CollectStats> {
    ENGINE.lock().expect(ERR_POISONED_LOCK).collect()
}

/// Runs `f` with exclusive access to the process-wide engine.
///
/// Use this to read samples, convert ticks to durations or anything else the free functions
/// do not cover. Other threads block on the engine until `f` returns.
///
/// # Panics
///
/// Panics if a previous call panicked while holding the engine lock.
pub fn with_engine<R>(f: impl FnOnce(&GlobalEngine) -> R) -> R {
    f(&ENGINE.lock().expect(ERR_POISONED_LOCK))
}

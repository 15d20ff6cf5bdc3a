// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;
use trickle::{Controller, Factory, ManualScheduler, Step, TrickleResult};

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Test step failed: {0}")]
  Step(String),

  #[error("Test stop requested: {0}")]
  Stop(String),
}

// --- Scheduler / factory helpers ---

/// A factory whose deferred first advances wait for `scheduler.run_pending()`.
pub fn manual_factory() -> (Arc<ManualScheduler>, Factory) {
  let scheduler = Arc::new(ManualScheduler::new());
  let factory = Factory::with_scheduler(scheduler.clone());
  (scheduler, factory)
}

/// The settled outcome of a controller's root completion. Panics if still pending.
pub fn settled<T: Clone + Send + 'static>(controller: &Controller<T>) -> TrickleResult<T> {
  controller
    .completion()
    .peek()
    .expect("controller should have settled by now")
}

// --- Shared execution log ---
pub type ExecutionLog<V> = Arc<Mutex<Vec<V>>>;

pub fn new_log<V>() -> ExecutionLog<V> {
  Arc::new(Mutex::new(Vec::new()))
}

// --- Common Step Creators ---

/// Advances with `payload + 1`.
pub fn incrementing_step() -> Step<i32> {
  Step::new(|drip, v: i32| {
    drip.advance(v + 1);
    Ok(())
  })
}

/// Records its payload under `name`, bumps the global counter, then advances unchanged.
pub fn recording_step(name: &'static str, log: ExecutionLog<(String, i32)>) -> Step<i32> {
  Step::new(move |drip, v: i32| {
    STEP_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    log.lock().push((name.to_string(), v));
    tracing::debug!(target: "test_steps", step = name, payload = v, "executed");
    drip.advance(v);
    Ok(())
  })
}

pub fn failing_step(message: &'static str) -> Step<i32> {
  Step::new(move |_drip, _v: i32| {
    tracing::warn!(target: "test_steps", "failing with: '{}'", message);
    Err(TestError::Step(message.to_string()).into())
  })
}

pub fn names(log: &ExecutionLog<(String, i32)>) -> Vec<String> {
  log.lock().iter().map(|(name, _)| name.clone()).collect()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counter for checking execution counts across a test ---
pub static STEP_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  STEP_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

pub fn step_executions() -> usize {
  STEP_EXEC_COUNTER.load(Ordering::SeqCst)
}

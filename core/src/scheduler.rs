// trickle/src/scheduler.rs

//! The "schedule soon" seam used to defer a controller's first advance.
//!
//! A scheduler only has to promise that a task runs later, never inline inside
//! `schedule`. That gap is the synchronous window in which callers append steps
//! to a freshly created controller before it starts.

use crate::error::{TrickleError, TrickleResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{event, Level};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Schedule: Send + Sync {
  /// Queues `task` to run on a later turn. Must not run it before returning.
  fn schedule(&self, task: Task) -> TrickleResult<()>;
}

/// Spawns deferred tasks onto a tokio runtime.
///
/// Without an explicit handle, the runtime of the calling context is used at
/// `schedule` time, which fails with `SchedulerUnavailable` outside a runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
  handle: Option<Handle>,
}

impl TokioScheduler {
  pub fn new() -> Self {
    Self { handle: None }
  }

  pub fn with_handle(handle: Handle) -> Self {
    Self { handle: Some(handle) }
  }
}

impl Schedule for TokioScheduler {
  fn schedule(&self, task: Task) -> TrickleResult<()> {
    let handle = match &self.handle {
      Some(handle) => handle.clone(),
      None => Handle::try_current().map_err(|e| TrickleError::SchedulerUnavailable { message: e.to_string() })?,
    };
    handle.spawn(async move { task() });
    Ok(())
  }
}

/// Holds deferred tasks until [`run_pending`](Self::run_pending) is called.
///
/// Useful for deterministic tests and for embedding into a host event loop.
#[derive(Default)]
pub struct ManualScheduler {
  tasks: Mutex<VecDeque<Task>>,
}

impl ManualScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pending(&self) -> usize {
    self.tasks.lock().len()
  }

  /// Runs queued tasks, including any queued while draining, and returns how many ran.
  pub fn run_pending(&self) -> usize {
    let mut ran = 0;
    loop {
      // The lock must be released before the task runs; tasks may schedule more work.
      let next = self.tasks.lock().pop_front();
      match next {
        Some(task) => {
          task();
          ran += 1;
        }
        None => break,
      }
    }
    event!(Level::TRACE, ran, "Manual scheduler drained.");
    ran
  }
}

impl Schedule for ManualScheduler {
  fn schedule(&self, task: Task) -> TrickleResult<()> {
    self.tasks.lock().push_back(task);
    Ok(())
  }
}

impl std::fmt::Debug for ManualScheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ManualScheduler").field("pending", &self.pending()).finish()
  }
}

/// The scheduler used when none is given explicitly.
pub fn default_scheduler() -> Arc<dyn Schedule> {
  Arc::new(TokioScheduler::new())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn manual_scheduler_defers_until_drained() {
    let scheduler = ManualScheduler::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    scheduler
      .schedule(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
      }))
      .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.run_pending(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn manual_scheduler_runs_tasks_queued_while_draining() {
    let scheduler = Arc::new(ManualScheduler::new());
    let hits = Arc::new(AtomicUsize::new(0));
    let inner_scheduler = scheduler.clone();
    let inner_hits = hits.clone();
    scheduler
      .schedule(Box::new(move || {
        let hits = inner_hits.clone();
        inner_scheduler
          .schedule(Box::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
          }))
          .unwrap();
      }))
      .unwrap();

    assert_eq!(scheduler.run_pending(), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn tokio_scheduler_fails_outside_a_runtime() {
    let result = TokioScheduler::new().schedule(Box::new(|| {}));
    assert!(matches!(result, Err(TrickleError::SchedulerUnavailable { .. })));
  }
}

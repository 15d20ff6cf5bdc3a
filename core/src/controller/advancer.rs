// trickle/src/controller/advancer.rs

//! Defines `Advancer<T>`, the control handle a step uses to pass control on.

use crate::controller::definition::Controller;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

/// The handle a step drives to move its controller forward.
///
/// In single-use mode every step invocation receives a freshly minted
/// advancer carrying its own one-shot guard: the first `advance` or `skip`
/// through it (or any of its clones) takes effect and every later one is
/// discarded. `stop` always reaches the controller.
///
/// Reusable advancers have no guard and may be called any number of times.
pub struct Advancer<T> {
  controller: Controller<T>,
  guard: Option<Arc<AtomicBool>>,
}

impl<T> Clone for Advancer<T> {
  fn clone(&self) -> Self {
    Advancer {
      controller: self.controller.clone(),
      guard: self.guard.clone(),
    }
  }
}

impl<T> Advancer<T>
where
  T: Clone + Send + 'static,
{
  pub(crate) fn reusable(controller: Controller<T>) -> Self {
    Advancer {
      controller,
      guard: None,
    }
  }

  pub(crate) fn single_use(controller: Controller<T>) -> Self {
    Advancer {
      controller,
      guard: Some(Arc::new(AtomicBool::new(false))),
    }
  }

  /// Takes the one-shot guard. Checked before any controller state is touched.
  fn claim(&self, operation: &'static str) -> bool {
    match &self.guard {
      None => true,
      Some(spent) => {
        let first = !spent.swap(true, Ordering::AcqRel);
        if !first {
          event!(Level::TRACE, operation, "Discarded repeated call on a single-use advancer.");
        }
        first
      }
    }
  }

  /// Invokes the next step with `payload`, or fulfills when none remain.
  pub fn advance(&self, payload: T) {
    if self.claim("advance") {
      self.controller.advance(payload);
    }
  }

  /// Returns an operation that skips `n` steps (at least one) and advances
  /// with its payload. The guard is taken when the operation runs.
  pub fn skip(&self, n: i64) -> impl FnOnce(T) + Send + 'static {
    let advancer = self.clone();
    move |payload| advancer.skip_with(n, payload)
  }

  pub fn skip_with(&self, n: i64, payload: T) {
    if self.claim("skip") {
      self.controller.skip_with(n, payload);
    }
  }

  pub fn stop(&self, value: T) {
    self.controller.stop(value);
  }

  pub fn stop_with_error(&self, error: impl Into<anyhow::Error>) {
    self.controller.stop_with_error(error);
  }

  pub fn stop_with<E>(&self, outcome: Result<T, E>)
  where
    E: Into<anyhow::Error>,
  {
    self.controller.stop_with(outcome);
  }

  /// The payload the current step was invoked with.
  pub fn payload(&self) -> Option<T> {
    self.controller.payload()
  }

  /// Whether this advancer is single-use and has already been used.
  pub fn is_spent(&self) -> bool {
    self.guard.as_ref().is_some_and(|spent| spent.load(Ordering::Acquire))
  }

  pub fn controller(&self) -> &Controller<T> {
    &self.controller
  }
}

impl<T> fmt::Debug for Advancer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Advancer")
      .field("single_use", &self.guard.is_some())
      .field("spent", &self.guard.as_ref().is_some_and(|g| g.load(Ordering::Acquire)))
      .finish()
  }
}

// trickle/src/controller/execution.rs

//! Contains the advancement algorithm: `advance`, `skip`, `stop` and the
//! manual settlement operations, plus failure capture for steps.

use crate::controller::advancer::Advancer;
use crate::controller::definition::Controller;
use crate::core::step::Step;
use crate::error::{Reason, TrickleError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{event, span, Level};

/// How many steps of one controller may be nested on the call stack before
/// further synchronous advances are queued rather than run inline.
pub const MAX_INLINE_DEPTH: usize = 32;

impl<T> Controller<T>
where
  T: Clone + Send + 'static,
{
  /// Invokes the next queued step with `payload`, or fulfills the completion
  /// with `payload` when the queue is empty.
  ///
  /// No-op once the controller has settled. The internal lock is released
  /// before the step runs, so a step may call back into the controller
  /// synchronously: the next step then runs inside that call. Past
  /// [`MAX_INLINE_DEPTH`] nested steps the advance is queued instead and run by
  /// the enclosing invocation as soon as its step returns, so arbitrarily long
  /// synchronous sequences keep a bounded stack.
  ///
  /// A step that returns `Err` or panics rejects the completion with
  /// `StepFailure`.
  pub fn advance(&self, payload: T) {
    let mut next = Some(payload);
    while let Some(payload) = next {
      next = self.advance_once(payload);
    }
  }

  /// Runs a single transition. Returns a deferred payload this invocation
  /// must continue with, if its step queued one.
  fn advance_once(&self, payload: T) -> Option<T> {
    let (step, ordinal) = {
      let mut state = self.shared.state.lock();
      if self.shared.completion.is_settled() {
        event!(Level::TRACE, "Advance ignored; sequence already settled.");
        return None;
      }
      if state.depth >= MAX_INLINE_DEPTH {
        event!(Level::TRACE, depth = state.depth, "Advance deferred until the running step returns.");
        state.deferred.push_back(payload);
        return None;
      }
      state.started = true;
      let next = state.queue.pop_front();
      match next {
        Some(step) => {
          state.payload = Some(payload.clone());
          state.invocations += 1;
          state.depth += 1;
          (step, state.invocations)
        }
        None => {
          drop(state);
          event!(Level::DEBUG, "Step queue exhausted; fulfilling.");
          self.shared.completion.resolve(payload);
          return None;
        }
      }
    };

    {
      let step_span = span!(Level::TRACE, "step_invocation", step = ordinal, convention = step.convention());
      let _step_span_guard = step_span.enter();
      event!(Level::TRACE, "Invoking step.");

      let outcome = panic::catch_unwind(AssertUnwindSafe(|| match step {
        Step::Handle(step_fn) => step_fn(self.mint_advancer(), payload),
        Step::Direct(step_fn) => step_fn(payload),
      }));

      let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(panic_payload) => Some(anyhow::anyhow!("step panicked: {}", panic_message(&*panic_payload))),
      };
      if let Some(err) = failure {
        event!(Level::WARN, error = %err, "Step failed; rejecting.");
        self.settle(Err(TrickleError::StepFailure {
          step: ordinal,
          reason: Reason::from(err),
        }));
      }
    }

    // Decrement and drain under one lock so an advance deferred from another
    // thread cannot slip in between.
    let mut state = self.shared.state.lock();
    state.depth -= 1;
    state.deferred.pop_front()
  }

  /// Returns an operation that discards the next `n` queued steps (at least
  /// one, even for `n <= 0`) and then advances with the payload it is given.
  pub fn skip(&self, n: i64) -> impl FnOnce(T) + Send + 'static {
    let controller = self.clone();
    move |payload| controller.skip_with(n, payload)
  }

  /// `skip(n)(payload)` in one call.
  pub fn skip_with(&self, n: i64, payload: T) {
    {
      let mut state = self.shared.state.lock();
      if self.shared.completion.is_settled() {
        event!(Level::TRACE, "Skip ignored; sequence already settled.");
        return;
      }
      let dropped = state.queue.drop_front(n);
      event!(Level::TRACE, requested = n, dropped, "Skipped steps.");
    }
    self.advance(payload);
  }

  /// Discards the remaining steps and fulfills with `value`.
  pub fn stop(&self, value: T) {
    event!(Level::DEBUG, "Sequence stopped.");
    self.settle(Ok(value));
  }

  /// Discards the remaining steps and rejects with `error`.
  pub fn stop_with_error(&self, error: impl Into<anyhow::Error>) {
    let error = error.into();
    event!(Level::DEBUG, error = %error, "Sequence stopped with an error.");
    self.settle(Err(TrickleError::ExplicitRejection {
      reason: Reason::from(error),
    }));
  }

  /// Stops with whatever `outcome` holds: `Ok` fulfills, `Err` rejects.
  pub fn stop_with<E>(&self, outcome: Result<T, E>)
  where
    E: Into<anyhow::Error>,
  {
    match outcome {
      Ok(value) => self.stop(value),
      Err(error) => self.stop_with_error(error),
    }
  }

  /// Fulfills the root completion from outside the step path. Remaining steps
  /// are discarded. Returns `false` if the completion had already settled.
  pub fn resolve(&self, value: T) -> bool {
    self.settle(Ok(value))
  }

  /// Rejects the root completion from outside the step path. Remaining steps
  /// are discarded. Returns `false` if the completion had already settled.
  pub fn reject(&self, error: impl Into<anyhow::Error>) -> bool {
    self.settle(Err(TrickleError::from(error.into())))
  }

  fn settle(&self, outcome: Result<T, TrickleError>) -> bool {
    {
      let mut state = self.shared.state.lock();
      state.queue.clear();
      state.deferred.clear();
    }
    match outcome {
      Ok(value) => self.shared.completion.resolve(value),
      Err(error) => self.shared.completion.reject(error),
    }
  }

  pub(crate) fn mint_advancer(&self) -> Advancer<T> {
    if self.shared.mode.is_single_use() {
      Advancer::single_use(self.clone())
    } else {
      Advancer::reusable(self.clone())
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    *message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "non-string panic payload"
  }
}

// trickle/src/core/step.rs

//! Defines a single unit of work in a sequence and its two calling conventions.

use crate::controller::Advancer;
use std::fmt;

/// What a step returns. An `Err` is captured by the controller and rejects its
/// completion; any error convertible into `anyhow::Error` can be raised with `?`.
pub type StepResult = anyhow::Result<()>;

/// A step that is handed the controller's advancer alongside the payload.
pub type HandleStepFn<T> = Box<dyn FnOnce(Advancer<T>, T) -> StepResult + Send + 'static>;

/// A step that only receives the payload (direct-invocation mode).
pub type DirectStepFn<T> = Box<dyn FnOnce(T) -> StepResult + Send + 'static>;

/// One queued unit of work. Consumed by its invocation.
pub enum Step<T> {
  Handle(HandleStepFn<T>),
  Direct(DirectStepFn<T>),
}

impl<T> Step<T> {
  /// A step for the default calling convention: `|advancer, payload| { ... }`.
  pub fn new<F>(f: F) -> Self
  where
    F: FnOnce(Advancer<T>, T) -> StepResult + Send + 'static,
  {
    Step::Handle(Box::new(f))
  }

  /// A step for direct-invocation mode: `|payload| { ... }`.
  pub fn direct<F>(f: F) -> Self
  where
    F: FnOnce(T) -> StepResult + Send + 'static,
  {
    Step::Direct(Box::new(f))
  }

  pub fn is_direct(&self) -> bool {
    matches!(self, Step::Direct(_))
  }

  pub(crate) fn convention(&self) -> &'static str {
    match self {
      Step::Handle(_) => "advancer-taking",
      Step::Direct(_) => "direct",
    }
  }
}

// The boxed closures don't implement Debug, so only the convention is shown.
impl<T> fmt::Debug for Step<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Step").field(&self.convention()).finish()
  }
}

// trickle/src/error.rs
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A shared handle to an arbitrary failure raised by a step or a continuation.
///
/// A completion can be observed by any number of continuations, so the
/// underlying `anyhow::Error` is kept behind an `Arc` to make rejections clonable.
#[derive(Clone)]
pub struct Reason(Arc<anyhow::Error>);

impl Reason {
  pub fn new(err: impl Into<anyhow::Error>) -> Self {
    Reason(Arc::new(err.into()))
  }

  /// Attempts to view the failure as the concrete error type `E` the step produced.
  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: fmt::Display + fmt::Debug + Send + Sync + 'static,
  {
    self.0.downcast_ref::<E>()
  }

  pub fn as_anyhow(&self) -> &anyhow::Error {
    &self.0
  }
}

impl fmt::Debug for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*self.0, f)
  }
}

impl fmt::Display for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&*self.0, f)
  }
}

impl From<anyhow::Error> for Reason {
  fn from(err: anyhow::Error) -> Self {
    Reason(Arc::new(err))
  }
}

#[derive(Debug, Clone, Error)]
pub enum TrickleError {
  /// A caller handed the controller something it cannot invoke.
  /// Always returned synchronously, never routed through a completion.
  #[error("Contract violation: {message}")]
  ContractViolation { message: String },

  /// A step returned an error. `step` is the 1-based invocation ordinal.
  #[error("Step #{step} failed: {reason}")]
  StepFailure { step: usize, reason: Reason },

  #[error("Sequence stopped with an error: {reason}")]
  ExplicitRejection { reason: Reason },

  /// The completion was rejected from outside the step path.
  #[error("Completion rejected: {reason}")]
  Rejected { reason: Reason },

  #[error("Continuation failed: {reason}")]
  ContinuationFailure { reason: Reason },

  #[error("Scheduler unavailable: {message}")]
  SchedulerUnavailable { message: String },
}

impl TrickleError {
  pub fn contract_violation(message: impl Into<String>) -> Self {
    TrickleError::ContractViolation { message: message.into() }
  }

  /// Wraps an arbitrary error for a manual `reject`.
  pub fn rejected(err: impl Into<anyhow::Error>) -> Self {
    TrickleError::Rejected { reason: Reason::new(err) }
  }

  /// The underlying failure, for the variants that carry one.
  pub fn reason(&self) -> Option<&Reason> {
    match self {
      TrickleError::StepFailure { reason, .. }
      | TrickleError::ExplicitRejection { reason }
      | TrickleError::Rejected { reason }
      | TrickleError::ContinuationFailure { reason } => Some(reason),
      TrickleError::ContractViolation { .. } | TrickleError::SchedulerUnavailable { .. } => None,
    }
  }

  /// Shortcut for `self.reason().and_then(|r| r.downcast_ref::<E>())`.
  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: fmt::Display + fmt::Debug + Send + Sync + 'static,
  {
    self.reason().and_then(|r| r.downcast_ref::<E>())
  }

  /// Maps a failed continuation handler into the error carried by the derived completion.
  ///
  /// A handler that re-raises a `TrickleError` (e.g. `catch(|e| Err(e.into()))`)
  /// keeps the original error instead of nesting it.
  pub(crate) fn from_continuation(err: anyhow::Error) -> Self {
    if let Some(inner) = err.downcast_ref::<TrickleError>() {
      return inner.clone();
    }
    TrickleError::ContinuationFailure { reason: Reason::from(err) }
  }
}

// Mirrors `from_continuation`: an anyhow error that already wraps a
// TrickleError is unwrapped rather than re-wrapped.
impl From<anyhow::Error> for TrickleError {
  fn from(err: anyhow::Error) -> Self {
    if let Some(inner) = err.downcast_ref::<TrickleError>() {
      return inner.clone();
    }
    TrickleError::Rejected { reason: Reason::from(err) }
  }
}

pub type TrickleResult<T, E = TrickleError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("disk full")]
  struct DiskFull;

  #[test]
  fn reason_downcasts_to_the_original_error() {
    let err = TrickleError::StepFailure { step: 2, reason: Reason::new(DiskFull) };
    assert!(err.downcast_ref::<DiskFull>().is_some());
    assert_eq!(err.to_string(), "Step #2 failed: disk full");
  }

  #[test]
  fn anyhow_wrapping_a_trickle_error_is_unwrapped() {
    let original = TrickleError::contract_violation("bad step");
    let converted = TrickleError::from(anyhow::Error::new(original));
    assert!(matches!(converted, TrickleError::ContractViolation { ref message } if message == "bad step"));

    let nested = TrickleError::from_continuation(anyhow::Error::new(TrickleError::rejected(DiskFull)));
    assert!(matches!(nested, TrickleError::Rejected { .. }));
  }

  #[test]
  fn contract_violation_carries_no_reason() {
    assert!(TrickleError::contract_violation("x").reason().is_none());
  }
}

// trickle/src/completion/cell.rs

//! Defines `Completion<T>`, a clonable handle to a one-shot fulfilled/rejected cell.

use crate::error::TrickleError;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use tracing::{event, Level};

type Outcome<T> = Result<T, TrickleError>;
type Callback<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

/// Coarse view of a completion's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
  Pending,
  Fulfilled,
  Rejected,
}

enum Slot<T> {
  Pending {
    callbacks: Vec<Callback<T>>,
    wakers: Vec<Waker>,
  },
  Settled(Outcome<T>),
}

/// A single-assignment result cell.
///
/// Every clone refers to the same cell. The first `resolve` or `reject` wins and
/// the transition is permanent. Continuations registered with [`then`](Self::then),
/// [`catch`](Self::catch) or [`on_settle`](Self::on_settle) run on the thread that
/// settles the cell, or immediately if it is already settled; no internal lock is
/// held while they run.
///
/// `Completion<T>` is itself a `Future`, so it can be `.await`ed from async code.
pub struct Completion<T> {
  slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Completion<T> {
  fn clone(&self) -> Self {
    Completion {
      slot: Arc::clone(&self.slot),
    }
  }
}

impl<T> Completion<T>
where
  T: Clone + Send + 'static,
{
  pub fn new() -> Self {
    Completion {
      slot: Arc::new(Mutex::new(Slot::Pending {
        callbacks: Vec::new(),
        wakers: Vec::new(),
      })),
    }
  }

  /// Fulfills the cell. Returns `false` (and does nothing) if it was already settled.
  pub fn resolve(&self, value: T) -> bool {
    self.settle(Ok(value))
  }

  /// Rejects the cell. Returns `false` (and does nothing) if it was already settled.
  pub fn reject(&self, error: TrickleError) -> bool {
    self.settle(Err(error))
  }

  fn settle(&self, outcome: Outcome<T>) -> bool {
    let (callbacks, wakers) = {
      let mut slot = self.slot.lock();
      match &mut *slot {
        Slot::Settled(_) => return false,
        Slot::Pending { callbacks, wakers } => {
          let pending = (std::mem::take(callbacks), std::mem::take(wakers));
          *slot = Slot::Settled(outcome.clone());
          pending
        }
      }
    };

    event!(
      Level::TRACE,
      fulfilled = outcome.is_ok(),
      continuations = callbacks.len(),
      "Completion settled."
    );
    for callback in callbacks {
      callback(outcome.clone());
    }
    for waker in wakers {
      waker.wake();
    }
    true
  }

  /// Registers a raw continuation that receives the outcome once settled.
  pub fn on_settle<F>(&self, callback: F)
  where
    F: FnOnce(Outcome<T>) + Send + 'static,
  {
    let ready = {
      let mut slot = self.slot.lock();
      match &mut *slot {
        Slot::Pending { callbacks, .. } => {
          callbacks.push(Box::new(callback));
          return;
        }
        Slot::Settled(outcome) => outcome.clone(),
      }
    };
    callback(ready);
  }

  /// Derives a completion fulfilled with `f(value)` once this one fulfills.
  ///
  /// A rejection passes through untouched and `f` is not called. If `f` returns
  /// `Err`, the derived completion rejects with it.
  pub fn then<U, F>(&self, f: F) -> Completion<U>
  where
    U: Clone + Send + 'static,
    F: FnOnce(T) -> anyhow::Result<U> + Send + 'static,
  {
    let derived = Completion::<U>::new();
    let target = derived.clone();
    self.on_settle(move |outcome| {
      match outcome {
        Ok(value) => match f(value) {
          Ok(mapped) => target.resolve(mapped),
          Err(err) => target.reject(TrickleError::from_continuation(err)),
        },
        Err(err) => target.reject(err),
      };
    });
    derived
  }

  /// Derives a completion that recovers from a rejection with `f(error)`.
  ///
  /// A fulfillment passes through untouched and `f` is not called.
  pub fn catch<F>(&self, f: F) -> Completion<T>
  where
    F: FnOnce(TrickleError) -> anyhow::Result<T> + Send + 'static,
  {
    let derived = Completion::<T>::new();
    let target = derived.clone();
    self.on_settle(move |outcome| {
      match outcome {
        Ok(value) => target.resolve(value),
        Err(err) => match f(err) {
          Ok(recovered) => target.resolve(recovered),
          Err(err) => target.reject(TrickleError::from_continuation(err)),
        },
      };
    });
    derived
  }

  pub fn state(&self) -> CompletionState {
    match &*self.slot.lock() {
      Slot::Pending { .. } => CompletionState::Pending,
      Slot::Settled(Ok(_)) => CompletionState::Fulfilled,
      Slot::Settled(Err(_)) => CompletionState::Rejected,
    }
  }

  pub fn is_settled(&self) -> bool {
    self.state() != CompletionState::Pending
  }

  /// A copy of the outcome, if settled.
  pub fn peek(&self) -> Option<Outcome<T>> {
    match &*self.slot.lock() {
      Slot::Pending { .. } => None,
      Slot::Settled(outcome) => Some(outcome.clone()),
    }
  }

  /// Whether both handles point at the same cell.
  pub fn ptr_eq(&self, other: &Completion<T>) -> bool {
    Arc::ptr_eq(&self.slot, &other.slot)
  }
}

impl<T> Default for Completion<T>
where
  T: Clone + Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Future for Completion<T>
where
  T: Clone + Send + 'static,
{
  type Output = Outcome<T>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut slot = self.slot.lock();
    match &mut *slot {
      Slot::Settled(outcome) => Poll::Ready(outcome.clone()),
      Slot::Pending { wakers, .. } => {
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
          wakers.push(cx.waker().clone());
        }
        Poll::Pending
      }
    }
  }
}

impl<T> fmt::Debug for Completion<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = match &*self.slot.lock() {
      Slot::Pending { .. } => CompletionState::Pending,
      Slot::Settled(Ok(_)) => CompletionState::Fulfilled,
      Slot::Settled(Err(_)) => CompletionState::Rejected,
    };
    f.debug_struct("Completion").field("state", &state).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn settles_exactly_once() {
    let cell = Completion::<i32>::new();
    assert!(cell.resolve(1));
    assert!(!cell.resolve(2));
    assert!(!cell.reject(TrickleError::rejected(anyhow::anyhow!("late"))));
    assert_eq!(cell.peek().unwrap().unwrap(), 1);
    assert_eq!(cell.state(), CompletionState::Fulfilled);
  }

  #[test]
  fn callbacks_registered_before_and_after_settlement_both_run() {
    let cell = Completion::<i32>::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let early = hits.clone();
    cell.on_settle(move |outcome| {
      assert_eq!(outcome.unwrap(), 7);
      early.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    cell.resolve(7);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let late = hits.clone();
    cell.on_settle(move |_| {
      late.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn then_skips_rejections_and_catch_skips_fulfillments() {
    let rejected = Completion::<i32>::new();
    let mapped = rejected.then(|v| Ok(v * 10));
    rejected.reject(TrickleError::rejected(anyhow::anyhow!("boom")));
    assert!(matches!(mapped.peek(), Some(Err(TrickleError::Rejected { .. }))));

    let fulfilled = Completion::<i32>::new();
    let recovered = fulfilled.catch(|_| Ok(-1));
    fulfilled.resolve(3);
    assert_eq!(recovered.peek().unwrap().unwrap(), 3);
  }

  #[test]
  fn a_failing_handler_rejects_the_derived_completion() {
    let cell = Completion::<i32>::new();
    let derived = cell.then(|_| -> anyhow::Result<i32> { anyhow::bail!("handler broke") });
    cell.resolve(1);
    match derived.peek() {
      Some(Err(TrickleError::ContinuationFailure { reason })) => assert_eq!(reason.to_string(), "handler broke"),
      other => panic!("expected ContinuationFailure, got {:?}", other),
    }
  }

  #[test]
  fn clones_share_the_cell() {
    let cell = Completion::<&'static str>::new();
    let other = cell.clone();
    other.resolve("shared");
    assert!(cell.ptr_eq(&other));
    assert_eq!(cell.peek().unwrap().unwrap(), "shared");
  }
}

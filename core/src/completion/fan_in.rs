// trickle/src/completion/fan_in.rs

//! Combinators that fold several completions (or controllers) into one.

use super::cell::Completion;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{event, Level};

/// Anything that can be observed as a `Completion<T>`.
///
/// Implemented by `Completion<T>` itself and by `Controller<T>` (which exposes
/// its chain cursor, so continuations registered on the controller run first).
pub trait AsCompletion<T> {
  fn as_completion(&self) -> Completion<T>;
}

impl<T> AsCompletion<T> for Completion<T> {
  fn as_completion(&self) -> Completion<T> {
    self.clone()
  }
}

impl<T, C> AsCompletion<T> for &C
where
  C: AsCompletion<T> + ?Sized,
{
  fn as_completion(&self) -> Completion<T> {
    (**self).as_completion()
  }
}

struct Gather<T> {
  values: Vec<Option<T>>,
  remaining: usize,
}

/// Fulfills with every item's value, in item order, once all items have
/// fulfilled. Rejects with the first rejection observed.
///
/// An empty input fulfills immediately with an empty vector.
pub fn all<T, I>(items: I) -> Completion<Vec<T>>
where
  T: Clone + Send + 'static,
  I: IntoIterator,
  I::Item: AsCompletion<T>,
{
  let sources: Vec<Completion<T>> = items.into_iter().map(|item| item.as_completion()).collect();
  let combined = Completion::<Vec<T>>::new();
  event!(Level::TRACE, sources = sources.len(), "Gathering completions.");

  if sources.is_empty() {
    combined.resolve(Vec::new());
    return combined;
  }

  let gather = Arc::new(Mutex::new(Gather {
    values: (0..sources.len()).map(|_| None).collect(),
    remaining: sources.len(),
  }));

  for (index, source) in sources.iter().enumerate() {
    let gather = Arc::clone(&gather);
    let target = combined.clone();
    source.on_settle(move |outcome| match outcome {
      Ok(value) => {
        let finished = {
          let mut gather = gather.lock();
          gather.values[index] = Some(value);
          gather.remaining -= 1;
          if gather.remaining == 0 {
            Some(gather.values.drain(..).flatten().collect::<Vec<T>>())
          } else {
            None
          }
        };
        if let Some(values) = finished {
          target.resolve(values);
        }
      }
      Err(err) => {
        target.reject(err);
      }
    });
  }

  combined
}

/// Settles the same way as whichever item settles first.
///
/// An empty input never settles.
pub fn race<T, I>(items: I) -> Completion<T>
where
  T: Clone + Send + 'static,
  I: IntoIterator,
  I::Item: AsCompletion<T>,
{
  let winner = Completion::<T>::new();
  for item in items {
    let target = winner.clone();
    item.as_completion().on_settle(move |outcome| {
      match outcome {
        Ok(value) => target.resolve(value),
        Err(err) => target.reject(err),
      };
    });
  }
  winner
}

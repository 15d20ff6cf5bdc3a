// trickle/src/factory.rs

//! A reusable, mode-configured producer of controllers.

use crate::controller::Controller;
use crate::core::mode::Mode;
use crate::core::step::Step;
use crate::error::TrickleResult;
use crate::scheduler::{default_scheduler, Schedule};
use std::fmt;
use std::sync::Arc;

/// Produces controllers sharing one mode and one scheduler.
///
/// Each flag method returns a new factory and leaves the receiver untouched,
/// so a base factory can be specialised in several directions:
///
/// ```ignore
/// let base = Factory::new();
/// let manual_direct = base.clone().direct().manual_start();
/// let same_thing = base.manual_start().direct();
/// assert_eq!(manual_direct.mode(), same_thing.mode());
/// ```
#[derive(Clone)]
pub struct Factory {
  mode: Mode,
  scheduler: Arc<dyn Schedule>,
}

impl Factory {
  /// Default mode, deferring first advances onto the ambient tokio runtime.
  pub fn new() -> Self {
    Self::with_scheduler(default_scheduler())
  }

  pub fn with_scheduler(scheduler: Arc<dyn Schedule>) -> Self {
    Factory {
      mode: Mode::DEFAULT,
      scheduler,
    }
  }

  pub fn direct(self) -> Self {
    self.with_mode(Mode::DIRECT)
  }

  pub fn manual_start(self) -> Self {
    self.with_mode(Mode::MANUAL_START)
  }

  pub fn single_use(self) -> Self {
    self.with_mode(Mode::SINGLE_USE)
  }

  /// Adds the flags of `mode` to this factory's selection.
  pub fn with_mode(self, mode: Mode) -> Self {
    Factory {
      mode: self.mode | mode,
      ..self
    }
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn scheduler(&self) -> Arc<dyn Schedule> {
    Arc::clone(&self.scheduler)
  }

  /// Creates a controller with `steps` queued, seeded with `T::default()`.
  pub fn create<T, I>(&self, steps: I) -> TrickleResult<Controller<T>>
  where
    T: Clone + Default + Send + 'static,
    I: IntoIterator<Item = Step<T>>,
  {
    Controller::create(self.mode, self.scheduler(), steps)
  }

  pub fn create_seeded<T, I>(&self, seed: T, steps: I) -> TrickleResult<Controller<T>>
  where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Step<T>>,
  {
    Controller::create_seeded(self.mode, self.scheduler(), seed, steps)
  }

  /// Creates a controller with no steps queued yet.
  pub fn empty<T>(&self) -> TrickleResult<Controller<T>>
  where
    T: Clone + Default + Send + 'static,
  {
    self.create(std::iter::empty())
  }
}

impl Default for Factory {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Factory").field("mode", &self.mode).finish_non_exhaustive()
  }
}

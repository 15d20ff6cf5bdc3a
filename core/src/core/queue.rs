// trickle/src/core/queue.rs

//! The ordered list of pending steps owned by a controller.

use super::step::Step;
use std::collections::VecDeque;

/// FIFO of pending steps.
pub struct StepQueue<T> {
  steps: VecDeque<Step<T>>,
}

impl<T> StepQueue<T> {
  pub fn new() -> Self {
    Self { steps: VecDeque::new() }
  }

  pub fn push_back(&mut self, step: Step<T>) {
    self.steps.push_back(step);
  }

  pub fn pop_front(&mut self) -> Option<Step<T>> {
    self.steps.pop_front()
  }

  /// Discards up to `n` steps from the front without running them and returns
  /// how many were dropped.
  ///
  /// `n` is floored at 1: asking to skip zero or a negative number of steps
  /// still skips exactly one.
  pub fn drop_front(&mut self, n: i64) -> usize {
    let requested = usize::try_from(n.max(1)).unwrap_or(usize::MAX);
    let count = requested.min(self.steps.len());
    self.steps.drain(..count);
    count
  }

  pub fn clear(&mut self) {
    self.steps.clear();
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

impl<T> Default for StepQueue<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> std::fmt::Debug for StepQueue<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepQueue").field("len", &self.steps.len()).finish()
  }
}

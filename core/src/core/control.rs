// trickle/src/core/control.rs

//! Defines the lifecycle states of a controller.

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
  /// Constructed in manual-start mode and not yet advanced.
  Idle,
  /// A step is scheduled to run, running, or waiting for its advancer to be called.
  Advancing,
  /// The completion was fulfilled. Absorbing.
  Fulfilled,
  /// The completion was rejected. Absorbing.
  Rejected,
}

impl ControllerState {
  pub fn is_terminal(self) -> bool {
    matches!(self, ControllerState::Fulfilled | ControllerState::Rejected)
  }
}

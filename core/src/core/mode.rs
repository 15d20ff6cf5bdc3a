// trickle/src/core/mode.rs

//! The three execution-mode switches a controller is created with.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Immutable execution configuration of a controller.
///
/// Flags are additive and order-independent: `Mode::DIRECT | Mode::MANUAL_START`
/// is the same value as `Mode::MANUAL_START | Mode::DIRECT`, and so is
/// `Mode::default().manual_start().direct()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mode {
  direct: bool,
  manual_start: bool,
  single_use: bool,
}

impl Mode {
  /// Default mode: steps receive an advancer, the first advance is deferred
  /// to the scheduler, and one advancer is reused for the whole sequence.
  pub const DEFAULT: Mode = Mode {
    direct: false,
    manual_start: false,
    single_use: false,
  };

  /// Steps are invoked with the payload only; the caller captures the
  /// controller's advance operation itself.
  pub const DIRECT: Mode = Mode {
    direct: true,
    manual_start: false,
    single_use: false,
  };

  /// No deferred first advance; the controller stays idle until `advance` is called.
  pub const MANUAL_START: Mode = Mode {
    direct: false,
    manual_start: true,
    single_use: false,
  };

  /// Every step invocation gets a fresh advancer that only has effect once.
  ///
  /// Only advancer-taking steps are affected. Direct steps drive the
  /// controller through [`Controller::advancer`](crate::Controller::advancer),
  /// which is never guarded, so combined with `DIRECT` this flag does nothing.
  pub const SINGLE_USE: Mode = Mode {
    direct: false,
    manual_start: false,
    single_use: true,
  };

  pub const fn direct(self) -> Self {
    Mode { direct: true, ..self }
  }

  pub const fn manual_start(self) -> Self {
    Mode {
      manual_start: true,
      ..self
    }
  }

  pub const fn single_use(self) -> Self {
    Mode { single_use: true, ..self }
  }

  pub const fn is_direct(&self) -> bool {
    self.direct
  }

  pub const fn is_manual_start(&self) -> bool {
    self.manual_start
  }

  pub const fn is_single_use(&self) -> bool {
    self.single_use
  }

  /// Union of two selections.
  pub const fn union(self, other: Mode) -> Self {
    Mode {
      direct: self.direct || other.direct,
      manual_start: self.manual_start || other.manual_start,
      single_use: self.single_use || other.single_use,
    }
  }
}

impl BitOr for Mode {
  type Output = Mode;

  fn bitor(self, rhs: Mode) -> Mode {
    self.union(rhs)
  }
}

impl BitOrAssign for Mode {
  fn bitor_assign(&mut self, rhs: Mode) {
    *self = self.union(rhs);
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut flags = Vec::with_capacity(3);
    if self.direct {
      flags.push("direct");
    }
    if self.manual_start {
      flags.push("manual_start");
    }
    if self.single_use {
      flags.push("single_use");
    }
    if flags.is_empty() {
      f.write_str("default")
    } else {
      f.write_str(&flags.join("+"))
    }
  }
}

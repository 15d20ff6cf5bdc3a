// src/lib.rs

//! Trickle: a cooperative, single-threaded step sequencer for Rust.
//!
//! Register an ordered list of steps and let each one pass control forward
//! explicitly. The sequence settles one [`Completion`] when the queue runs dry,
//! a step stops it, or a step fails, and that completion can be `.await`ed
//! like any other future. Features:
//!  - Steps that advance synchronously or hand their [`Advancer`] to async work.
//!  - Skipping ahead (`skip(n)`) and early stopping with a value or an error.
//!  - Three independent mode switches: direct invocation, manual start and
//!    single-use advancers that ignore repeated calls.
//!  - Fluent continuation registration through a chain cursor.
//!  - Fan-in over several sequences with [`all`] and [`race`].

pub mod completion;
pub mod controller;
pub mod core;
pub mod error;
pub mod factory;
pub mod scheduler;

// --- Re-exports for the Public API ---

pub use crate::core::control::ControllerState;
pub use crate::core::mode::Mode;
pub use crate::core::step::{Step, StepResult};

pub use crate::controller::{Advancer, Controller, MAX_INLINE_DEPTH};
pub use crate::factory::Factory;

pub use crate::completion::{all, race, AsCompletion, Completion, CompletionState};
pub use crate::scheduler::{ManualScheduler, Schedule, Task, TokioScheduler};

pub use crate::error::{Reason, TrickleError, TrickleResult};

/*
    Core Workflow:
    1. Pick a payload type `T` (use a tuple for several values).
    2. Build a `Factory`, selecting `.direct()`, `.manual_start()` and/or `.single_use()`.
    3. Create a `Controller<T>` with its first steps, then `push` more while the
       first advance is still pending on the scheduler.
    4. Each step calls `advancer.advance(next)`, `advancer.skip(n)(next)`,
       `advancer.stop(value)` or returns `Err(..)`.
    5. Register `register_success` / `register_failure` continuations, or
       simply `controller.await`.
*/

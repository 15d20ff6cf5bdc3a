// trickle/src/completion/mod.rs

//! The single-assignment completion cell and the fan-in helpers built on it.

pub mod cell;
pub mod fan_in;

pub use cell::{Completion, CompletionState};
pub use fan_in::{all, race, AsCompletion};

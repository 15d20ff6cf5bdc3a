// trickle/src/controller/mod.rs

//! Defines the `Controller<T>` struct, its construction and queue management,
//! the advancement algorithm, and the `Advancer<T>` handle given to steps.

pub mod advancer;
pub mod definition;
pub mod execution;

pub use advancer::Advancer;
pub use definition::Controller;
pub use execution::MAX_INLINE_DEPTH;

pub mod control;
pub mod mode;
pub mod queue;
pub mod step;

// Re-export key types for easier access from other trickle modules (and lib.rs)
pub use control::ControllerState;
pub use mode::Mode;
pub use queue::StepQueue;
pub use step::{Step, StepResult};

//! Autonomous routine data model and execution.
//!
//! Routines are data: a named, ordered list of [`Step`]s. The
//! [`StepExecutor`] interprets them against the chassis and mechanism
//! actuators, strictly in sequence, and the [`RoutineRegistry`] holds the
//! set the operator picks from at match start.

mod executor;
mod registry;
pub mod routines;
mod step;

pub use executor::{CancelToken, RunOutcome, StepExecutor};
pub use registry::RoutineRegistry;
pub use step::{ActuatorCommand, Routine, Step};

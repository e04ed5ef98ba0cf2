//! spardha-ctl - Motion control and sensor arbitration for a competition robot
//!
//! This library is the match-control layer that sits between the driver
//! station and the hardware: it sequences autonomous routines against an
//! external chassis follower, runs the colour-sort monitor that rejects
//! opposing-alliance rings in real time, and arbitrates the one intake
//! motor both of them want to drive.
//!
//! ## Architecture
//!
//! Three execution contexts share the robot at runtime:
//!
//! - **Routine executor**: interprets a routine (an ordered list of
//!   motion and actuator steps) strictly in sequence
//! - **Colour-sort monitor** (~100Hz): samples the optical sensor and,
//!   on an impostor ring, claims the intake for a timed eject sequence
//! - **Skills supervisor**: runs the long skills routine on a background
//!   thread while polling for the operator abort signal
//!
//! The intake motor is the contended resource. Every write goes through
//! the [`intake::IntakeArbiter`], whose non-blocking advisory lock
//! guarantees that only one context commands the motor at a time; a
//! writer that loses the race skips its cycle and the skip is counted.
//!
//! Chassis motion, sensors, and operator input are consumed through the
//! narrow traits in [`hardware`], with mock implementations for
//! hardware-free testing.

pub mod auton;
pub mod config;
pub mod core;
pub mod error;
pub mod hardware;
pub mod intake;
pub mod shared;
pub mod skills;
pub mod sort;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};

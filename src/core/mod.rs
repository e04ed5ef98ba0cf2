//! Core motion and match types.

pub mod types;

pub use types::{normalize_heading, Alliance, DriveParams, HueWindow, Pose, Settle};

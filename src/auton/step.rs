//! Motion step and routine definitions.

use crate::core::{DriveParams, Pose};
use serde::{Deserialize, Serialize};

/// An actuation performed through the mechanism actuators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actuator", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Run the intake at the given voltage
    Intake { millivolts: i32 },
    /// Hold the intake braked
    IntakeBrake,
    /// Engage or release the goal clamp
    Clamp { engaged: bool },
}

/// One step of an autonomous routine.
///
/// Steps execute strictly in sequence: a step is not started until the
/// previous step's blocking call has returned, by settling, timing out,
/// or being cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Reset the chassis pose estimate, usually as the first step
    SetPose { pose: Pose },

    /// Drive to a field point, blocking until settled or timeout
    MoveToPoint {
        x: f32,
        y: f32,
        timeout_ms: u64,
        #[serde(default)]
        params: DriveParams,
    },

    /// Drive to a full pose, blocking until settled or timeout
    MoveToPose {
        pose: Pose,
        timeout_ms: u64,
        #[serde(default)]
        params: DriveParams,
    },

    /// Turn in place to a heading in degrees
    TurnToHeading { heading: f32, timeout_ms: u64 },

    /// Block for the exact duration, no early wake
    Delay { ms: u64 },

    /// Fire-and-forget actuator write, no settle wait
    Actuator(ActuatorCommand),
}

impl Step {
    /// Pose reset step.
    pub fn set_pose(x: f32, y: f32, heading: f32) -> Step {
        Step::SetPose {
            pose: Pose::new(x, y, heading),
        }
    }

    /// Point drive with default drive parameters.
    pub fn move_to_point(x: f32, y: f32, timeout_ms: u64) -> Step {
        Step::MoveToPoint {
            x,
            y,
            timeout_ms,
            params: DriveParams::default(),
        }
    }

    /// Point drive with explicit drive parameters.
    pub fn move_to_point_with(x: f32, y: f32, timeout_ms: u64, params: DriveParams) -> Step {
        Step::MoveToPoint {
            x,
            y,
            timeout_ms,
            params,
        }
    }

    /// Pose drive with explicit drive parameters.
    pub fn move_to_pose_with(
        x: f32,
        y: f32,
        heading: f32,
        timeout_ms: u64,
        params: DriveParams,
    ) -> Step {
        Step::MoveToPose {
            pose: Pose::new(x, y, heading),
            timeout_ms,
            params,
        }
    }

    /// In-place turn.
    pub fn turn_to(heading: f32, timeout_ms: u64) -> Step {
        Step::TurnToHeading {
            heading,
            timeout_ms,
        }
    }

    /// Fixed delay.
    pub fn delay(ms: u64) -> Step {
        Step::Delay { ms }
    }

    /// Intake voltage command.
    pub fn intake(millivolts: i32) -> Step {
        Step::Actuator(ActuatorCommand::Intake { millivolts })
    }

    /// Clamp command.
    pub fn clamp(engaged: bool) -> Step {
        Step::Actuator(ActuatorCommand::Clamp { engaged })
    }

    /// Step name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetPose { .. } => "set_pose",
            Step::MoveToPoint { .. } => "move_to_point",
            Step::MoveToPose { .. } => "move_to_pose",
            Step::TurnToHeading { .. } => "turn_to_heading",
            Step::Delay { .. } => "delay",
            Step::Actuator(ActuatorCommand::Intake { .. }) => "intake",
            Step::Actuator(ActuatorCommand::IntakeBrake) => "intake_brake",
            Step::Actuator(ActuatorCommand::Clamp { .. }) => "clamp",
        }
    }
}

/// A named, ordered sequence of steps executed once per match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Routine {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_serializes_as_data() {
        let routine = Routine::new(
            "Demo",
            vec![
                Step::set_pose(0.0, 0.0, 290.0),
                Step::intake(12_000),
                Step::move_to_point(34.0, -25.0, 2000),
                Step::delay(500),
            ],
        );

        // toml round-trip: routines are replayable without a robot
        let encoded = toml::to_string(&routine).unwrap();
        let decoded: Routine = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, routine);
    }
}

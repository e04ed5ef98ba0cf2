//! Hardware capability traits and device construction.
//!
//! The chassis follower, the intake motor, the clamp piston, the optical
//! sensor, and the operator's controller are external collaborators. This
//! module defines the narrow traits the control layer consumes them
//! through, and a factory that assembles a device rig from config. Only
//! the mock rig is compiled into this crate; a hardware port supplies its
//! own implementations of these traits.

pub mod mock;

use crate::config::Config;
use crate::core::{DriveParams, Pose, Settle};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Chassis motion capability.
///
/// Motion calls are logically blocking: they return once the chassis
/// reports the motion settled or the timeout elapses. `cancel_all_motions`
/// unblocks any in-flight call immediately.
pub trait Chassis: Send + Sync {
    /// Reset the pose estimate.
    fn set_pose(&self, pose: Pose) -> Result<()>;

    /// Drive to a field point, blocking until settled or timeout.
    fn move_to_point(&self, x: f32, y: f32, timeout: Duration, params: DriveParams)
        -> Result<Settle>;

    /// Drive to a full pose, blocking until settled or timeout.
    fn move_to_pose(&self, target: Pose, timeout: Duration, params: DriveParams)
        -> Result<Settle>;

    /// Turn in place to a heading in degrees. The chassis resolves the
    /// shorter rotational direction.
    fn turn_to_heading(&self, heading: f32, timeout: Duration) -> Result<Settle>;

    /// Halt any in-flight motion immediately.
    fn cancel_all_motions(&self);

    /// Current pose estimate.
    fn pose(&self) -> Pose;
}

/// Intake motor handle.
///
/// Reads return `Result` so an unavailable sensor is distinguishable from
/// a zero reading.
pub trait IntakeMotor: Send + Sync {
    /// Command a voltage in millivolts, -12000 to 12000.
    fn set_millivolts(&self, mv: i32) -> Result<()>;

    /// Hold the motor braked.
    fn brake(&self) -> Result<()>;

    /// Measured velocity.
    fn velocity(&self) -> Result<f32>;

    /// Currently commanded voltage in millivolts.
    fn millivolts(&self) -> Result<i32>;
}

/// Pneumatic piston handle.
pub trait Piston: Send + Sync {
    /// Extend or retract the piston.
    fn set(&self, engaged: bool) -> Result<()>;

    /// Last commanded state.
    fn value(&self) -> bool;
}

/// Optical hue sensor.
pub trait HueSensor: Send + Sync {
    /// Sampled hue in degrees `[0, 360)`. Errors mean the sensor could
    /// not be read, not that no object was seen.
    fn hue(&self) -> Result<f32>;
}

/// Operator controller inputs, edge-triggered: each method reports true
/// exactly once per physical press.
pub trait OperatorInput: Send + Sync {
    /// Colour-sort toggle button was newly pressed.
    fn sort_toggle_pressed(&self) -> bool;

    /// Skills abort button was newly pressed.
    fn abort_pressed(&self) -> bool;
}

/// The device set the control layer runs against.
pub struct Rig {
    pub chassis: Arc<dyn Chassis>,
    pub intake: Arc<dyn IntakeMotor>,
    pub clamp: Arc<dyn Piston>,
    pub hue_sensor: Arc<dyn HueSensor>,
    pub operator: Arc<dyn OperatorInput>,
}

/// Assemble the device rig named by the config.
pub fn build_rig(config: &Config) -> Result<Rig> {
    match config.device.device_type.as_str() {
        "mock" => {
            log::info!("Device: {} (mock)", config.device.name);
            let latency = Duration::from_millis(config.device.motion_latency_ms);
            Ok(Rig {
                chassis: Arc::new(mock::MockChassis::with_latency(latency)),
                intake: Arc::new(mock::MockIntakeMotor::new()),
                clamp: Arc::new(mock::MockPiston::new()),
                hue_sensor: Arc::new(mock::ScriptedHueSensor::new()),
                operator: Arc::new(mock::ScriptedInput::new()),
            })
        }
        other => Err(Error::UnsupportedDevice(other.to_string())),
    }
}

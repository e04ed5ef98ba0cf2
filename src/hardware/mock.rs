//! Mock device implementations for hardware-free testing.
//!
//! The mock chassis records every call it receives so tests can assert
//! on exact command sequences and their timing, and optionally simulates
//! per-motion settle latency so concurrency behavior (cancellation,
//! blocking order) can be exercised without a robot.

use super::{Chassis, HueSensor, IntakeMotor, OperatorInput, Piston};
use crate::core::{DriveParams, Pose, Settle};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A chassis call captured by [`MockChassis`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChassisCall {
    SetPose(Pose),
    MoveToPoint {
        x: f32,
        y: f32,
        timeout_ms: u64,
        params: DriveParams,
    },
    MoveToPose {
        pose: Pose,
        timeout_ms: u64,
        params: DriveParams,
    },
    TurnToHeading {
        heading: f32,
        timeout_ms: u64,
    },
    CancelAllMotions,
}

/// Recording chassis with configurable settle latency.
///
/// Motions block for `min(latency, timeout)` (sliced so `cancel_all_motions`
/// unblocks them), then report [`Settle::TimedOut`] when the latency did
/// not fit in the timeout.
pub struct MockChassis {
    calls: Mutex<Vec<(Instant, ChassisCall)>>,
    pose: Mutex<Pose>,
    latency: Duration,
    cancelled: AtomicBool,
    force_timeouts: AtomicBool,
}

impl MockChassis {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            pose: Mutex::new(Pose::origin()),
            latency,
            cancelled: AtomicBool::new(false),
            force_timeouts: AtomicBool::new(false),
        }
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<ChassisCall> {
        self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Recorded calls with the instant each was issued.
    pub fn timed_calls(&self) -> Vec<(Instant, ChassisCall)> {
        self.calls.lock().clone()
    }

    /// Number of `cancel_all_motions` calls received.
    pub fn cancel_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(_, c)| matches!(c, ChassisCall::CancelAllMotions))
            .count()
    }

    /// Make every subsequent motion report [`Settle::TimedOut`].
    pub fn force_timeouts(&self, force: bool) {
        self.force_timeouts.store(force, Ordering::Release);
    }

    fn record(&self, call: ChassisCall) {
        self.calls.lock().push((Instant::now(), call));
    }

    fn settle(&self, timeout: Duration) -> Settle {
        let block_for = self.latency.min(timeout);
        let deadline = Instant::now() + block_for;
        while Instant::now() < deadline {
            if self.cancelled.load(Ordering::Acquire) {
                return Settle::TimedOut;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        if self.force_timeouts.load(Ordering::Acquire) || self.latency > timeout {
            Settle::TimedOut
        } else {
            Settle::Settled
        }
    }
}

impl Default for MockChassis {
    fn default() -> Self {
        Self::new()
    }
}

impl Chassis for MockChassis {
    fn set_pose(&self, pose: Pose) -> Result<()> {
        self.record(ChassisCall::SetPose(pose));
        *self.pose.lock() = pose;
        Ok(())
    }

    fn move_to_point(
        &self,
        x: f32,
        y: f32,
        timeout: Duration,
        params: DriveParams,
    ) -> Result<Settle> {
        self.record(ChassisCall::MoveToPoint {
            x,
            y,
            timeout_ms: timeout.as_millis() as u64,
            params,
        });
        let settle = self.settle(timeout);
        let mut pose = self.pose.lock();
        pose.x = x;
        pose.y = y;
        Ok(settle)
    }

    fn move_to_pose(&self, target: Pose, timeout: Duration, params: DriveParams) -> Result<Settle> {
        self.record(ChassisCall::MoveToPose {
            pose: target,
            timeout_ms: timeout.as_millis() as u64,
            params,
        });
        let settle = self.settle(timeout);
        *self.pose.lock() = target;
        Ok(settle)
    }

    fn turn_to_heading(&self, heading: f32, timeout: Duration) -> Result<Settle> {
        self.record(ChassisCall::TurnToHeading {
            heading,
            timeout_ms: timeout.as_millis() as u64,
        });
        let settle = self.settle(timeout);
        self.pose.lock().heading = crate::core::normalize_heading(heading);
        Ok(settle)
    }

    fn cancel_all_motions(&self) {
        self.record(ChassisCall::CancelAllMotions);
        self.cancelled.store(true, Ordering::Release);
    }

    fn pose(&self) -> Pose {
        *self.pose.lock()
    }
}

/// An intake command captured by [`MockIntakeMotor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeCall {
    SetMillivolts(i32),
    Brake,
}

/// Mock intake motor.
pub struct MockIntakeMotor {
    state: Mutex<MockIntakeState>,
    fail_reads: AtomicBool,
}

#[derive(Debug, Default)]
struct MockIntakeState {
    millivolts: i32,
    braked: bool,
    velocity: f32,
    calls: Vec<IntakeCall>,
}

impl MockIntakeMotor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockIntakeState::default()),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Set the velocity the motor will report.
    pub fn set_reported_velocity(&self, velocity: f32) {
        self.state.lock().velocity = velocity;
    }

    /// Make velocity/voltage reads fail, as an unplugged motor would.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Release);
    }

    /// Every recorded command, in order.
    pub fn calls(&self) -> Vec<IntakeCall> {
        self.state.lock().calls.clone()
    }

    /// Last commanded voltage.
    pub fn commanded_millivolts(&self) -> i32 {
        self.state.lock().millivolts
    }

    /// Is the motor currently braked?
    pub fn is_braked(&self) -> bool {
        self.state.lock().braked
    }
}

impl Default for MockIntakeMotor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeMotor for MockIntakeMotor {
    fn set_millivolts(&self, mv: i32) -> Result<()> {
        let mut state = self.state.lock();
        state.millivolts = mv;
        state.braked = false;
        state.calls.push(IntakeCall::SetMillivolts(mv));
        Ok(())
    }

    fn brake(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.millivolts = 0;
        state.braked = true;
        state.calls.push(IntakeCall::Brake);
        Ok(())
    }

    fn velocity(&self) -> Result<f32> {
        if self.fail_reads.load(Ordering::Acquire) {
            return Err(Error::SensorUnavailable("intake encoder"));
        }
        Ok(self.state.lock().velocity)
    }

    fn millivolts(&self) -> Result<i32> {
        if self.fail_reads.load(Ordering::Acquire) {
            return Err(Error::SensorUnavailable("intake motor"));
        }
        Ok(self.state.lock().millivolts)
    }
}

/// Mock piston remembering its command history.
pub struct MockPiston {
    engaged: AtomicBool,
    history: Mutex<Vec<bool>>,
}

impl MockPiston {
    pub fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every state this piston was commanded to, in order.
    pub fn history(&self) -> Vec<bool> {
        self.history.lock().clone()
    }
}

impl Default for MockPiston {
    fn default() -> Self {
        Self::new()
    }
}

impl Piston for MockPiston {
    fn set(&self, engaged: bool) -> Result<()> {
        self.engaged.store(engaged, Ordering::Release);
        self.history.lock().push(engaged);
        Ok(())
    }

    fn value(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

/// Scripted hue sensor: returns queued samples in order, then a fixed
/// ambient hue once the script is exhausted.
pub struct ScriptedHueSensor {
    samples: Mutex<VecDeque<HueSample>>,
    ambient: f32,
}

#[derive(Debug, Clone, Copy)]
enum HueSample {
    Hue(f32),
    Unavailable,
}

impl ScriptedHueSensor {
    /// Ambient hue outside both alliances' ring windows.
    pub const AMBIENT_HUE: f32 = 120.0;

    pub fn new() -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
            ambient: Self::AMBIENT_HUE,
        }
    }

    /// Queue a hue sample.
    pub fn push_hue(&self, hue: f32) {
        self.samples.lock().push_back(HueSample::Hue(hue));
    }

    /// Queue several hue samples.
    pub fn push_hues<I: IntoIterator<Item = f32>>(&self, hues: I) {
        let mut samples = self.samples.lock();
        samples.extend(hues.into_iter().map(HueSample::Hue));
    }

    /// Queue a failed read.
    pub fn push_error(&self) {
        self.samples.lock().push_back(HueSample::Unavailable);
    }
}

impl Default for ScriptedHueSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl HueSensor for ScriptedHueSensor {
    fn hue(&self) -> Result<f32> {
        match self.samples.lock().pop_front() {
            Some(HueSample::Hue(h)) => Ok(h),
            Some(HueSample::Unavailable) => Err(Error::SensorUnavailable("optical sensor")),
            None => Ok(self.ambient),
        }
    }
}

/// Scripted operator input. Each queued press is consumed by exactly one
/// poll, matching controller new-press semantics.
pub struct ScriptedInput {
    sort_toggle: AtomicU32,
    abort: AtomicU32,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self {
            sort_toggle: AtomicU32::new(0),
            abort: AtomicU32::new(0),
        }
    }

    /// Queue a colour-sort toggle press.
    pub fn press_sort_toggle(&self) {
        self.sort_toggle.fetch_add(1, Ordering::AcqRel);
    }

    /// Queue a skills abort press.
    pub fn press_abort(&self) {
        self.abort.fetch_add(1, Ordering::AcqRel);
    }

    fn consume(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for ScriptedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorInput for ScriptedInput {
    fn sort_toggle_pressed(&self) -> bool {
        Self::consume(&self.sort_toggle)
    }

    fn abort_pressed(&self) -> bool {
        Self::consume(&self.abort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chassis_records_calls_in_order() {
        let chassis = MockChassis::new();
        chassis.set_pose(Pose::new(0.0, 0.0, 290.0)).unwrap();
        chassis
            .move_to_point(34.0, -25.0, Duration::from_millis(2000), DriveParams::default())
            .unwrap();

        let calls = chassis.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ChassisCall::SetPose(Pose::new(0.0, 0.0, 290.0)));
        assert!(matches!(calls[1], ChassisCall::MoveToPoint { x, .. } if x == 34.0));
        assert_eq!(chassis.pose().x, 34.0);
    }

    #[test]
    fn test_chassis_times_out_when_latency_exceeds_timeout() {
        let chassis = MockChassis::with_latency(Duration::from_millis(20));
        let settle = chassis
            .move_to_point(1.0, 1.0, Duration::from_millis(5), DriveParams::default())
            .unwrap();
        assert!(settle.timed_out());
    }

    #[test]
    fn test_cancel_unblocks_motion() {
        use std::sync::Arc;

        let chassis = Arc::new(MockChassis::with_latency(Duration::from_secs(5)));
        let mover = Arc::clone(&chassis);
        let handle = std::thread::spawn(move || {
            mover.move_to_point(1.0, 1.0, Duration::from_secs(5), DriveParams::default())
        });
        std::thread::sleep(Duration::from_millis(20));
        chassis.cancel_all_motions();
        let settle = handle.join().unwrap().unwrap();
        assert!(settle.timed_out());
    }

    #[test]
    fn test_scripted_hue_sensor_falls_back_to_ambient() {
        let sensor = ScriptedHueSensor::new();
        sensor.push_hue(210.0);
        sensor.push_error();
        assert_eq!(sensor.hue().unwrap(), 210.0);
        assert!(sensor.hue().is_err());
        assert_eq!(sensor.hue().unwrap(), ScriptedHueSensor::AMBIENT_HUE);
    }

    #[test]
    fn test_scripted_input_consumes_one_press_per_poll() {
        let input = ScriptedInput::new();
        input.press_sort_toggle();
        input.press_sort_toggle();
        assert!(input.sort_toggle_pressed());
        assert!(input.sort_toggle_pressed());
        assert!(!input.sort_toggle_pressed());
        assert!(!input.abort_pressed());
    }
}

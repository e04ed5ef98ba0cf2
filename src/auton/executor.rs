//! Sequential step interpreter.

use super::step::{ActuatorCommand, Routine, Step};
use crate::core::Settle;
use crate::error::Result;
use crate::hardware::{Chassis, Piston};
use crate::intake::IntakeArbiter;
use crate::shared::SharedState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cooperative cancellation token.
///
/// Checked between steps only: the step in flight always completes, then
/// the executor stops cleanly. Cloning shares the token.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a routine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran
    Completed,
    /// Cancellation was requested; remaining steps were skipped
    Cancelled,
}

/// Interprets routines against the chassis and mechanism actuators.
///
/// Steps are totally ordered: step N+1 is issued only after step N's
/// call has returned. Intake writes go through the arbiter, so the
/// executor can never fight the colour-sort monitor for the motor.
pub struct StepExecutor {
    chassis: Arc<dyn Chassis>,
    intake: Arc<IntakeArbiter>,
    clamp: Arc<dyn Piston>,
    shared: Arc<SharedState>,
}

impl StepExecutor {
    pub fn new(
        chassis: Arc<dyn Chassis>,
        intake: Arc<IntakeArbiter>,
        clamp: Arc<dyn Piston>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            chassis,
            intake,
            clamp,
            shared,
        }
    }

    /// The chassis this executor drives.
    pub fn chassis(&self) -> &Arc<dyn Chassis> {
        &self.chassis
    }

    /// Run a routine to completion or cancellation.
    pub fn run(&self, routine: &Routine, cancel: &CancelToken) -> Result<RunOutcome> {
        log::info!(
            "running routine \"{}\" ({} steps)",
            routine.name,
            routine.steps.len()
        );
        for (i, step) in routine.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!(
                    "routine \"{}\" cancelled before step {}/{}",
                    routine.name,
                    i + 1,
                    routine.steps.len()
                );
                return Ok(RunOutcome::Cancelled);
            }
            log::debug!("step {}/{}: {}", i + 1, routine.steps.len(), step.name());
            self.execute(step)?;
        }
        log::info!("routine \"{}\" complete", routine.name);
        Ok(RunOutcome::Completed)
    }

    fn execute(&self, step: &Step) -> Result<()> {
        match step {
            Step::SetPose { pose } => self.chassis.set_pose(*pose),
            Step::MoveToPoint {
                x,
                y,
                timeout_ms,
                params,
            } => {
                let settle = self.chassis.move_to_point(
                    *x,
                    *y,
                    Duration::from_millis(*timeout_ms),
                    *params,
                )?;
                self.observe(settle, step);
                Ok(())
            }
            Step::MoveToPose {
                pose,
                timeout_ms,
                params,
            } => {
                let settle =
                    self.chassis
                        .move_to_pose(*pose, Duration::from_millis(*timeout_ms), *params)?;
                self.observe(settle, step);
                Ok(())
            }
            Step::TurnToHeading {
                heading,
                timeout_ms,
            } => {
                let settle = self
                    .chassis
                    .turn_to_heading(*heading, Duration::from_millis(*timeout_ms))?;
                self.observe(settle, step);
                Ok(())
            }
            Step::Delay { ms } => {
                thread::sleep(Duration::from_millis(*ms));
                Ok(())
            }
            Step::Actuator(cmd) => self.actuate(*cmd),
        }
    }

    /// A timeout means the routine proceeds with a possibly-unsettled
    /// pose. Accepted, but never silent.
    fn observe(&self, settle: Settle, step: &Step) {
        if settle.timed_out() {
            self.shared.record_motion_timeout();
            log::warn!("{} timed out, continuing", step.name());
        }
    }

    fn actuate(&self, cmd: ActuatorCommand) -> Result<()> {
        match cmd {
            ActuatorCommand::Intake { millivolts } => {
                self.intake.set_millivolts(millivolts)?;
                Ok(())
            }
            ActuatorCommand::IntakeBrake => {
                self.intake.brake()?;
                Ok(())
            }
            ActuatorCommand::Clamp { engaged } => self.clamp.set(engaged),
        }
    }
}

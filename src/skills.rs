//! Cancellable supervisor for long autonomous routines.
//!
//! Driver skills runs the full skills script during the driver-control
//! period, so the operator must be able to pull the plug at any moment.
//! The supervisor runs the routine on a background thread and polls the
//! abort input; on abort it cancels the routine's token and halts any
//! in-flight chassis motion, then waits for the routine to wind down
//! after its current step. The poll loop also exits when the routine
//! finishes naturally, so no watcher outlives its purpose.

use crate::auton::{CancelToken, Routine, RunOutcome, StepExecutor};
use crate::config::SkillsConfig;
use crate::error::{Error, Result};
use crate::hardware::{Chassis, OperatorInput};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillsOutcome {
    /// The routine ran every step
    Completed,
    /// The operator aborted; the routine stopped after its current step
    Aborted,
}

/// Watches a background routine for the operator abort signal.
pub struct SkillsSupervisor {
    chassis: Arc<dyn Chassis>,
    operator: Arc<dyn OperatorInput>,
    poll_interval: Duration,
}

impl SkillsSupervisor {
    pub fn new(
        chassis: Arc<dyn Chassis>,
        operator: Arc<dyn OperatorInput>,
        config: &SkillsConfig,
    ) -> Self {
        Self {
            chassis,
            operator,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Run `routine` on a background thread, blocking until it completes
    /// or the operator aborts it.
    ///
    /// On abort, `cancel_all_motions` is issued exactly once so the
    /// in-flight motion returns immediately; the routine thread then
    /// observes its token and stops.
    pub fn run(&self, executor: Arc<StepExecutor>, routine: Routine) -> Result<SkillsOutcome> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let name = routine.name.clone();
        let handle = thread::Builder::new()
            .name("skills-routine".to_string())
            .spawn(move || executor.run(&routine, &token))?;

        log::info!("skills supervisor watching \"{}\" for abort", name);
        let mut aborted = false;
        loop {
            if !aborted && self.operator.abort_pressed() {
                log::warn!("skills abort requested");
                cancel.cancel();
                self.chassis.cancel_all_motions();
                aborted = true;
            }
            if handle.is_finished() {
                break;
            }
            thread::sleep(self.poll_interval);
        }

        let outcome = handle
            .join()
            .map_err(|_| Error::Other(format!("routine \"{}\" panicked", name)))??;
        Ok(match outcome {
            RunOutcome::Completed => SkillsOutcome::Completed,
            RunOutcome::Cancelled => SkillsOutcome::Aborted,
        })
    }
}

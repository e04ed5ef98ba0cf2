//! Intake actuator arbitration.
//!
//! The intake motor is shared between the routine executor and the
//! colour-sort monitor. [`IntakeArbiter`] is the only write path to it:
//! every writer goes through the advisory lock, so two contexts can never
//! interleave voltage commands. The lock never blocks; a writer that
//! loses the race skips its write for that cycle.

use crate::error::Result;
use crate::hardware::IntakeMotor;
use crate::shared::SharedState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Maximum intake voltage magnitude in millivolts.
pub const INTAKE_MAX_MV: i32 = 12_000;

/// Non-blocking advisory lock over the intake actuator.
///
/// `try_acquire` either takes ownership or reports the lock held; there
/// is no waiting and no ownership queue.
#[derive(Debug, Default)]
pub struct AdvisoryLock {
    held: AtomicBool,
}

impl AdvisoryLock {
    pub fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Attempt to take the lock. Returns false if it is already held.
    pub fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Release the lock unconditionally.
    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    /// Is the lock currently held?
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Sole write path to the intake motor.
pub struct IntakeArbiter {
    motor: Arc<dyn IntakeMotor>,
    lock: AdvisoryLock,
    shared: Arc<SharedState>,
}

impl IntakeArbiter {
    pub fn new(motor: Arc<dyn IntakeMotor>, shared: Arc<SharedState>) -> Self {
        Self {
            motor,
            lock: AdvisoryLock::new(),
            shared,
        }
    }

    /// One-shot guarded voltage write. Returns false if the write was
    /// skipped because another context holds the lock.
    pub fn set_millivolts(&self, mv: i32) -> Result<bool> {
        if !self.lock.try_acquire() {
            self.note_contention("voltage");
            return Ok(false);
        }
        let result = self.motor.set_millivolts(clamp_mv(mv));
        self.lock.release();
        result.map(|()| true)
    }

    /// One-shot guarded brake. Returns false if skipped.
    pub fn brake(&self) -> Result<bool> {
        if !self.lock.try_acquire() {
            self.note_contention("brake");
            return Ok(false);
        }
        let result = self.motor.brake();
        self.lock.release();
        result.map(|()| true)
    }

    /// Measured intake velocity, for stall detection.
    pub fn velocity(&self) -> Result<f32> {
        self.motor.velocity()
    }

    /// Currently commanded intake voltage.
    pub fn commanded_millivolts(&self) -> Result<i32> {
        self.motor.millivolts()
    }

    /// Is the actuator currently claimed?
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    fn note_contention(&self, what: &str) {
        self.shared.record_lock_contention();
        log::debug!("intake {} write skipped, lock held", what);
    }
}

/// Exclusive hold on the intake for a multi-step override sequence.
///
/// Dropping the hold releases the lock, so an override that is cancelled
/// mid-sequence still hands the actuator back.
pub struct IntakeHold {
    arbiter: Arc<IntakeArbiter>,
}

impl IntakeHold {
    /// Attempt to claim the intake. On contention the shared counter is
    /// incremented and `None` is returned.
    pub fn acquire(arbiter: &Arc<IntakeArbiter>) -> Option<IntakeHold> {
        if arbiter.lock.try_acquire() {
            Some(IntakeHold {
                arbiter: Arc::clone(arbiter),
            })
        } else {
            arbiter.note_contention("hold");
            None
        }
    }

    /// Command a voltage while holding the lock.
    pub fn set_millivolts(&self, mv: i32) -> Result<()> {
        self.arbiter.motor.set_millivolts(clamp_mv(mv))
    }

    /// Brake while holding the lock.
    pub fn brake(&self) -> Result<()> {
        self.arbiter.motor.brake()
    }
}

impl Drop for IntakeHold {
    fn drop(&mut self) {
        self.arbiter.lock.release();
    }
}

fn clamp_mv(mv: i32) -> i32 {
    mv.clamp(-INTAKE_MAX_MV, INTAKE_MAX_MV)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::{IntakeCall, MockIntakeMotor};

    fn arbiter() -> (Arc<IntakeArbiter>, Arc<MockIntakeMotor>, Arc<SharedState>) {
        let motor = Arc::new(MockIntakeMotor::new());
        let shared = Arc::new(SharedState::default());
        let arbiter = Arc::new(IntakeArbiter::new(
            Arc::clone(&motor) as Arc<dyn crate::hardware::IntakeMotor>,
            Arc::clone(&shared),
        ));
        (arbiter, motor, shared)
    }

    #[test]
    fn test_advisory_lock_semantics() {
        let lock = AdvisoryLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(lock.try_acquire());
        // release is unconditional
        lock.release();
        lock.release();
        assert!(lock.try_acquire());
    }

    #[test]
    fn test_one_shot_write_applies_and_clamps() {
        let (arbiter, motor, shared) = arbiter();
        assert!(arbiter.set_millivolts(20_000).unwrap());
        assert_eq!(motor.commanded_millivolts(), INTAKE_MAX_MV);
        assert!(!arbiter.is_locked());
        assert_eq!(shared.lock_contention(), 0);
    }

    #[test]
    fn test_hold_blocks_one_shot_writes() {
        let (arbiter, motor, shared) = arbiter();
        let hold = IntakeHold::acquire(&arbiter).unwrap();
        hold.brake().unwrap();

        // a concurrent one-shot write is skipped and counted
        assert!(!arbiter.set_millivolts(12_000).unwrap());
        assert_eq!(shared.lock_contention(), 1);
        assert!(motor.is_braked());

        drop(hold);
        assert!(!arbiter.is_locked());
        assert!(arbiter.set_millivolts(12_000).unwrap());
        assert_eq!(
            motor.calls(),
            vec![IntakeCall::Brake, IntakeCall::SetMillivolts(12_000)]
        );
    }

    #[test]
    fn test_second_hold_fails_while_first_exists() {
        let (arbiter, _motor, shared) = arbiter();
        let _hold = IntakeHold::acquire(&arbiter).unwrap();
        assert!(IntakeHold::acquire(&arbiter).is_none());
        assert_eq!(shared.lock_contention(), 1);
    }
}

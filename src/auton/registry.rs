//! Routine registry and match-start selection.

use super::executor::{CancelToken, RunOutcome, StepExecutor};
use super::step::Routine;
use crate::error::{Error, Result};
use crate::shared::SharedState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds the registered routines in registration order and runs exactly
/// one of them per match.
///
/// The external selector UI lists [`names`](RoutineRegistry::names) and
/// invokes [`select_and_run`](RoutineRegistry::select_and_run) once; a
/// second selection is rejected rather than racing the first.
pub struct RoutineRegistry {
    routines: Vec<Routine>,
    selected: AtomicBool,
    shared: Arc<SharedState>,
}

impl RoutineRegistry {
    pub fn new(shared: Arc<SharedState>) -> Self {
        Self {
            routines: Vec::new(),
            selected: AtomicBool::new(false),
            shared,
        }
    }

    /// Register a routine. Call at process start; order is preserved.
    pub fn register(&mut self, routine: Routine) {
        if self.routines.iter().any(|r| r.name == routine.name) {
            log::warn!("routine \"{}\" registered twice, keeping first", routine.name);
            return;
        }
        self.routines.push(routine);
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.routines.iter().map(|r| r.name.as_str()).collect()
    }

    /// Look up a routine by name.
    pub fn get(&self, name: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name)
    }

    /// Run the named routine synchronously, exactly once per match.
    ///
    /// Publishes the routine name for display, then blocks until the
    /// routine completes or is cancelled through `cancel`.
    pub fn select_and_run(
        &self,
        name: &str,
        executor: &StepExecutor,
        cancel: &CancelToken,
    ) -> Result<RunOutcome> {
        let routine = self
            .get(name)
            .ok_or_else(|| Error::UnknownRoutine(name.to_string()))?;
        if self
            .selected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::RoutineBusy);
        }
        self.shared.set_routine_name(&routine.name);
        executor.run(routine, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auton::Step;

    #[test]
    fn test_names_preserve_registration_order() {
        let mut registry = RoutineRegistry::new(Arc::new(SharedState::default()));
        registry.register(Routine::new("B", vec![Step::delay(1)]));
        registry.register(Routine::new("A", vec![Step::delay(1)]));
        registry.register(Routine::new("C", vec![Step::delay(1)]));
        assert_eq!(registry.names(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = RoutineRegistry::new(Arc::new(SharedState::default()));
        registry.register(Routine::new("A", vec![Step::delay(1)]));
        registry.register(Routine::new("A", vec![Step::delay(2)]));
        assert_eq!(registry.names(), vec!["A"]);
        assert_eq!(registry.get("A").unwrap().steps, vec![Step::delay(1)]);
    }
}

//! Shared state for the concurrent control contexts.
//!
//! Everything the match's execution contexts share lives here or in the
//! intake arbiter: the colour-sort toggle, the shutdown flag, the current
//! routine name, and the diagnostic counters. These were free-floating
//! globals in earlier firmware generations; on OS threads they need real
//! synchronization, so the whole struct is atomics plus one mutex, shared
//! via `Arc`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Shared state between the routine executor, the colour-sort monitor,
/// and the skills supervisor.
#[derive(Debug)]
pub struct SharedState {
    /// Operator-facing colour-sort toggle; gates new impostor detections
    colour_sort_enabled: AtomicBool,

    /// Process shutdown signal
    shutdown: AtomicBool,

    /// Display name of the routine currently selected, if any
    routine_name: Mutex<Option<String>>,

    /// Completed eject sequences
    ejects: AtomicU32,

    /// Intake writes skipped because the advisory lock was held
    lock_contention: AtomicU32,

    /// Chassis motions that ran out their timeout
    motion_timeouts: AtomicU32,

    /// Failed hue/velocity sensor reads
    sensor_errors: AtomicU32,

    /// Completed anti-jam recoveries
    jam_recoveries: AtomicU32,
}

impl SharedState {
    /// Create shared state with the given initial colour-sort toggle.
    pub fn new(colour_sort_enabled: bool) -> Self {
        Self {
            colour_sort_enabled: AtomicBool::new(colour_sort_enabled),
            shutdown: AtomicBool::new(false),
            routine_name: Mutex::new(None),
            ejects: AtomicU32::new(0),
            lock_contention: AtomicU32::new(0),
            motion_timeouts: AtomicU32::new(0),
            sensor_errors: AtomicU32::new(0),
            jam_recoveries: AtomicU32::new(0),
        }
    }

    /// Is the colour-sort monitor permitted to act this cycle?
    pub fn colour_sort_enabled(&self) -> bool {
        self.colour_sort_enabled.load(Ordering::Acquire)
    }

    /// Flip the colour-sort toggle, returning the new value.
    pub fn toggle_colour_sort(&self) -> bool {
        !self.colour_sort_enabled.fetch_xor(true, Ordering::AcqRel)
    }

    /// Set the colour-sort toggle directly.
    pub fn set_colour_sort_enabled(&self, enabled: bool) {
        self.colour_sort_enabled.store(enabled, Ordering::Release);
    }

    /// Signal shutdown to every worker loop.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Publish the selected routine's display name.
    pub fn set_routine_name(&self, name: &str) {
        *self.routine_name.lock() = Some(name.to_string());
    }

    /// The selected routine's display name, if one has been selected.
    pub fn routine_name(&self) -> Option<String> {
        self.routine_name.lock().clone()
    }

    pub fn record_eject(&self) {
        self.ejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ejects(&self) -> u32 {
        self.ejects.load(Ordering::Relaxed)
    }

    pub fn record_lock_contention(&self) {
        self.lock_contention.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lock_contention(&self) -> u32 {
        self.lock_contention.load(Ordering::Relaxed)
    }

    pub fn record_motion_timeout(&self) {
        self.motion_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn motion_timeouts(&self) -> u32 {
        self.motion_timeouts.load(Ordering::Relaxed)
    }

    pub fn record_sensor_error(&self) {
        self.sensor_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sensor_errors(&self) -> u32 {
        self.sensor_errors.load(Ordering::Relaxed)
    }

    pub fn record_jam_recovery(&self) {
        self.jam_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn jam_recoveries(&self) -> u32 {
        self.jam_recoveries.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Message types for inter-context diagnostics.
pub mod messages {
    /// Diagnostic events emitted by the colour-sort monitor.
    #[derive(Debug, Clone, PartialEq)]
    pub enum SortEvent {
        /// An impostor ring was detected and the eject sequence began
        EjectStarted { hue: f32 },
        /// The eject sequence ran to completion and the intake resumed
        EjectCompleted,
        /// The operator flipped the colour-sort toggle
        Toggled { enabled: bool },
        /// A hue sample could not be read
        SensorError,
        /// A stalled intake was detected and reverse recovery began
        JamDetected,
        /// Jam recovery finished and the intake resumed
        JamCleared,
    }
}

/// Sending half of the monitor's diagnostic event stream.
pub type SortEventSender = crossbeam_channel::Sender<messages::SortEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips() {
        let shared = SharedState::new(true);
        assert!(shared.colour_sort_enabled());
        assert!(!shared.toggle_colour_sort());
        assert!(!shared.colour_sort_enabled());
        assert!(shared.toggle_colour_sort());
        assert!(shared.colour_sort_enabled());
    }

    #[test]
    fn test_routine_name_roundtrip() {
        let shared = SharedState::default();
        assert_eq!(shared.routine_name(), None);
        shared.set_routine_name("WP Rush");
        assert_eq!(shared.routine_name().as_deref(), Some("WP Rush"));
    }
}

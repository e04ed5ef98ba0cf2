//! Colour-sort monitor: hue-sensor-driven intake override.
//!
//! A background task samples the optical sensor every cycle and, when a
//! ring of the opposing alliance's colour is seen, claims the intake and
//! runs a timed eject sequence: brake while the ring settles, hold the
//! brake, then resume full forward to throw the ring clear. The state
//! machine itself is the re-entrancy guard: a new detection cannot start
//! while an eject is in flight, so the operator toggle is never written
//! by the eject path and only gates new detections.
//!
//! The monitor is tick-driven: [`ColourSortMonitor::tick`] performs one
//! cycle against a caller-supplied clock, which is what the worker loop
//! calls at the configured period and what tests drive directly.

use crate::config::{Config, SortConfig};
use crate::core::HueWindow;
use crate::hardware::{HueSensor, OperatorInput};
use crate::intake::{IntakeArbiter, IntakeHold};
use crate::shared::messages::SortEvent;
use crate::shared::{SharedState, SortEventSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Monitor state. Eject and jam states carry the intake hold, so the
/// lock is released exactly when the state machine returns to idle (or
/// the state is dropped during shutdown).
enum SortState {
    /// Watching for impostor rings
    Idle,
    /// Brake commanded, waiting for the ring to settle against the hood
    EjectBrake { hold: IntakeHold, until: Instant },
    /// Brake held a little longer before resuming
    EjectDrive { hold: IntakeHold, until: Instant },
    /// Reversing to clear a jammed ring
    JamReverse { hold: IntakeHold, until: Instant },
}

impl SortState {
    /// State name for logging.
    fn name(&self) -> &'static str {
        match self {
            SortState::Idle => "Idle",
            SortState::EjectBrake { .. } => "EjectBrake",
            SortState::EjectDrive { .. } => "EjectDrive",
            SortState::JamReverse { .. } => "JamReverse",
        }
    }
}

/// The colour-sort monitor task.
pub struct ColourSortMonitor {
    cfg: SortConfig,
    /// Hue window that marks a ring as an impostor for our alliance
    window: HueWindow,
    arbiter: Arc<IntakeArbiter>,
    sensor: Arc<dyn HueSensor>,
    operator: Arc<dyn OperatorInput>,
    shared: Arc<SharedState>,
    events: SortEventSender,
    state: SortState,
    /// Intake velocity from the previous cycle, for stall detection
    prev_velocity: Option<f32>,
}

impl ColourSortMonitor {
    pub fn new(
        config: &Config,
        arbiter: Arc<IntakeArbiter>,
        sensor: Arc<dyn HueSensor>,
        operator: Arc<dyn OperatorInput>,
        shared: Arc<SharedState>,
        events: SortEventSender,
    ) -> Self {
        let window = config.sort.impostor_window(config.alliance);
        log::info!(
            "colour sort: alliance {}, impostor hue {:.0}-{:.0}",
            config.alliance.as_str(),
            window.min_deg,
            window.max_deg
        );
        Self {
            cfg: config.sort.clone(),
            window,
            arbiter,
            sensor,
            operator,
            shared,
            events,
            state: SortState::Idle,
            prev_velocity: None,
        }
    }

    /// Current state name, for diagnostics.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// One monitor cycle at `now`.
    ///
    /// Samples the hue sensor and the operator toggle exactly once per
    /// call, then advances the state machine. The toggle is checked every
    /// cycle regardless of state; flipping it mid-eject does not abort
    /// the in-flight eject, it only gates the next detection.
    pub fn tick(&mut self, now: Instant) {
        if self.operator.sort_toggle_pressed() {
            let enabled = self.shared.toggle_colour_sort();
            log::info!(
                "colour sort {}",
                if enabled { "enabled" } else { "disabled" }
            );
            let _ = self.events.send(SortEvent::Toggled { enabled });
        }

        // One hue sample per cycle. A failed read is counted and treated
        // as "nothing seen" for gating, never conflated with a hue.
        let hue = match self.sensor.hue() {
            Ok(h) => Some(h),
            Err(e) => {
                self.shared.record_sensor_error();
                let _ = self.events.send(SortEvent::SensorError);
                log::debug!("hue read failed: {}", e);
                None
            }
        };

        self.state = match std::mem::replace(&mut self.state, SortState::Idle) {
            SortState::Idle => self.tick_idle(now, hue),
            SortState::EjectBrake { hold, until } => {
                if now >= until {
                    SortState::EjectDrive {
                        hold,
                        until: now + Duration::from_millis(self.cfg.brake_hold_ms),
                    }
                } else {
                    SortState::EjectBrake { hold, until }
                }
            }
            SortState::EjectDrive { hold, until } => {
                if now >= until {
                    if let Err(e) = hold.set_millivolts(self.cfg.eject_voltage_mv) {
                        log::warn!("intake resume after eject failed: {}", e);
                    }
                    drop(hold);
                    self.shared.record_eject();
                    let _ = self.events.send(SortEvent::EjectCompleted);
                    log::debug!("eject complete, intake resumed");
                    SortState::Idle
                } else {
                    SortState::EjectDrive { hold, until }
                }
            }
            SortState::JamReverse { hold, until } => {
                if now >= until {
                    if let Err(e) = hold.set_millivolts(self.cfg.eject_voltage_mv) {
                        log::warn!("intake resume after jam failed: {}", e);
                    }
                    drop(hold);
                    self.shared.record_jam_recovery();
                    let _ = self.events.send(SortEvent::JamCleared);
                    SortState::Idle
                } else {
                    SortState::JamReverse { hold, until }
                }
            }
        };
    }

    fn tick_idle(&mut self, now: Instant, hue: Option<f32>) -> SortState {
        if let Some(hue) = hue {
            if self.shared.colour_sort_enabled() && self.window.contains(hue) {
                match IntakeHold::acquire(&self.arbiter) {
                    Some(hold) => {
                        log::info!("eject impostor (hue {:.0})", hue);
                        let _ = self.events.send(SortEvent::EjectStarted { hue });
                        if let Err(e) = hold.brake() {
                            log::warn!("intake brake failed: {}", e);
                        }
                        return SortState::EjectBrake {
                            hold,
                            until: now + Duration::from_millis(self.cfg.brake_settle_ms),
                        };
                    }
                    None => {
                        // lock contention already counted; retry next cycle
                    }
                }
            }
        }

        if self.cfg.anti_jam {
            if let Some(next) = self.check_jam(now) {
                return next;
            }
        }

        SortState::Idle
    }

    /// Stall detection: a sharp velocity drop while the intake is being
    /// driven hard means a ring is wedged.
    fn check_jam(&mut self, now: Instant) -> Option<SortState> {
        let velocity = match self.arbiter.velocity() {
            Ok(v) => v,
            Err(e) => {
                self.shared.record_sensor_error();
                log::debug!("intake velocity read failed: {}", e);
                return None;
            }
        };
        let prev = self.prev_velocity.replace(velocity)?;

        let commanded = self.arbiter.commanded_millivolts().unwrap_or(0);
        if prev - velocity > self.cfg.stall_delta && commanded > self.cfg.stall_min_voltage_mv {
            let hold = IntakeHold::acquire(&self.arbiter)?;
            log::info!("anti-jam triggered (velocity {:.0} -> {:.0})", prev, velocity);
            let _ = self.events.send(SortEvent::JamDetected);
            if let Err(e) = hold.set_millivolts(self.cfg.jam_reverse_mv) {
                log::warn!("intake reverse failed: {}", e);
            }
            self.prev_velocity = None;
            return Some(SortState::JamReverse {
                hold,
                until: now + Duration::from_millis(self.cfg.jam_reverse_ms),
            });
        }
        None
    }

    /// Run the monitor loop until shutdown is signaled.
    pub fn run(&mut self) {
        log::info!("colour sort monitor started");
        let interval = Duration::from_millis(self.cfg.sample_interval_ms);
        while !self.shared.should_shutdown() {
            self.tick(Instant::now());
            thread::sleep(interval);
        }
        log::info!("colour sort monitor stopped");
    }
}

/// Spawn the monitor on a named worker thread.
pub fn spawn(mut monitor: ColourSortMonitor) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("colour-sort".to_string())
        .spawn(move || monitor.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hardware::mock::{IntakeCall, MockIntakeMotor, ScriptedHueSensor, ScriptedInput};
    use crate::shared::messages::SortEvent;
    use crossbeam_channel::Receiver;

    struct Fixture {
        monitor: ColourSortMonitor,
        motor: Arc<MockIntakeMotor>,
        sensor: Arc<ScriptedHueSensor>,
        input: Arc<ScriptedInput>,
        shared: Arc<SharedState>,
        arbiter: Arc<IntakeArbiter>,
        events: Receiver<SortEvent>,
    }

    fn fixture(config: Config) -> Fixture {
        let motor = Arc::new(MockIntakeMotor::new());
        let sensor = Arc::new(ScriptedHueSensor::new());
        let input = Arc::new(ScriptedInput::new());
        let shared = Arc::new(SharedState::new(config.sort.enabled));
        let arbiter = Arc::new(IntakeArbiter::new(
            Arc::clone(&motor) as Arc<dyn crate::hardware::IntakeMotor>,
            Arc::clone(&shared),
        ));
        let (tx, rx) = crossbeam_channel::unbounded();
        let monitor = ColourSortMonitor::new(
            &config,
            Arc::clone(&arbiter),
            Arc::clone(&sensor) as Arc<dyn HueSensor>,
            Arc::clone(&input) as Arc<dyn OperatorInput>,
            Arc::clone(&shared),
            tx,
        );
        Fixture {
            monitor,
            motor,
            sensor,
            input,
            shared,
            arbiter,
            events: rx,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_eject_sequence_brake_then_drive() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        f.sensor.push_hue(210.0);
        f.monitor.tick(t0);
        assert_eq!(f.monitor.state_name(), "EjectBrake");
        assert!(f.motor.is_braked());
        assert!(f.arbiter.is_locked());

        // still settling
        f.monitor.tick(t0 + ms(100));
        assert_eq!(f.monitor.state_name(), "EjectBrake");

        // settle elapsed, brake held a further brake_hold_ms
        f.monitor.tick(t0 + ms(230));
        assert_eq!(f.monitor.state_name(), "EjectDrive");
        assert!(f.motor.is_braked());

        // hold elapsed: resume full forward, release the lock
        f.monitor.tick(t0 + ms(460));
        assert_eq!(f.monitor.state_name(), "Idle");
        assert_eq!(f.motor.commanded_millivolts(), 12_000);
        assert!(!f.arbiter.is_locked());
        assert_eq!(f.shared.ejects(), 1);

        let events: Vec<_> = f.events.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SortEvent::EjectStarted { hue: 210.0 },
                SortEvent::EjectCompleted
            ]
        );
    }

    #[test]
    fn test_no_retrigger_while_ejecting() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        f.sensor.push_hues([210.0, 210.0, 210.0]);
        f.monitor.tick(t0);
        f.monitor.tick(t0 + ms(10));
        f.monitor.tick(t0 + ms(20));

        let starts = f
            .events
            .try_iter()
            .filter(|e| matches!(e, SortEvent::EjectStarted { .. }))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(f.motor.calls(), vec![IntakeCall::Brake]);
    }

    #[test]
    fn test_disabled_toggle_suppresses_ejects() {
        let mut config = Config::default();
        config.sort.enabled = false;
        let mut f = fixture(config);
        let t0 = Instant::now();

        f.sensor.push_hues([210.0, 210.0]);
        f.monitor.tick(t0);
        f.monitor.tick(t0 + ms(10));

        assert_eq!(f.monitor.state_name(), "Idle");
        assert!(f.motor.calls().is_empty());
        assert_eq!(f.shared.ejects(), 0);
    }

    #[test]
    fn test_operator_toggle_parity() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        // odd number of presses flips the toggle
        f.input.press_sort_toggle();
        f.monitor.tick(t0);
        assert!(!f.shared.colour_sort_enabled());

        // two more presses restore it (one consumed per cycle)
        f.input.press_sort_toggle();
        f.input.press_sort_toggle();
        f.monitor.tick(t0 + ms(10));
        f.monitor.tick(t0 + ms(20));
        assert!(f.shared.colour_sort_enabled());
    }

    #[test]
    fn test_toggle_mid_eject_does_not_abort() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        f.sensor.push_hue(210.0);
        f.monitor.tick(t0);
        assert_eq!(f.monitor.state_name(), "EjectBrake");

        // disable mid-eject: the eject keeps going
        f.input.press_sort_toggle();
        f.monitor.tick(t0 + ms(230));
        assert_eq!(f.monitor.state_name(), "EjectDrive");
        assert!(!f.shared.colour_sort_enabled());

        f.monitor.tick(t0 + ms(460));
        assert_eq!(f.shared.ejects(), 1);

        // but the next impostor is ignored while disabled
        f.sensor.push_hue(210.0);
        f.monitor.tick(t0 + ms(470));
        assert_eq!(f.monitor.state_name(), "Idle");
        assert_eq!(f.shared.ejects(), 1);
    }

    #[test]
    fn test_sensor_error_is_counted_not_conflated() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        f.sensor.push_error();
        f.monitor.tick(t0);

        assert_eq!(f.monitor.state_name(), "Idle");
        assert_eq!(f.shared.sensor_errors(), 1);
        assert_eq!(f.shared.ejects(), 0);
        assert!(f
            .events
            .try_iter()
            .any(|e| matches!(e, SortEvent::SensorError)));
    }

    #[test]
    fn test_blue_alliance_ejects_red_rings() {
        let mut config = Config::default();
        config.alliance = crate::core::Alliance::Blue;
        let mut f = fixture(config);
        let t0 = Instant::now();

        // a blue ring is no impostor for the blue alliance
        f.sensor.push_hue(210.0);
        f.monitor.tick(t0);
        assert_eq!(f.monitor.state_name(), "Idle");

        f.sensor.push_hue(12.0);
        f.monitor.tick(t0 + ms(10));
        assert_eq!(f.monitor.state_name(), "EjectBrake");
    }

    #[test]
    fn test_detection_skipped_while_lock_contended() {
        let mut f = fixture(Config::default());
        let t0 = Instant::now();

        let hold = IntakeHold::acquire(&f.arbiter).unwrap();
        f.sensor.push_hue(210.0);
        f.monitor.tick(t0);
        assert_eq!(f.monitor.state_name(), "Idle");
        assert!(f.shared.lock_contention() > 0);

        // once the lock frees, the next in-range sample triggers
        drop(hold);
        f.sensor.push_hue(210.0);
        f.monitor.tick(t0 + ms(10));
        assert_eq!(f.monitor.state_name(), "EjectBrake");
    }

    #[test]
    fn test_anti_jam_reverses_then_resumes() {
        let mut config = Config::default();
        config.sort.anti_jam = true;
        let mut f = fixture(config);
        let t0 = Instant::now();

        // intake running hard at full speed
        f.arbiter.set_millivolts(12_000).unwrap();
        f.motor.set_reported_velocity(180.0);
        f.monitor.tick(t0);
        assert_eq!(f.monitor.state_name(), "Idle");

        // velocity collapses: jam
        f.motor.set_reported_velocity(20.0);
        f.monitor.tick(t0 + ms(10));
        assert_eq!(f.monitor.state_name(), "JamReverse");
        assert_eq!(f.motor.commanded_millivolts(), -10_000);

        f.monitor.tick(t0 + ms(280));
        assert_eq!(f.monitor.state_name(), "Idle");
        assert_eq!(f.motor.commanded_millivolts(), 12_000);
        assert_eq!(f.shared.jam_recoveries(), 1);
    }
}

//! Skills supervisor scenarios: operator abort and natural completion.

use spardha_ctl::auton::{Routine, Step, StepExecutor};
use spardha_ctl::config::SkillsConfig;
use spardha_ctl::hardware::mock::{MockChassis, MockIntakeMotor, MockPiston, ScriptedInput};
use spardha_ctl::hardware::{Chassis, IntakeMotor, OperatorInput, Piston};
use spardha_ctl::intake::IntakeArbiter;
use spardha_ctl::shared::SharedState;
use spardha_ctl::skills::{SkillsOutcome, SkillsSupervisor};
use std::sync::Arc;
use std::time::Duration;

fn supervisor_rig(
    latency: Duration,
) -> (
    SkillsSupervisor,
    Arc<StepExecutor>,
    Arc<MockChassis>,
    Arc<ScriptedInput>,
) {
    let chassis = Arc::new(MockChassis::with_latency(latency));
    let motor = Arc::new(MockIntakeMotor::new());
    let clamp = Arc::new(MockPiston::new());
    let input = Arc::new(ScriptedInput::new());
    let shared = Arc::new(SharedState::default());
    let arbiter = Arc::new(IntakeArbiter::new(
        Arc::clone(&motor) as Arc<dyn IntakeMotor>,
        Arc::clone(&shared),
    ));
    let executor = Arc::new(StepExecutor::new(
        Arc::clone(&chassis) as Arc<dyn Chassis>,
        arbiter,
        Arc::clone(&clamp) as Arc<dyn Piston>,
        shared,
    ));
    let config = SkillsConfig {
        supervised: true,
        poll_interval_ms: 1,
    };
    let supervisor = SkillsSupervisor::new(
        Arc::clone(&chassis) as Arc<dyn Chassis>,
        Arc::clone(&input) as Arc<dyn OperatorInput>,
        &config,
    );
    (supervisor, executor, chassis, input)
}

#[test]
fn abort_halts_motion_once_and_stops_the_routine() {
    let (supervisor, executor, chassis, input) = supervisor_rig(Duration::from_millis(200));
    let routine = Routine::new(
        "long script",
        vec![
            Step::move_to_point(10.0, 0.0, 5000),
            Step::move_to_point(20.0, 0.0, 5000),
            Step::move_to_point(30.0, 0.0, 5000),
        ],
    );

    // abort lands while the first motion is blocking
    input.press_abort();
    let outcome = supervisor.run(executor, routine).unwrap();
    assert_eq!(outcome, SkillsOutcome::Aborted);

    // cancel-all was issued exactly once
    assert_eq!(chassis.cancel_count(), 1);

    // no further steps ran, then or later
    let motions = chassis.calls().len() - chassis.cancel_count();
    assert!(motions <= 1, "routine kept driving after abort");
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(chassis.calls().len() - chassis.cancel_count(), motions);
}

#[test]
fn natural_completion_ends_the_watch() {
    let (supervisor, executor, chassis, _input) = supervisor_rig(Duration::ZERO);
    let routine = Routine::new(
        "short script",
        vec![Step::delay(20), Step::move_to_point(5.0, 5.0, 1000)],
    );

    // no abort: the supervisor must notice completion and return
    let outcome = supervisor.run(executor, routine).unwrap();
    assert_eq!(outcome, SkillsOutcome::Completed);
    assert_eq!(chassis.cancel_count(), 0);
    assert_eq!(chassis.calls().len(), 1);
    assert_eq!(chassis.pose().x, 5.0);
}

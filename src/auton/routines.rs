//! Built-in autonomous routine library.
//!
//! Each routine is a plain data value, so the same script can be run on
//! the robot, replayed against the mock chassis in tests, or serialized
//! for inspection. Coordinates are field units, headings degrees.

use super::step::{Routine, Step};
use crate::core::DriveParams;

/// Display name of the skills routine, used for supervisor dispatch.
pub const SKILLS_NAME: &str = "Skills";

/// Rush the center rings from the positive corner, scoring the preload
/// on the first goal.
pub fn wp_rush() -> Routine {
    Routine::new(
        "WP Rush",
        vec![
            Step::set_pose(0.0, 0.0, 290.0),
            Step::move_to_pose_with(
                60.0,
                -20.5,
                290.0,
                2000,
                DriveParams {
                    forwards: false,
                    min_speed: 50.0,
                    horizontal_drift: 4.0,
                    lead: 0.2,
                    ..DriveParams::default()
                },
            ),
            Step::clamp(true),
            Step::intake(12_000),
            Step::move_to_point(34.0, -25.0, 2000),
            Step::move_to_point(-8.0, -44.0, 2000),
        ],
    )
}

/// Grab the near goal and score the preload plus one ring, right side.
pub fn scrim_right() -> Routine {
    Routine::new(
        "Scrim Right (2)",
        vec![
            Step::clamp(false),
            Step::move_to_point_with(
                0.0,
                -28.0,
                1000,
                DriveParams {
                    forwards: false,
                    max_speed: 70.0,
                    ..DriveParams::default()
                },
            ),
            Step::delay(1500),
            Step::clamp(true),
            Step::intake(12_000),
            Step::delay(2000),
            Step::move_to_point(-20.0, -32.0, 1000),
            Step::delay(3000),
            Step::move_to_point_with(
                -44.0,
                9.0,
                4000,
                DriveParams {
                    min_speed: 127.0,
                    ..DriveParams::default()
                },
            ),
            Step::delay(3000),
        ],
    )
}

/// Mirror of the right-side scrim routine. Works for either alliance.
pub fn scrim_left() -> Routine {
    Routine::new(
        "Scrim Left",
        vec![
            Step::clamp(false),
            Step::move_to_point_with(
                0.0,
                -28.0,
                1000,
                DriveParams {
                    forwards: false,
                    max_speed: 70.0,
                    ..DriveParams::default()
                },
            ),
            Step::delay(1500),
            Step::clamp(true),
            Step::intake(12_000),
            Step::delay(2000),
            Step::move_to_point(20.0, -32.0, 1000),
            Step::delay(3000),
            Step::move_to_point_with(
                50.0,
                -32.0,
                4000,
                DriveParams {
                    min_speed: 127.0,
                    ..DriveParams::default()
                },
            ),
            Step::delay(3000),
            Step::clamp(false),
        ],
    )
}

/// The one-minute skills script: two mirrored goal-and-ring circuits.
pub fn skills() -> Routine {
    let backwards = DriveParams {
        forwards: false,
        ..DriveParams::default()
    };
    let mut steps = vec![
        Step::move_to_point(0.0, 0.0, 500),
        Step::intake(12_000),
        Step::delay(1000), // intake the preload
        Step::move_to_point(0.199, 15.955, 700),
        Step::turn_to(270.0, 400),
    ];
    // identical circuit on each half of the field
    for mirror in [1.0_f32, -1.0] {
        steps.extend([
            Step::move_to_point_with(mirror * 22.145, 13.959, 800, backwards),
            Step::delay(750),
            Step::clamp(true),
            Step::move_to_point(mirror * 24.527, 28.685, 1200),
            Step::delay(1000),
            Step::move_to_point(mirror * 47.0, 27.0, 1300),
            Step::delay(1000),
            Step::move_to_point(mirror * 52.248, 81.531, 1500),
            Step::delay(1000),
            Step::move_to_point(mirror * 46.251, 1.392, 1000),
            Step::delay(1000),
            Step::move_to_point(mirror * 45.552, -7.88, 1000),
            Step::delay(1000),
            Step::move_to_point(mirror * 50.412, 4.48, 1300),
            Step::delay(1000),
            Step::move_to_point_with(mirror * 58.389, -9.185, 1200, backwards),
            Step::delay(1250),
            Step::clamp(false),
        ]);
    }
    Routine::new(SKILLS_NAME, steps)
}

/// Minimal turn for verifying the chassis tuning.
pub fn pid_test() -> Routine {
    Routine::new(
        "PID test",
        vec![Step::set_pose(0.0, 0.0, 0.0), Step::turn_to(90.0, 1000)],
    )
}

/// Solo-win-point experiment: two goals across the field.
pub fn sawp_test() -> Routine {
    let backwards = DriveParams {
        forwards: false,
        ..DriveParams::default()
    };
    Routine::new(
        "SAWP test",
        vec![
            Step::move_to_point_with(0.0, 0.0, 5000, backwards),
            Step::turn_to(180.0, 1000),
            Step::intake(12_000),
            Step::delay(750),
            Step::clamp(true),
            Step::move_to_point_with(0.145, 34.432, 5000, backwards),
            Step::move_to_point(-19.787, 29.801, 5000),
            Step::move_to_point(-24.956, 48.255, 5000),
            Step::clamp(false),
            Step::move_to_point(-20.406, 29.022, 5000),
            Step::move_to_point(-32.174, 46.362, 5000),
            Step::move_to_point(-13.784, 16.4, 5000),
            Step::move_to_point(-19.303, -14.401, 5000),
            Step::delay(500),
            Step::intake(0),
            Step::move_to_point_with(14.265, 19.416, 5000, backwards),
            Step::move_to_point_with(38.386, 9.799, 5000, backwards),
            Step::delay(2000),
            Step::intake(12_000),
            Step::move_to_point(28.345, 50.282, 5000),
        ],
    )
}

/// Boomerang-motion experiment.
pub fn bm_test() -> Routine {
    Routine::new(
        "BM test",
        vec![
            Step::set_pose(0.0, 0.0, 0.0),
            Step::move_to_pose_with(
                52.0,
                6.0,
                320.0,
                1000,
                DriveParams {
                    forwards: false,
                    ..DriveParams::default()
                },
            ),
        ],
    )
}

/// Register the match selection set, in selector order.
pub fn register_all(registry: &mut super::RoutineRegistry) {
    for routine in [
        wp_rush(),
        scrim_right(),
        skills(),
        pid_test(),
        sawp_test(),
        bm_test(),
    ] {
        registry.register(routine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_halves_mirror_x() {
        let routine = skills();
        let xs: Vec<f32> = routine
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::MoveToPoint { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        // prologue drives plus two mirrored eight-point circuits
        assert_eq!(xs.len(), 2 + 8 * 2);
        let first = &xs[2..10];
        let second = &xs[10..18];
        for (a, b) in first.iter().zip(second) {
            assert_eq!(*a, -*b);
        }
    }

    #[test]
    fn test_selector_order() {
        let shared = std::sync::Arc::new(crate::shared::SharedState::default());
        let mut registry = crate::auton::RoutineRegistry::new(shared);
        register_all(&mut registry);
        assert_eq!(
            registry.names(),
            vec![
                "WP Rush",
                "Scrim Right (2)",
                "Skills",
                "PID test",
                "SAWP test",
                "BM test"
            ]
        );
    }
}

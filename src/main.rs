//! spardha-ctl - match-control binary
//!
//! Wires the control layer to a device rig and runs one match: spawns
//! the colour-sort monitor, then executes the configured routine (under
//! the cancellation supervisor for skills). With the default mock rig
//! this is a hardware-free dry run of the match scripts.

use spardha_ctl::auton::{routines, CancelToken, RoutineRegistry, RunOutcome, StepExecutor};
use spardha_ctl::config::Config;
use spardha_ctl::error::Result;
use spardha_ctl::hardware::build_rig;
use spardha_ctl::intake::IntakeArbiter;
use spardha_ctl::shared::SharedState;
use spardha_ctl::skills::{SkillsOutcome, SkillsSupervisor};
use spardha_ctl::sort::{self, ColourSortMonitor};
use std::env;
use std::path::Path;
use std::sync::Arc;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `spardha-ctl <path>` (positional)
/// - `spardha-ctl --config <path>` (flag-based)
/// - `spardha-ctl -c <path>` (short flag)
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("spardha-ctl v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match parse_config_path() {
        Some(path) => {
            log::info!("Using config: {}", path);
            Config::load(&path)?
        }
        None if Path::new("spardha.toml").exists() => {
            log::info!("Using config: spardha.toml");
            Config::load("spardha.toml")?
        }
        None => {
            log::info!("Using default configuration");
            Config::default()
        }
    };

    log::info!(
        "Alliance: {} | routine: {}",
        config.alliance.as_str(),
        config.routine
    );

    let shared = Arc::new(SharedState::new(config.sort.enabled));
    let rig = build_rig(&config)?;
    let arbiter = Arc::new(IntakeArbiter::new(
        Arc::clone(&rig.intake),
        Arc::clone(&shared),
    ));

    // Colour-sort monitor runs for the whole match, whoever is driving
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let monitor = ColourSortMonitor::new(
        &config,
        Arc::clone(&arbiter),
        Arc::clone(&rig.hue_sensor),
        Arc::clone(&rig.operator),
        Arc::clone(&shared),
        event_tx,
    );
    let monitor_handle = sort::spawn(monitor)?;

    let executor = Arc::new(StepExecutor::new(
        Arc::clone(&rig.chassis),
        Arc::clone(&arbiter),
        Arc::clone(&rig.clamp),
        Arc::clone(&shared),
    ));

    let mut registry = RoutineRegistry::new(Arc::clone(&shared));
    routines::register_all(&mut registry);
    log::info!("Routines: {}", registry.names().join(", "));

    // Ctrl-C cancels the running routine and stops the monitor
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        let chassis = Arc::clone(&rig.chassis);
        let shared = Arc::clone(&shared);
        ctrlc::set_handler(move || {
            log::info!("Received shutdown signal");
            cancel.cancel();
            chassis.cancel_all_motions();
            shared.signal_shutdown();
        })
        .map_err(|e| {
            spardha_ctl::Error::Other(format!("Error setting Ctrl-C handler: {}", e))
        })?;
    }

    let outcome = if config.skills.supervised && config.routine == routines::SKILLS_NAME {
        let routine = registry
            .get(routines::SKILLS_NAME)
            .cloned()
            .ok_or_else(|| spardha_ctl::Error::UnknownRoutine(routines::SKILLS_NAME.into()))?;
        shared.set_routine_name(&routine.name);
        let supervisor = SkillsSupervisor::new(
            Arc::clone(&rig.chassis),
            Arc::clone(&rig.operator),
            &config.skills,
        );
        match supervisor.run(Arc::clone(&executor), routine)? {
            SkillsOutcome::Completed => RunOutcome::Completed,
            SkillsOutcome::Aborted => RunOutcome::Cancelled,
        }
    } else {
        registry.select_and_run(&config.routine, &executor, &cancel)?
    };

    let pose = rig.chassis.pose();
    log::info!(
        "Routine {} at pose ({:.1}, {:.1}, {:.0}°)",
        match outcome {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
        },
        pose.x,
        pose.y,
        pose.heading
    );

    // Shutdown
    shared.signal_shutdown();
    if monitor_handle.join().is_err() {
        log::error!("colour sort monitor panicked");
    }

    for event in event_rx.try_iter() {
        log::debug!("sort event: {:?}", event);
    }
    log::info!(
        "ejects: {} | lock contention: {} | motion timeouts: {} | sensor errors: {}",
        shared.ejects(),
        shared.lock_contention(),
        shared.motion_timeouts(),
        shared.sensor_errors()
    );

    log::info!("spardha-ctl stopped");
    Ok(())
}

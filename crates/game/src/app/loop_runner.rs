use std::process::ExitCode;

use engine::{run_headless, StopReason};
use tracing::info;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scene,
        mut input,
    } = app;
    let report = run_headless(config, scene, &mut input);

    let quit_by = match report.stop_reason {
        StopReason::SceneQuit => "scene",
        StopReason::InputQuit => "input",
        StopReason::TickLimit => "tick_limit",
    };
    info!(
        ticks = report.ticks,
        paused_ticks = report.paused_ticks,
        collision_events = report.collision_events,
        quit_by,
        "run_finished"
    );
    ExitCode::SUCCESS
}

use std::env;
use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::metrics::MetricsAccumulator;
use super::{InputAction, InputSnapshot, MetricsHandle, Scene, SceneCommand, SceneWorld};

pub const SLOW_TICK_ENV_VAR: &str = "PLATFORMER_SLOW_TICK_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Stop after this many ticks. `None` runs until the scene or input quits.
    pub max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of running back-to-back.
    pub realtime: bool,
    pub simulated_slow_tick_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_ticks: None,
            realtime: false,
            simulated_slow_tick_ms: 0,
        }
    }
}

pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}

impl<F> InputSource for F
where
    F: FnMut(u64) -> InputSnapshot,
{
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        self(tick)
    }
}

/// Input replayed from a fixed script: actions held over tick ranges and
/// single-tick presses.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    held: Vec<(Range<u64>, InputAction)>,
    presses: Vec<(u64, InputAction)>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, action: InputAction, ticks: Range<u64>) -> Self {
        self.held.push((ticks, action));
        self
    }

    pub fn press(mut self, action: InputAction, tick: u64) -> Self {
        self.presses.push((tick, action));
        self
    }

    pub fn quit_at(self, tick: u64) -> Self {
        self.press(InputAction::Quit, tick)
    }
}

impl InputSource for ScriptedInput {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        let mut snapshot = InputSnapshot::empty();
        for (range, action) in &self.held {
            if range.contains(&tick) {
                snapshot = snapshot.with_action_down(*action, true);
            }
        }
        for (press_tick, action) in &self.presses {
            if *press_tick == tick {
                snapshot = snapshot.with_action_pressed(*action, true);
            }
        }
        snapshot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SceneQuit,
    InputQuit,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u64,
    pub paused_ticks: u64,
    pub collision_events: u64,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub command: SceneCommand,
    pub collision_events: usize,
    pub paused: bool,
}

/// A scene together with the world it owns, stepped one fixed tick at a time.
pub struct Simulation<S: Scene> {
    scene: S,
    world: SceneWorld,
    tick: u64,
    is_loaded: bool,
}

impl<S: Scene> Simulation<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            tick: 0,
            is_loaded: false,
        }
    }

    pub fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
        info!(entity_count = self.world.entity_count(), "scene_loaded");
    }

    /// Runs one tick: scene update, physics scaled by the world time scale,
    /// then collision dispatch back into the scene.
    pub fn step(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> TickOutcome {
        self.load();
        let command = self
            .scene
            .update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();

        let paused = self.world.is_time_frozen();
        let events = self.world.step_physics(fixed_dt_seconds);
        for event in &events {
            self.scene.handle_collision(event, &mut self.world);
        }
        self.world.apply_pending();
        self.tick = self.tick.saturating_add(1);

        TickOutcome {
            command,
            collision_events: events.len(),
            paused,
        }
    }

    pub fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    /// Scene and world borrowed together, for driving scene operations
    /// outside the tick.
    pub fn parts_mut(&mut self) -> (&mut S, &mut SceneWorld) {
        (&mut self.scene, &mut self.world)
    }

    pub fn debug_status(&self) -> Option<String> {
        self.scene.debug_status(&self.world)
    }
}

pub fn run_headless<S: Scene>(
    config: LoopConfig,
    scene: S,
    input: &mut dyn InputSource,
) -> RunReport {
    run_headless_with_metrics(config, scene, input, MetricsHandle::default())
}

pub fn run_headless_with_metrics<S: Scene>(
    config: LoopConfig,
    scene: S,
    input: &mut dyn InputSource,
    metrics_handle: MetricsHandle,
) -> RunReport {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let slow_tick_delay = resolve_slow_tick_delay(config.simulated_slow_tick_ms);

    let mut simulation = Simulation::new(scene);
    simulation.load();

    info!(
        target_tps,
        realtime = config.realtime,
        max_ticks = ?config.max_ticks,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_tick_delay_ms = slow_tick_delay.as_millis() as u64,
        "loop_config"
    );

    let mut driver = TickDriver {
        simulation: &mut simulation,
        input,
        fixed_dt_seconds: fixed_dt.as_secs_f32(),
        max_ticks: config.max_ticks,
        slow_tick_delay,
        metrics: MetricsAccumulator::new(metrics_log_interval),
        metrics_handle,
        ticks: 0,
        paused_ticks: 0,
        collision_events: 0,
    };

    let stop_reason = if config.realtime {
        driver.run_realtime(fixed_dt, max_frame_delta, max_ticks_per_frame)
    } else {
        driver.run_unpaced()
    };

    let report = RunReport {
        ticks: driver.ticks,
        paused_ticks: driver.paused_ticks,
        collision_events: driver.collision_events,
        stop_reason,
    };
    info!(
        ticks = report.ticks,
        paused_ticks = report.paused_ticks,
        collision_events = report.collision_events,
        stop_reason = ?report.stop_reason,
        status = %simulation.debug_status().unwrap_or_default(),
        "shutdown"
    );
    simulation.shutdown();
    report
}

struct TickDriver<'a, S: Scene> {
    simulation: &'a mut Simulation<S>,
    input: &'a mut dyn InputSource,
    fixed_dt_seconds: f32,
    max_ticks: Option<u64>,
    slow_tick_delay: Duration,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
    ticks: u64,
    paused_ticks: u64,
    collision_events: u64,
}

impl<S: Scene> TickDriver<'_, S> {
    fn run_unpaced(&mut self) -> StopReason {
        loop {
            if let Some(reason) = self.run_tick() {
                return reason;
            }
            self.maybe_publish_metrics(Instant::now());
        }
    }

    fn run_realtime(
        &mut self,
        fixed_dt: Duration,
        max_frame_delta: Duration,
        max_ticks_per_frame: u32,
    ) -> StopReason {
        let mut accumulator = Duration::ZERO;
        let mut last_frame_instant = Instant::now();
        loop {
            let now = Instant::now();
            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            for _ in 0..step_plan.ticks_to_run {
                if let Some(reason) = self.run_tick() {
                    return reason;
                }
            }
            accumulator = step_plan.remaining_accumulator;

            if step_plan.dropped_backlog > Duration::ZERO {
                warn!(
                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "sim_clamp_triggered"
                );
            }

            self.maybe_publish_metrics(Instant::now());
            let until_next_tick = fixed_dt.saturating_sub(accumulator);
            if until_next_tick > Duration::ZERO {
                thread::sleep(until_next_tick);
            }
        }
    }

    fn run_tick(&mut self) -> Option<StopReason> {
        if self.max_ticks.is_some_and(|max_ticks| self.ticks >= max_ticks) {
            return Some(StopReason::TickLimit);
        }

        let input_snapshot = self.input.snapshot_for_tick(self.simulation.tick());
        if input_snapshot.quit_requested() {
            info!(reason = "input_quit", "shutdown_requested");
            return Some(StopReason::InputQuit);
        }

        if self.slow_tick_delay > Duration::ZERO {
            // Explicit debug perturbation only.
            thread::sleep(self.slow_tick_delay);
        }

        let started = Instant::now();
        let outcome = self
            .simulation
            .step(self.fixed_dt_seconds, &input_snapshot);
        let tick_time = started.elapsed();

        self.ticks = self.ticks.saturating_add(1);
        if outcome.paused {
            self.paused_ticks = self.paused_ticks.saturating_add(1);
        }
        self.collision_events = self
            .collision_events
            .saturating_add(outcome.collision_events as u64);
        self.metrics.record_tick(
            tick_time,
            outcome.paused,
            outcome.collision_events.min(u32::MAX as usize) as u32,
        );

        match outcome.command {
            SceneCommand::Quit => {
                info!(reason = "scene_quit", "shutdown_requested");
                Some(StopReason::SceneQuit)
            }
            SceneCommand::None => None,
        }
    }

    fn maybe_publish_metrics(&mut self, now: Instant) {
        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            self.metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                paused_ratio = snapshot.paused_ratio,
                collision_events = snapshot.collision_events,
                entity_count = self.simulation.world().entity_count(),
                status = %self.simulation.debug_status().unwrap_or_default(),
                "loop_metrics"
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_tick_delay(config_slow_tick_ms: u64) -> Duration {
    match env::var(SLOW_TICK_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_TICK_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-tick env var value; falling back to config"
                );
                Duration::from_millis(config_slow_tick_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_tick_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_TICK_ENV_VAR,
                error = %err,
                "unable to read slow-tick env var; falling back to config"
            );
            Duration::from_millis(config_slow_tick_ms)
        }
    }
}

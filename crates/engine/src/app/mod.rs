mod input;
mod loop_runner;
mod metrics;
mod physics;
mod scene;

pub use input::InputAction;
pub use loop_runner::{
    run_headless, run_headless_with_metrics, InputSource, LoopConfig, RunReport, ScriptedInput,
    Simulation, StopReason, TickOutcome, SLOW_TICK_ENV_VAR,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use physics::{CollisionEvent, CollisionKind};
pub use scene::{
    Body, BodyKind, Collider, ColliderShape, Entity, EntityId, EntityRole, EntitySpec,
    InputSnapshot, Scene, SceneCommand, SceneWorld, Transform, Vec2,
};

use std::collections::HashMap;

use engine::{
    Body, Collider, CollisionEvent, Entity, EntityId, EntityRole, EntitySpec, InputAction,
    InputSnapshot, Scene, SceneCommand, SceneWorld, Transform, Vec2,
};
use tracing::{debug, info, warn};

use super::level::{
    LevelConfig, LevelEnemy, LevelHazard, LevelMovingPlatform, LevelPathMode, LevelPlayer,
    LevelRunTuning, LevelShooter,
};

const PATH_ARRIVAL_THRESHOLD: f32 = 0.02;
const FLIP_EPSILON: f32 = 0.0001;
const MIN_FIRE_RATE: f32 = 0.01;
const PROJECTILE_RADIUS: f32 = 0.1;
const TARGET_SPEED_EPSILON: f32 = 0.01;
const GROUND_ROLES: [EntityRole; 3] = [
    EntityRole::Ground,
    EntityRole::Platform,
    EntityRole::SpringPad,
];

include!("path_walker.rs");
include!("types.rs");
include!("run_state.rs");
include!("systems.rs");
include!("collisions.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_scene(level: LevelConfig) -> PlatformerScene {
    PlatformerScene::from_level(level)
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}

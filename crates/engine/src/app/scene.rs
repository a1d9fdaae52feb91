use std::collections::HashSet;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use super::input::{ActionStates, InputAction};
use super::physics::{self, CollisionEvent};

pub const DEFAULT_GRAVITY: Vec2 = Vec2 { x: 0.0, y: -9.81 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Per-tick view of the player's intent. `is_down` reports held actions,
/// `was_pressed` reports press edges that are only visible for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.held.is_down(InputAction::Quit) || self.pressed.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.pressed.set(action, pressed);
        self
    }

    pub fn horizontal_axis(&self) -> f32 {
        let mut axis = 0.0;
        if self.is_down(InputAction::MoveLeft) {
            axis -= 1.0;
        }
        if self.is_down(InputAction::MoveRight) {
            axis += 1.0;
        }
        axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Typed identity of an entity. Triggers and collision dispatch match on this
/// instead of comparing tag strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    Player,
    Enemy,
    Hazard,
    Projectile,
    Checkpoint,
    KillZone,
    SpringPad,
    Ground,
    Platform,
}

impl EntityRole {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Hazard => "hazard",
            Self::Projectile => "projectile",
            Self::Checkpoint => "checkpoint",
            Self::KillZone => "kill_zone",
            Self::SpringPad => "spring_pad",
            Self::Ground => "ground",
            Self::Platform => "platform",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized(self) -> Vec2 {
        let length = self.length();
        if length <= f32::EPSILON {
            return Vec2::ZERO;
        }
        self * length.recip()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation_radians: f32,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation_radians: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Kinematic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub mass: f32,
    pub freeze_rotation: bool,
    pub(crate) pending_force: Vec2,
}

impl Body {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: if kind == BodyKind::Dynamic { 1.0 } else { 0.0 },
            mass: 1.0,
            freeze_rotation: false,
            pending_force: Vec2::ZERO,
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    pub fn kinematic() -> Self {
        Self::new(BodyKind::Kinematic)
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_frozen_rotation(mut self) -> Self {
        self.freeze_rotation = true;
        self
    }

    /// Instant change in momentum. Only dynamic bodies respond.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.kind != BodyKind::Dynamic {
            return;
        }
        self.velocity += impulse * self.inverse_mass();
    }

    /// Continuous force, consumed by the next physics step.
    pub fn add_force(&mut self, force: Vec2) {
        if self.kind != BodyKind::Dynamic {
            return;
        }
        self.pending_force += force;
    }

    pub fn hard_set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn clear_motion(&mut self) {
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.pending_force = Vec2::ZERO;
    }

    pub(crate) fn inverse_mass(&self) -> f32 {
        if self.mass > f32::EPSILON {
            self.mass.recip()
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    pub is_trigger: bool,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Circle { radius },
            is_trigger: false,
        }
    }

    pub fn rect(half_extents: Vec2) -> Self {
        Self {
            shape: ColliderShape::Rect { half_extents },
            is_trigger: false,
        }
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub role: EntityRole,
    pub transform: Transform,
    pub body: Option<Body>,
    pub collider: Option<Collider>,
    pub active: bool,
    pub debug_name: &'static str,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn velocity(&self) -> Vec2 {
        self.body.map(|body| body.velocity).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub role: EntityRole,
    pub transform: Transform,
    pub body: Option<Body>,
    pub collider: Option<Collider>,
    pub active: bool,
    pub debug_name: &'static str,
}

impl EntitySpec {
    pub fn new(role: EntityRole, position: Vec2, debug_name: &'static str) -> Self {
        Self {
            role,
            transform: Transform::at(position),
            body: None,
            collider: None,
            active: true,
            debug_name,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    gravity: Vec2,
    time_scale: f32,
    contacts: HashSet<(EntityId, EntityId)>,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            next_applied_spawn_order: 0,
            gravity: DEFAULT_GRAVITY,
            time_scale: 1.0,
            contacts: HashSet::new(),
        }
    }
}

impl SceneWorld {
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            role: spec.role,
            transform: spec.transform,
            body: spec.body,
            collider: spec.collider,
            active: spec.active,
            debug_name: spec.debug_name,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.contacts.retain(|(a, b)| {
                pending.binary_search_by_key(&a.0, |id| id.0).is_err()
                    && pending.binary_search_by_key(&b.0, |id| id.0).is_err()
            });
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.contacts.clear();
        self.next_applied_spawn_order = 0;
        self.gravity = DEFAULT_GRAVITY;
        self.time_scale = 1.0;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Ids of every applied entity with `role`, in spawn order.
    pub fn entities_with_role(&self, role: EntityRole, include_inactive: bool) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|entity| entity.role == role && (include_inactive || entity.active))
            .map(|entity| entity.id)
            .collect()
    }

    pub fn count_with_role(&self, role: EntityRole) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.role == role)
            .count()
    }

    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        let Some(entity) = self.find_entity_mut(id) else {
            return false;
        };
        entity.active = active;
        true
    }

    /// Active entities whose collider overlaps the circle and pass `filter`.
    pub fn overlap_circle(
        &self,
        center: Vec2,
        radius: f32,
        filter: impl Fn(&Entity) -> bool,
    ) -> Vec<EntityId> {
        let probe = Collider::circle(radius.max(0.0));
        self.entities
            .iter()
            .filter(|entity| entity.active)
            .filter(|entity| {
                entity.collider.is_some_and(|collider| {
                    physics::shapes_overlap(
                        center,
                        probe.shape,
                        entity.transform.position,
                        collider.shape,
                        0.0,
                    )
                })
            })
            .filter(|entity| filter(entity))
            .map(|entity| entity.id)
            .collect()
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Global simulation time scale. Zero pauses physics stepping.
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = if time_scale.is_finite() {
            time_scale.max(0.0)
        } else {
            1.0
        };
    }

    pub fn is_time_frozen(&self) -> bool {
        self.time_scale <= 0.0
    }

    /// Advances bodies by `dt` scaled by the time scale and returns the
    /// overlap-enter events of this step.
    pub fn step_physics(&mut self, dt: f32) -> Vec<CollisionEvent> {
        let scaled_dt = dt * self.time_scale;
        if scaled_dt <= 0.0 || !scaled_dt.is_finite() {
            return Vec::new();
        }
        physics::step(&mut self.entities, &mut self.contacts, self.gravity, scaled_dt)
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn handle_collision(&mut self, _event: &CollisionEvent, _world: &mut SceneWorld) {}
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_status(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_applied(world: &mut SceneWorld, spec: EntitySpec) -> EntityId {
        let id = world.spawn(spec);
        world.apply_pending();
        id
    }

    #[test]
    fn spawn_is_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntitySpec::new(EntityRole::Enemy, Vec2::ZERO, "enemy"));

        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(id).is_some());
    }

    #[test]
    fn despawn_unknown_entity_returns_false() {
        let mut world = SceneWorld::default();
        assert!(!world.despawn(EntityId(42)));
    }

    #[test]
    fn despawn_of_pending_spawn_never_appears() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntitySpec::new(EntityRole::Projectile, Vec2::ZERO, "bullet"));
        assert!(world.despawn(id));

        world.apply_pending();
        assert!(world.find_entity(id).is_none());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = SceneWorld::default();
        let first = spawn_applied(
            &mut world,
            EntitySpec::new(EntityRole::Projectile, Vec2::ZERO, "a"),
        );
        world.despawn(first);
        world.apply_pending();
        let second = spawn_applied(
            &mut world,
            EntitySpec::new(EntityRole::Projectile, Vec2::ZERO, "b"),
        );

        assert_ne!(first, second);
    }

    #[test]
    fn role_query_can_include_inactive_entities() {
        let mut world = SceneWorld::default();
        let live = world.spawn(EntitySpec::new(EntityRole::Enemy, Vec2::ZERO, "live"));
        let dead = world.spawn(EntitySpec::new(EntityRole::Enemy, Vec2::ZERO, "dead").inactive());
        world.spawn(EntitySpec::new(EntityRole::Hazard, Vec2::ZERO, "spike"));
        world.apply_pending();

        assert_eq!(world.entities_with_role(EntityRole::Enemy, false), vec![live]);
        assert_eq!(
            world.entities_with_role(EntityRole::Enemy, true),
            vec![live, dead]
        );
    }

    #[test]
    fn overlap_circle_skips_inactive_and_filtered_entities() {
        let mut world = SceneWorld::default();
        let ground = world.spawn(
            EntitySpec::new(EntityRole::Ground, Vec2::new(0.0, -1.0), "ground")
                .with_collider(Collider::rect(Vec2::new(5.0, 0.5))),
        );
        world.spawn(
            EntitySpec::new(EntityRole::Ground, Vec2::new(0.0, -1.0), "hidden")
                .with_collider(Collider::rect(Vec2::new(5.0, 0.5)))
                .inactive(),
        );
        world.spawn(
            EntitySpec::new(EntityRole::Checkpoint, Vec2::new(0.0, -0.6), "cp")
                .with_collider(Collider::circle(0.5).trigger()),
        );
        world.apply_pending();

        let hits = world.overlap_circle(Vec2::new(0.0, -0.4), 0.2, |entity| {
            entity.role == EntityRole::Ground
        });
        assert_eq!(hits, vec![ground]);

        let misses = world.overlap_circle(Vec2::new(0.0, 3.0), 0.2, |_| true);
        assert!(misses.is_empty());
    }

    #[test]
    fn time_scale_rejects_negative_and_non_finite_values() {
        let mut world = SceneWorld::default();
        world.set_time_scale(-2.0);
        assert_eq!(world.time_scale(), 0.0);
        assert!(world.is_time_frozen());

        world.set_time_scale(f32::NAN);
        assert_eq!(world.time_scale(), 1.0);
    }

    #[test]
    fn frozen_time_does_not_move_bodies() {
        let mut world = SceneWorld::default();
        let id = spawn_applied(
            &mut world,
            EntitySpec::new(EntityRole::Projectile, Vec2::ZERO, "bullet")
                .with_body(Body::dynamic().with_velocity(Vec2::new(4.0, 0.0))),
        );
        world.set_time_scale(0.0);

        let events = world.step_physics(0.5);
        assert!(events.is_empty());
        assert_eq!(
            world.find_entity(id).expect("bullet").transform.position,
            Vec2::ZERO
        );
    }

    #[test]
    fn impulse_ignored_by_kinematic_bodies() {
        let mut body = Body::kinematic();
        body.apply_impulse(Vec2::new(0.0, 10.0));
        assert_eq!(body.velocity, Vec2::ZERO);

        let mut dynamic = Body::dynamic();
        dynamic.mass = 2.0;
        dynamic.apply_impulse(Vec2::new(0.0, 10.0));
        assert_eq!(dynamic.velocity, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn input_snapshot_horizontal_axis_cancels_opposites() {
        let both = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveRight, true);
        assert_eq!(both.horizontal_axis(), 0.0);

        let left = InputSnapshot::empty().with_action_down(InputAction::MoveLeft, true);
        assert_eq!(left.horizontal_axis(), -1.0);
    }
}

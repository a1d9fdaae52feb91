use std::collections::HashSet;

use super::scene::{BodyKind, ColliderShape, Entity, EntityId, EntityRole, Vec2};

/// Overlap tolerance used for enter detection so that a body resting on a
/// surface keeps its contact alive between push-outs.
const CONTACT_SKIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Trigger,
    Contact,
}

/// A pair of colliders that started overlapping this step. `a` always has the
/// lower id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    pub a: EntityId,
    pub a_role: EntityRole,
    pub b: EntityId,
    pub b_role: EntityRole,
}

impl CollisionEvent {
    pub fn involves(&self, role: EntityRole) -> bool {
        self.a_role == role || self.b_role == role
    }

    /// Returns `(self_id, other_id, other_role)` when one side has `role`.
    pub fn split(&self, role: EntityRole) -> Option<(EntityId, EntityId, EntityRole)> {
        if self.a_role == role {
            Some((self.a, self.b, self.b_role))
        } else if self.b_role == role {
            Some((self.b, self.a, self.a_role))
        } else {
            None
        }
    }
}

pub(crate) fn step(
    entities: &mut [Entity],
    contacts: &mut HashSet<(EntityId, EntityId)>,
    gravity: Vec2,
    dt: f32,
) -> Vec<CollisionEvent> {
    integrate(entities, gravity, dt);
    resolve_solids(entities);
    detect_enter_events(entities, contacts)
}

fn integrate(entities: &mut [Entity], gravity: Vec2, dt: f32) {
    for entity in entities.iter_mut().filter(|entity| entity.active) {
        let Some(body) = entity.body.as_mut() else {
            continue;
        };
        match body.kind {
            BodyKind::Static => continue,
            BodyKind::Dynamic => {
                let acceleration =
                    gravity * body.gravity_scale + body.pending_force * body.inverse_mass();
                body.velocity += acceleration * dt;
                body.pending_force = Vec2::ZERO;
            }
            BodyKind::Kinematic => {}
        }
        entity.transform.position += body.velocity * dt;
        if !body.freeze_rotation {
            entity.transform.rotation_radians += body.angular_velocity * dt;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SolidBounds {
    id: EntityId,
    center: Vec2,
    half_extents: Vec2,
}

fn is_solid_surface(entity: &Entity) -> bool {
    let solid_collider = entity
        .collider
        .is_some_and(|collider| !collider.is_trigger);
    let immovable = entity
        .body
        .map_or(true, |body| body.kind != BodyKind::Dynamic);
    entity.active && solid_collider && immovable
}

fn is_pushable(entity: &Entity) -> bool {
    let solid_collider = entity
        .collider
        .is_some_and(|collider| !collider.is_trigger);
    let dynamic = entity
        .body
        .is_some_and(|body| body.kind == BodyKind::Dynamic);
    entity.active && solid_collider && dynamic
}

fn resolve_solids(entities: &mut [Entity]) {
    let solids: Vec<SolidBounds> = entities
        .iter()
        .filter(|entity| is_solid_surface(entity))
        .filter_map(|entity| {
            entity.collider.map(|collider| SolidBounds {
                id: entity.id,
                center: entity.transform.position,
                half_extents: bounding_half_extents(collider.shape),
            })
        })
        .collect();
    if solids.is_empty() {
        return;
    }

    for entity in entities.iter_mut().filter(|entity| is_pushable(entity)) {
        let Some(collider) = entity.collider else {
            continue;
        };
        let half = bounding_half_extents(collider.shape);
        for solid in solids.iter().filter(|solid| solid.id != entity.id) {
            let delta = entity.transform.position - solid.center;
            let overlap_x = half.x + solid.half_extents.x - delta.x.abs();
            let overlap_y = half.y + solid.half_extents.y - delta.y.abs();
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }

            let Some(body) = entity.body.as_mut() else {
                continue;
            };
            if overlap_x < overlap_y {
                let push = if delta.x >= 0.0 { 1.0 } else { -1.0 };
                entity.transform.position.x += push * overlap_x;
                if body.velocity.x * push < 0.0 {
                    body.velocity.x = 0.0;
                }
            } else {
                let push = if delta.y >= 0.0 { 1.0 } else { -1.0 };
                entity.transform.position.y += push * overlap_y;
                if body.velocity.y * push < 0.0 {
                    body.velocity.y = 0.0;
                }
            }
        }
    }
}

fn detect_enter_events(
    entities: &[Entity],
    contacts: &mut HashSet<(EntityId, EntityId)>,
) -> Vec<CollisionEvent> {
    let candidates: Vec<&Entity> = entities
        .iter()
        .filter(|entity| entity.active && entity.collider.is_some())
        .collect();

    let mut current = HashSet::with_capacity(contacts.len());
    let mut events = Vec::new();
    for (index, first) in candidates.iter().enumerate() {
        for second in &candidates[index + 1..] {
            if !is_moving(first) && !is_moving(second) {
                continue;
            }
            let (Some(first_collider), Some(second_collider)) = (first.collider, second.collider)
            else {
                continue;
            };
            if !shapes_overlap(
                first.transform.position,
                first_collider.shape,
                second.transform.position,
                second_collider.shape,
                CONTACT_SKIN,
            ) {
                continue;
            }

            let (a, b) = if first.id <= second.id {
                (*first, *second)
            } else {
                (*second, *first)
            };
            let key = (a.id, b.id);
            current.insert(key);
            if contacts.contains(&key) {
                continue;
            }
            let kind = if first_collider.is_trigger || second_collider.is_trigger {
                CollisionKind::Trigger
            } else {
                CollisionKind::Contact
            };
            events.push(CollisionEvent {
                kind,
                a: a.id,
                a_role: a.role,
                b: b.id,
                b_role: b.role,
            });
        }
    }

    *contacts = current;
    events
}

fn is_moving(entity: &Entity) -> bool {
    entity
        .body
        .is_some_and(|body| body.kind != BodyKind::Static)
}

fn bounding_half_extents(shape: ColliderShape) -> Vec2 {
    match shape {
        ColliderShape::Circle { radius } => Vec2::new(radius, radius),
        ColliderShape::Rect { half_extents } => half_extents,
    }
}

pub(crate) fn shapes_overlap(
    a_center: Vec2,
    a_shape: ColliderShape,
    b_center: Vec2,
    b_shape: ColliderShape,
    skin: f32,
) -> bool {
    match (a_shape, b_shape) {
        (ColliderShape::Circle { radius: ra }, ColliderShape::Circle { radius: rb }) => {
            let reach = ra + rb + skin;
            (b_center - a_center).length_squared() <= reach * reach
        }
        (ColliderShape::Rect { half_extents: ha }, ColliderShape::Rect { half_extents: hb }) => {
            let delta = b_center - a_center;
            delta.x.abs() <= ha.x + hb.x + skin && delta.y.abs() <= ha.y + hb.y + skin
        }
        (ColliderShape::Circle { radius }, ColliderShape::Rect { half_extents }) => {
            circle_rect_overlap(a_center, radius, b_center, half_extents, skin)
        }
        (ColliderShape::Rect { half_extents }, ColliderShape::Circle { radius }) => {
            circle_rect_overlap(b_center, radius, a_center, half_extents, skin)
        }
    }
}

fn circle_rect_overlap(
    circle_center: Vec2,
    radius: f32,
    rect_center: Vec2,
    half_extents: Vec2,
    skin: f32,
) -> bool {
    let closest = Vec2::new(
        circle_center
            .x
            .clamp(rect_center.x - half_extents.x, rect_center.x + half_extents.x),
        circle_center
            .y
            .clamp(rect_center.y - half_extents.y, rect_center.y + half_extents.y),
    );
    let reach = radius + skin;
    (circle_center - closest).length_squared() <= reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scene::{Body, Collider, EntitySpec, SceneWorld};

    fn world_with_ground() -> SceneWorld {
        let mut world = SceneWorld::default();
        world.spawn(
            EntitySpec::new(EntityRole::Ground, Vec2::new(0.0, -0.5), "ground")
                .with_collider(Collider::rect(Vec2::new(10.0, 0.5))),
        );
        world
    }

    #[test]
    fn gravity_accelerates_dynamic_bodies() {
        let mut world = SceneWorld::default();
        world.set_gravity(Vec2::new(0.0, -10.0));
        let id = world.spawn(
            EntitySpec::new(EntityRole::Player, Vec2::new(0.0, 5.0), "player")
                .with_body(Body::dynamic()),
        );
        world.apply_pending();

        world.step_physics(0.1);
        let entity = world.find_entity(id).expect("player");
        assert!((entity.velocity().y + 1.0).abs() < 1e-5);
        assert!((entity.transform.position.y - 4.9).abs() < 1e-5);
    }

    #[test]
    fn dynamic_body_is_pushed_out_of_ground_and_stops_falling() {
        let mut world = world_with_ground();
        let id = world.spawn(
            EntitySpec::new(EntityRole::Player, Vec2::new(0.0, 0.4), "player")
                .with_body(Body::dynamic().with_velocity(Vec2::new(0.0, -3.0)))
                .with_collider(Collider::rect(Vec2::new(0.5, 0.5))),
        );
        world.apply_pending();

        world.step_physics(0.1);
        let entity = world.find_entity(id).expect("player");
        assert!((entity.transform.position.y - 0.5).abs() < 1e-4);
        assert_eq!(entity.velocity().y, 0.0);
    }

    #[test]
    fn enter_event_fires_once_while_overlap_persists() {
        let mut world = SceneWorld::default();
        world.set_gravity(Vec2::ZERO);
        let zone = world.spawn(
            EntitySpec::new(EntityRole::KillZone, Vec2::ZERO, "zone")
                .with_collider(Collider::rect(Vec2::new(1.0, 1.0)).trigger()),
        );
        let player = world.spawn(
            EntitySpec::new(EntityRole::Player, Vec2::new(0.5, 0.0), "player")
                .with_body(Body::dynamic())
                .with_collider(Collider::circle(0.25)),
        );
        world.apply_pending();

        let first = world.step_physics(0.016);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, CollisionKind::Trigger);
        assert_eq!(first[0].a, zone);
        assert_eq!(first[0].split(EntityRole::Player), Some((player, zone, EntityRole::KillZone)));

        let second = world.step_physics(0.016);
        assert!(second.is_empty());
    }

    #[test]
    fn reentering_after_separation_fires_again() {
        let mut world = SceneWorld::default();
        world.set_gravity(Vec2::ZERO);
        world.spawn(
            EntitySpec::new(EntityRole::Checkpoint, Vec2::ZERO, "checkpoint")
                .with_collider(Collider::circle(0.5).trigger()),
        );
        let player = world.spawn(
            EntitySpec::new(EntityRole::Player, Vec2::ZERO, "player")
                .with_body(Body::dynamic())
                .with_collider(Collider::circle(0.25)),
        );
        world.apply_pending();
        assert_eq!(world.step_physics(0.016).len(), 1);

        world.find_entity_mut(player).expect("player").transform.position = Vec2::new(5.0, 0.0);
        assert!(world.step_physics(0.016).is_empty());

        world.find_entity_mut(player).expect("player").transform.position = Vec2::ZERO;
        assert_eq!(world.step_physics(0.016).len(), 1);
    }

    #[test]
    fn static_pairs_and_inactive_entities_never_collide() {
        let mut world = world_with_ground();
        world.spawn(
            EntitySpec::new(EntityRole::KillZone, Vec2::new(0.0, -0.5), "zone")
                .with_collider(Collider::rect(Vec2::new(1.0, 1.0)).trigger()),
        );
        world.spawn(
            EntitySpec::new(EntityRole::Enemy, Vec2::new(0.0, -0.5), "dead_enemy")
                .with_body(Body::kinematic())
                .with_collider(Collider::rect(Vec2::new(0.5, 0.5)))
                .inactive(),
        );
        world.apply_pending();

        assert!(world.step_physics(0.016).is_empty());
    }

    #[test]
    fn circle_rect_overlap_uses_closest_point() {
        let rect = ColliderShape::Rect {
            half_extents: Vec2::new(1.0, 1.0),
        };
        let circle = ColliderShape::Circle { radius: 0.5 };

        assert!(shapes_overlap(Vec2::new(1.4, 0.0), circle, Vec2::ZERO, rect, 0.0));
        assert!(!shapes_overlap(Vec2::new(1.4, 1.4), circle, Vec2::ZERO, rect, 0.0));
        assert!(shapes_overlap(Vec2::ZERO, rect, Vec2::new(1.4, 0.0), circle, 0.0));
    }
}

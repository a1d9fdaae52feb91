/// Transform recorded when an entity is first registered. Restoring it also
/// reactivates the entity and clears any motion it carried.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResetPose {
    transform: Transform,
}

impl ResetPose {
    fn capture(entity: &Entity) -> Self {
        Self {
            transform: entity.transform,
        }
    }

    fn restore(&self, entity: &mut Entity) {
        entity.transform = self.transform;
        entity.active = true;
        if let Some(body) = entity.body.as_mut() {
            body.clear_motion();
        }
    }
}

trait Resettable {
    fn entity_id(&self) -> EntityId;
    fn reset_for_respawn(&mut self, world: &mut SceneWorld);
}

#[derive(Debug, Clone, PartialEq)]
struct HazardMover {
    entity_id: EntityId,
    pose: ResetPose,
    points: Vec<Vec2>,
    walker: PathWalker,
    speed: f32,
    wait_at_point: f32,
    wait_overrides: Vec<f32>,
    flip_x_on_move: bool,
    kill_on_touch: bool,
}

impl HazardMover {
    fn new(entity: &Entity, level: &LevelHazard) -> Self {
        let points: Vec<Vec2> = level.points.iter().map(|point| point.to_vec2()).collect();
        if !points.is_empty() && level.start_index >= points.len() {
            warn!(
                entity_id = entity.id.0,
                start_index = level.start_index,
                point_count = points.len(),
                "hazard_start_index_clamped"
            );
        }
        Self {
            entity_id: entity.id,
            pose: ResetPose::capture(entity),
            walker: PathWalker::new(
                points.len(),
                level.start_index,
                PathMode::from_level(level.mode),
            ),
            points,
            speed: level.speed,
            wait_at_point: level.wait_at_point,
            wait_overrides: level.wait_overrides.clone(),
            flip_x_on_move: level.flip_x_on_move,
            kill_on_touch: level.kill_on_touch,
        }
    }

    fn snap_to_current_point(&self, world: &mut SceneWorld) {
        let Some(point) = self.walker.current_point(&self.points) else {
            return;
        };
        if let Some(entity) = world.find_entity_mut(self.entity_id) {
            entity.transform.position = point;
        }
    }

    fn tick(&mut self, world: &mut SceneWorld, fixed_dt_seconds: f32) {
        let Some(entity) = world.find_entity_mut(self.entity_id) else {
            return;
        };
        if !entity.active {
            return;
        }

        let current = entity.transform.position;
        let wait_overrides = &self.wait_overrides;
        let default_wait = self.wait_at_point;
        let next = self.walker.tick(
            current,
            &self.points,
            self.speed,
            fixed_dt_seconds,
            |index| wait_for_point(wait_overrides, default_wait, index),
        );
        if self.flip_x_on_move {
            face_travel_direction(&mut entity.transform, next.x - current.x);
        }
        entity.transform.position = next;
    }
}

impl Resettable for HazardMover {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn reset_for_respawn(&mut self, world: &mut SceneWorld) {
        if let Some(entity) = world.find_entity_mut(self.entity_id) {
            self.pose.restore(entity);
        }
        self.walker.reset();
        self.snap_to_current_point(world);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ShooterConfig {
    shots_per_second: f32,
    detection_range: f32,
    fire_offset: Vec2,
    projectile: ProjectileTuning,
}

impl ShooterConfig {
    fn from_level(level: &LevelShooter) -> Self {
        Self {
            shots_per_second: level.shots_per_second,
            detection_range: level.detection_range,
            fire_offset: level.fire_offset.to_vec2(),
            projectile: ProjectileTuning {
                speed: level.bullet_speed,
                lifetime: level.projectile_lifetime,
                can_hit_ground: level.projectile_can_hit_ground,
            },
        }
    }

    fn cooldown_seconds(&self) -> f32 {
        1.0 / self.shots_per_second.max(MIN_FIRE_RATE)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PatrolEnemy {
    entity_id: EntityId,
    pose: ResetPose,
    patrol_points: Vec<Vec2>,
    walker: PathWalker,
    move_speed: f32,
    wait_at_ends: f32,
    drift_speed: f32,
    flip_x_on_move: bool,
    reflect_bullets: bool,
    max_hp: u32,
    hp: u32,
    shooter: Option<ShooterConfig>,
    fire_cooldown: f32,
}

impl PatrolEnemy {
    fn new(entity: &Entity, level: &LevelEnemy) -> Self {
        let (patrol_points, walker, move_speed, wait_at_ends) = match &level.patrol {
            Some(patrol) => {
                // Starting at A means the first leg heads to B.
                let start_index = if patrol.start_at_a { 1 } else { 0 };
                (
                    vec![patrol.point_a.to_vec2(), patrol.point_b.to_vec2()],
                    PathWalker::new(2, start_index, PathMode::PingPong),
                    patrol.move_speed,
                    patrol.wait_at_ends,
                )
            }
            None => (Vec::new(), PathWalker::new(0, 0, PathMode::PingPong), 0.0, 0.0),
        };
        Self {
            entity_id: entity.id,
            pose: ResetPose::capture(entity),
            patrol_points,
            walker,
            move_speed,
            wait_at_ends,
            drift_speed: level.drift_speed,
            flip_x_on_move: level.flip_x_on_move,
            reflect_bullets: level.reflect_bullets,
            max_hp: level.max_hp,
            hp: level.max_hp,
            shooter: level.shooter.as_ref().map(ShooterConfig::from_level),
            fire_cooldown: 0.0,
        }
    }

    fn is_alive(&self, world: &SceneWorld) -> bool {
        world
            .find_entity(self.entity_id)
            .is_some_and(|entity| entity.active)
    }

    fn tick(
        &mut self,
        world: &mut SceneWorld,
        fixed_dt_seconds: f32,
        player_position: Option<Vec2>,
        projectiles: &mut ProjectileRegistry,
    ) {
        let Some(entity) = world.find_entity_mut(self.entity_id) else {
            return;
        };
        if !entity.active {
            return;
        }

        let current = entity.transform.position;
        let next = if self.walker.has_points() {
            let wait_at_ends = self.wait_at_ends;
            self.walker.tick(
                current,
                &self.patrol_points,
                self.move_speed,
                fixed_dt_seconds,
                |_| wait_at_ends,
            )
        } else {
            current + Vec2::new(self.drift_speed * fixed_dt_seconds, 0.0)
        };
        if self.flip_x_on_move {
            face_travel_direction(&mut entity.transform, next.x - current.x);
        }
        entity.transform.position = next;

        let Some(shooter) = self.shooter else {
            return;
        };
        let Some(player_position) = player_position else {
            return;
        };
        self.fire_cooldown -= fixed_dt_seconds;
        if next.distance(player_position) > shooter.detection_range || self.fire_cooldown > 0.0 {
            return;
        }

        let origin = next + shooter.fire_offset;
        projectiles.spawn(
            world,
            origin,
            player_position - origin,
            ProjectileOwner::Enemy,
            shooter.projectile,
        );
        self.fire_cooldown = shooter.cooldown_seconds();
    }

    /// Applies one hit and returns whether the enemy died from it.
    fn take_hit(&mut self, world: &mut SceneWorld) -> bool {
        self.hp = self.hp.saturating_sub(1);
        if self.hp > 0 {
            return false;
        }
        world.set_active(self.entity_id, false);
        debug!(entity_id = self.entity_id.0, "enemy_died");
        true
    }
}

impl Resettable for PatrolEnemy {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn reset_for_respawn(&mut self, world: &mut SceneWorld) {
        if let Some(entity) = world.find_entity_mut(self.entity_id) {
            self.pose.restore(entity);
        }
        self.walker.reset();
        self.hp = self.max_hp;
        self.fire_cooldown = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TrackedEntity {
    Patrol(PatrolEnemy),
    Hazard(HazardMover),
}

impl TrackedEntity {
    #[cfg(test)]
    fn walker(&self) -> &PathWalker {
        match self {
            Self::Patrol(enemy) => &enemy.walker,
            Self::Hazard(hazard) => &hazard.walker,
        }
    }
}

impl Resettable for TrackedEntity {
    fn entity_id(&self) -> EntityId {
        match self {
            Self::Patrol(enemy) => enemy.entity_id(),
            Self::Hazard(hazard) => hazard.entity_id(),
        }
    }

    fn reset_for_respawn(&mut self, world: &mut SceneWorld) {
        match self {
            Self::Patrol(enemy) => enemy.reset_for_respawn(world),
            Self::Hazard(hazard) => hazard.reset_for_respawn(world),
        }
    }
}

/// Every resettable entity found in the level, including ones that start
/// inactive, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
struct TrackedEntities {
    entries: Vec<TrackedEntity>,
}

impl TrackedEntities {
    fn discover(world: &SceneWorld, mut candidates: HashMap<EntityId, TrackedEntity>) -> Self {
        let mut entries = Vec::with_capacity(candidates.len());
        for role in [EntityRole::Enemy, EntityRole::Hazard] {
            for id in world.entities_with_role(role, true) {
                if let Some(entry) = candidates.remove(&id) {
                    entries.push(entry);
                }
            }
        }
        if !candidates.is_empty() {
            warn!(
                unmatched = candidates.len(),
                "tracked_entities_missing_from_world"
            );
        }
        Self { entries }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entries.iter()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedEntity> {
        self.entries.iter_mut()
    }

    fn reset_all(&mut self, world: &mut SceneWorld) -> usize {
        for entry in &mut self.entries {
            entry.reset_for_respawn(world);
        }
        self.entries.len()
    }

    fn find(&self, id: EntityId) -> Option<&TrackedEntity> {
        self.entries.iter().find(|entry| entry.entity_id() == id)
    }

    fn patrol_mut(&mut self, id: EntityId) -> Option<&mut PatrolEnemy> {
        self.entries.iter_mut().find_map(|entry| match entry {
            TrackedEntity::Patrol(enemy) if enemy.entity_id == id => Some(enemy),
            _ => None,
        })
    }

    #[cfg(test)]
    fn hazard(&self, id: EntityId) -> Option<&HazardMover> {
        self.entries.iter().find_map(|entry| match entry {
            TrackedEntity::Hazard(hazard) if hazard.entity_id == id => Some(hazard),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MovingPlatform {
    entity_id: EntityId,
    points: [Vec2; 2],
    walker: PathWalker,
    speed: f32,
    wait_at_ends: f32,
}

impl MovingPlatform {
    fn new(entity_id: EntityId, level: &LevelMovingPlatform) -> Self {
        Self {
            entity_id,
            points: [level.point_a.to_vec2(), level.point_b.to_vec2()],
            walker: PathWalker::new(2, 1, PathMode::PingPong),
            speed: level.speed,
            wait_at_ends: level.wait_at_ends,
        }
    }

    fn tick(&mut self, world: &mut SceneWorld, fixed_dt_seconds: f32) {
        let Some(entity) = world.find_entity_mut(self.entity_id) else {
            return;
        };
        let wait_at_ends = self.wait_at_ends;
        entity.transform.position = self.walker.tick(
            entity.transform.position,
            &self.points,
            self.speed,
            fixed_dt_seconds,
            |_| wait_at_ends,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectileOwner {
    Player,
    Enemy,
}

/// Launch parameters shared by every projectile fired from one source.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProjectileTuning {
    speed: f32,
    lifetime: f32,
    can_hit_ground: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projectile {
    entity_id: EntityId,
    owner: ProjectileOwner,
    remaining_life: f32,
    can_hit_ground: bool,
}

/// Live projectiles. Entities are spawned and despawned through the world's
/// deferred queue, so a purged projectile stops colliding at the next
/// `apply_pending`.
#[derive(Debug, Clone, Default, PartialEq)]
struct ProjectileRegistry {
    live: Vec<Projectile>,
}

impl ProjectileRegistry {
    fn spawn(
        &mut self,
        world: &mut SceneWorld,
        origin: Vec2,
        direction: Vec2,
        owner: ProjectileOwner,
        tuning: ProjectileTuning,
    ) -> EntityId {
        let velocity = direction.normalized() * tuning.speed;
        let entity_id = world.spawn(
            EntitySpec::new(EntityRole::Projectile, origin, "projectile")
                .with_body(
                    Body::dynamic()
                        .with_gravity_scale(0.0)
                        .with_velocity(velocity)
                        .with_frozen_rotation(),
                )
                .with_collider(Collider::circle(PROJECTILE_RADIUS).trigger()),
        );
        self.live.push(Projectile {
            entity_id,
            owner,
            remaining_life: tuning.lifetime,
            can_hit_ground: tuning.can_hit_ground,
        });
        entity_id
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn get(&self, id: EntityId) -> Option<Projectile> {
        self.live.iter().find(|projectile| projectile.entity_id == id).copied()
    }

    #[cfg(test)]
    fn count_owned_by(&self, owner: ProjectileOwner) -> usize {
        self.live
            .iter()
            .filter(|projectile| projectile.owner == owner)
            .count()
    }

    /// Turns a player shot around so it now belongs to the enemy side.
    fn reflect(&mut self, world: &mut SceneWorld, id: EntityId) -> bool {
        let Some(projectile) = self.live.iter_mut().find(|projectile| projectile.entity_id == id)
        else {
            return false;
        };
        projectile.owner = ProjectileOwner::Enemy;
        if let Some(body) = world
            .find_entity_mut(id)
            .and_then(|entity| entity.body.as_mut())
        {
            body.velocity = -body.velocity;
        }
        true
    }

    fn destroy(&mut self, world: &mut SceneWorld, id: EntityId) -> bool {
        let Some(index) = self.live.iter().position(|projectile| projectile.entity_id == id) else {
            return false;
        };
        self.live.swap_remove(index);
        world.despawn(id);
        true
    }

    fn purge_all(&mut self, world: &mut SceneWorld) -> usize {
        let purged = self.live.len();
        for projectile in self.live.drain(..) {
            world.despawn(projectile.entity_id);
        }
        purged
    }

    fn tick_lifetimes(&mut self, world: &mut SceneWorld, fixed_dt_seconds: f32) -> usize {
        let before = self.live.len();
        self.live.retain_mut(|projectile| {
            projectile.remaining_life -= fixed_dt_seconds;
            if projectile.remaining_life > 0.0 {
                return true;
            }
            world.despawn(projectile.entity_id);
            false
        });
        before - self.live.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CheckpointTrigger {
    entity_id: EntityId,
    position: Vec2,
    activated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpringPad {
    bounce_impulse: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlayerTuning {
    acceleration: f32,
    deceleration: f32,
    vel_power: f32,
    jump_impulse: f32,
    coyote_time: f32,
    jump_buffer: f32,
    fall_multiplier: f32,
    low_jump_multiplier: f32,
    ground_check_offset: Vec2,
    ground_check_radius: f32,
    shots_per_second: f32,
    fire_offset: Vec2,
    projectile: ProjectileTuning,
}

impl PlayerTuning {
    fn from_level(level: &LevelPlayer) -> Self {
        Self {
            acceleration: level.acceleration,
            deceleration: level.deceleration,
            vel_power: level.vel_power,
            jump_impulse: level.jump_impulse,
            coyote_time: level.coyote_time,
            jump_buffer: level.jump_buffer,
            fall_multiplier: level.fall_multiplier,
            low_jump_multiplier: level.low_jump_multiplier,
            ground_check_offset: level.ground_check_offset.to_vec2(),
            ground_check_radius: level.ground_check_radius,
            shots_per_second: level.shots_per_second,
            fire_offset: level.fire_offset.to_vec2(),
            projectile: ProjectileTuning {
                speed: level.bullet_speed,
                lifetime: level.projectile_lifetime,
                can_hit_ground: level.projectile_can_hit_ground,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PlayerController {
    entity_id: EntityId,
    move_speed: f32,
    tuning: PlayerTuning,
    coyote_timer: f32,
    jump_buffer_timer: f32,
    facing: f32,
    fire_cooldown: f32,
}

impl PlayerController {
    fn new(entity_id: EntityId, level: &LevelPlayer) -> Self {
        Self {
            entity_id,
            move_speed: level.move_speed,
            tuning: PlayerTuning::from_level(level),
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            facing: 1.0,
            fire_cooldown: 0.0,
        }
    }

    fn clear_transient_state(&mut self) {
        self.coyote_timer = 0.0;
        self.jump_buffer_timer = 0.0;
        self.fire_cooldown = 0.0;
    }
}

/// The operations the run coordinator needs from the player. The
/// coordinator never reaches into the controller or the entity directly.
trait PlayerProxy {
    fn set_position(&mut self, position: Vec2);
    fn set_velocity(&mut self, velocity: Vec2);
    fn move_speed(&self) -> f32;
    fn set_move_speed(&mut self, move_speed: f32);
}

struct PlayerHandle<'a> {
    entity: &'a mut Entity,
    controller: &'a mut PlayerController,
}

impl PlayerProxy for PlayerHandle<'_> {
    fn set_position(&mut self, position: Vec2) {
        self.entity.transform.position = position;
        self.entity.active = true;
        self.controller.clear_transient_state();
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        if let Some(body) = self.entity.body.as_mut() {
            body.hard_set_velocity(velocity);
            body.angular_velocity = 0.0;
        }
    }

    fn move_speed(&self) -> f32 {
        self.controller.move_speed
    }

    fn set_move_speed(&mut self, move_speed: f32) {
        self.controller.move_speed = move_speed;
    }
}

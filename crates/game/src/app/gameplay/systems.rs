#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    PlayerControl,
    Movers,
    Enemies,
    Platforms,
    ProjectileLifetimes,
}

impl GameplaySystemId {
    #[cfg(test)]
    fn name(self) -> &'static str {
        match self {
            Self::PlayerControl => "PlayerControl",
            Self::Movers => "Movers",
            Self::Enemies => "Enemies",
            Self::Platforms => "Platforms",
            Self::ProjectileLifetimes => "ProjectileLifetimes",
        }
    }
}

const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 5] = [
    GameplaySystemId::PlayerControl,
    GameplaySystemId::Movers,
    GameplaySystemId::Enemies,
    GameplaySystemId::Platforms,
    GameplaySystemId::ProjectileLifetimes,
];

struct GameplaySystemContext<'a> {
    fixed_dt_seconds: f32,
    input: &'a InputSnapshot,
    world: &'a mut SceneWorld,
    player: Option<&'a mut PlayerController>,
    tracked: &'a mut TrackedEntities,
    platforms: &'a mut [MovingPlatform],
    projectiles: &'a mut ProjectileRegistry,
}

impl GameplaySystemContext<'_> {
    fn player_position(&self) -> Option<Vec2> {
        let controller = self.player.as_deref()?;
        self.world
            .find_entity(controller.entity_id)
            .filter(|entity| entity.active)
            .map(|entity| entity.transform.position)
    }
}

#[derive(Default)]
struct GameplaySystemsHost {
    last_tick_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    fn run_once_per_tick(&mut self, context: &mut GameplaySystemContext<'_>) {
        self.last_tick_order.clear();
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.run_system(system_id, context);
            self.last_tick_order.push(system_id);
        }
    }

    fn run_system(&self, system_id: GameplaySystemId, context: &mut GameplaySystemContext<'_>) {
        match system_id {
            GameplaySystemId::PlayerControl => Self::run_player_control_system(context),
            GameplaySystemId::Movers => Self::run_mover_system(context),
            GameplaySystemId::Enemies => Self::run_enemy_system(context),
            GameplaySystemId::Platforms => Self::run_platform_system(context),
            GameplaySystemId::ProjectileLifetimes => {
                let expired = context
                    .projectiles
                    .tick_lifetimes(context.world, context.fixed_dt_seconds);
                if expired > 0 {
                    debug!(expired, "projectiles_expired");
                }
            }
        }
    }

    fn run_player_control_system(context: &mut GameplaySystemContext<'_>) {
        let Some(controller) = context.player.as_deref_mut() else {
            return;
        };
        let input = context.input;
        let dt = context.fixed_dt_seconds;
        let tuning = controller.tuning;

        let Some(entity) = context.world.find_entity(controller.entity_id) else {
            return;
        };
        if !entity.active {
            return;
        }
        let position = entity.transform.position;

        let axis = input.horizontal_axis();
        if axis != 0.0 {
            controller.facing = axis.signum();
        }
        if input.was_pressed(InputAction::Jump) {
            controller.jump_buffer_timer = tuning.jump_buffer;
        }

        let player_id = controller.entity_id;
        let grounded = !context
            .world
            .overlap_circle(
                position + tuning.ground_check_offset,
                tuning.ground_check_radius,
                |other| other.id != player_id && is_ground(other),
            )
            .is_empty();
        if grounded {
            controller.coyote_timer = tuning.coyote_time;
        }

        let gravity_y = context.world.gravity().y;
        let Some(body) = context
            .world
            .find_entity_mut(player_id)
            .and_then(|entity| entity.body.as_mut())
        else {
            return;
        };

        if controller.coyote_timer > 0.0 && controller.jump_buffer_timer > 0.0 {
            controller.coyote_timer = 0.0;
            controller.jump_buffer_timer = 0.0;
            body.velocity.y = 0.0;
            body.apply_impulse(Vec2::UP * tuning.jump_impulse);
        }

        let target_speed = axis * controller.move_speed;
        let speed_dif = target_speed - body.velocity.x;
        let accel_rate = if target_speed.abs() > TARGET_SPEED_EPSILON {
            tuning.acceleration
        } else {
            tuning.deceleration
        };
        let movement =
            (speed_dif.abs() * accel_rate).powf(tuning.vel_power) * speed_dif.signum();
        // Never overshoot the target speed within one step.
        let max_force = speed_dif.abs() * body.mass / dt.max(f32::EPSILON);
        body.add_force(Vec2::RIGHT * movement.clamp(-max_force, max_force));

        let gravity_step = gravity_y * body.gravity_scale * dt;
        if body.velocity.y < 0.0 {
            body.velocity.y += gravity_step * (tuning.fall_multiplier - 1.0);
        } else if body.velocity.y > 0.0 && !input.is_down(InputAction::Jump) {
            body.velocity.y += gravity_step * (tuning.low_jump_multiplier - 1.0);
        }

        controller.coyote_timer = (controller.coyote_timer - dt).max(0.0);
        controller.jump_buffer_timer = (controller.jump_buffer_timer - dt).max(0.0);
        controller.fire_cooldown -= dt;

        if input.is_down(InputAction::Fire) && controller.fire_cooldown <= 0.0 {
            let origin = position
                + Vec2::new(tuning.fire_offset.x * controller.facing, tuning.fire_offset.y);
            context.projectiles.spawn(
                context.world,
                origin,
                Vec2::new(controller.facing, 0.0),
                ProjectileOwner::Player,
                tuning.projectile,
            );
            controller.fire_cooldown = 1.0 / tuning.shots_per_second.max(MIN_FIRE_RATE);
        }
    }

    fn run_mover_system(context: &mut GameplaySystemContext<'_>) {
        for entry in context.tracked.iter_mut() {
            if let TrackedEntity::Hazard(hazard) = entry {
                hazard.tick(context.world, context.fixed_dt_seconds);
            }
        }
    }

    fn run_enemy_system(context: &mut GameplaySystemContext<'_>) {
        let player_position = context.player_position();
        for entry in context.tracked.iter_mut() {
            if let TrackedEntity::Patrol(enemy) = entry {
                enemy.tick(
                    context.world,
                    context.fixed_dt_seconds,
                    player_position,
                    context.projectiles,
                );
            }
        }
    }

    fn run_platform_system(context: &mut GameplaySystemContext<'_>) {
        for platform in context.platforms.iter_mut() {
            platform.tick(context.world, context.fixed_dt_seconds);
        }
    }
}

fn is_ground(entity: &Entity) -> bool {
    GROUND_ROLES.contains(&entity.role)
        && entity.collider.is_some_and(|collider| !collider.is_trigger)
}

pub(crate) struct PlatformerScene {
    level: LevelConfig,
    run_state: RunStateCoordinator,
    systems_host: GameplaySystemsHost,
    player: Option<PlayerController>,
    tracked: TrackedEntities,
    platforms: Vec<MovingPlatform>,
    checkpoints: Vec<CheckpointTrigger>,
    spring_pads: HashMap<EntityId, SpringPad>,
    projectiles: ProjectileRegistry,
    reset_this_tick: bool,
}

impl PlatformerScene {
    fn new(level: LevelConfig, death_prompt: Option<Box<dyn DeathPrompt>>) -> Self {
        let player_level = level.player.unwrap_or_default();
        let run_state = RunStateCoordinator::new(
            player_level.spawn.to_vec2(),
            player_level.move_speed,
            RunTuning::from_level(&level.run),
            death_prompt,
        );
        Self {
            level,
            run_state,
            systems_host: GameplaySystemsHost::default(),
            player: None,
            tracked: TrackedEntities::default(),
            platforms: Vec::new(),
            checkpoints: Vec::new(),
            spring_pads: HashMap::new(),
            projectiles: ProjectileRegistry::default(),
            reset_this_tick: false,
        }
    }

    pub(crate) fn from_level(level: LevelConfig) -> Self {
        let death_prompt: Option<Box<dyn DeathPrompt>> = if level.run.death_prompt {
            Some(Box::new(HeadlessDeathPrompt::default()))
        } else {
            None
        };
        Self::new(level, death_prompt)
    }

    fn player_id(&self) -> Option<EntityId> {
        self.player.as_ref().map(|controller| controller.entity_id)
    }

    fn split_run<'a>(
        &'a mut self,
        world: &'a mut SceneWorld,
    ) -> (&'a mut RunStateCoordinator, RunTargets<'a>) {
        (
            &mut self.run_state,
            RunTargets {
                world,
                player: self.player.as_mut(),
                tracked: &mut self.tracked,
                projectiles: &mut self.projectiles,
                checkpoints: &mut self.checkpoints,
            },
        )
    }

    fn kill_player(&mut self, world: &mut SceneWorld) -> KillOutcome {
        let (run_state, mut targets) = self.split_run(world);
        run_state.kill_player(&mut targets)
    }

    fn respawn_at_checkpoint(&mut self, world: &mut SceneWorld) -> bool {
        let (run_state, mut targets) = self.split_run(world);
        run_state.respawn_at_checkpoint(&mut targets)
    }

    fn restart_run(&mut self, world: &mut SceneWorld) -> bool {
        let (run_state, mut targets) = self.split_run(world);
        run_state.restart_run(&mut targets)
    }

    fn spawn_level(&mut self, world: &mut SceneWorld) {
        let level = &self.level;
        world.set_gravity(level.gravity.to_vec2());

        for ground in &level.ground {
            world.spawn(
                EntitySpec::new(EntityRole::Ground, ground.center.to_vec2(), "ground")
                    .with_collider(Collider::rect(ground.half_extents.to_vec2())),
            );
        }
        for zone in &level.kill_zones {
            world.spawn(
                EntitySpec::new(EntityRole::KillZone, zone.center.to_vec2(), "kill_zone")
                    .with_collider(Collider::rect(zone.half_extents.to_vec2()).trigger()),
            );
        }
        for checkpoint in &level.checkpoints {
            let position = checkpoint.position.to_vec2();
            let entity_id = world.spawn(
                EntitySpec::new(EntityRole::Checkpoint, position, "checkpoint")
                    .with_collider(Collider::circle(checkpoint.radius).trigger()),
            );
            self.checkpoints.push(CheckpointTrigger {
                entity_id,
                position,
                activated: false,
            });
        }
        for pad in &level.spring_pads {
            let entity_id = world.spawn(
                EntitySpec::new(EntityRole::SpringPad, pad.center.to_vec2(), "spring_pad")
                    .with_collider(Collider::rect(pad.half_extents.to_vec2())),
            );
            self.spring_pads.insert(
                entity_id,
                SpringPad {
                    bounce_impulse: pad.bounce_impulse,
                },
            );
        }
        for platform in &level.platforms {
            let entity_id = world.spawn(
                EntitySpec::new(EntityRole::Platform, platform.point_a.to_vec2(), "platform")
                    .with_body(Body::kinematic())
                    .with_collider(Collider::rect(platform.half_extents.to_vec2())),
            );
            self.platforms.push(MovingPlatform::new(entity_id, platform));
        }

        let hazard_ids: Vec<EntityId> = level
            .hazards
            .iter()
            .map(|hazard| {
                let collider = Collider::circle(hazard.radius);
                let collider = if hazard.collider_is_trigger {
                    collider.trigger()
                } else {
                    collider
                };
                world.spawn(
                    EntitySpec::new(EntityRole::Hazard, hazard.position.to_vec2(), "hazard")
                        .with_body(Body::kinematic())
                        .with_collider(collider),
                )
            })
            .collect();
        let enemy_ids: Vec<EntityId> = level
            .enemies
            .iter()
            .map(|enemy| {
                let spec = EntitySpec::new(EntityRole::Enemy, enemy.position.to_vec2(), "enemy")
                    .with_body(Body::kinematic())
                    .with_collider(Collider::rect(enemy.half_extents.to_vec2()));
                world.spawn(if enemy.starts_inactive {
                    spec.inactive()
                } else {
                    spec
                })
            })
            .collect();

        let player_spawn = level.player.map(|player_level| {
            let entity_id = world.spawn(
                EntitySpec::new(EntityRole::Player, player_level.spawn.to_vec2(), "player")
                    .with_body(Body::dynamic().with_frozen_rotation())
                    .with_collider(Collider::rect(player_level.half_extents.to_vec2())),
            );
            PlayerController::new(entity_id, &player_level)
        });
        if player_spawn.is_none() {
            warn!(level = %level.name, "level_has_no_player");
        }
        world.apply_pending();

        let mut candidates = HashMap::with_capacity(hazard_ids.len() + enemy_ids.len());
        for (entity_id, hazard_level) in hazard_ids.iter().zip(&level.hazards) {
            let Some(entity) = world.find_entity(*entity_id) else {
                continue;
            };
            let hazard = HazardMover::new(entity, hazard_level);
            hazard.snap_to_current_point(world);
            candidates.insert(*entity_id, TrackedEntity::Hazard(hazard));
        }
        for (entity_id, enemy_level) in enemy_ids.iter().zip(&level.enemies) {
            let Some(entity) = world.find_entity(*entity_id) else {
                continue;
            };
            candidates.insert(
                *entity_id,
                TrackedEntity::Patrol(PatrolEnemy::new(entity, enemy_level)),
            );
        }

        self.tracked = TrackedEntities::discover(world, candidates);
        self.player = player_spawn;
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.spawn_level(world);
        info!(
            level = %self.level.name,
            entity_count = world.entity_count(),
            tracked = self.tracked.len(),
            checkpoints = self.checkpoints.len(),
            has_player = self.player.is_some(),
            "platformer_level_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        self.reset_this_tick = false;

        if self.run_state.is_paused() {
            if input.was_pressed(InputAction::ChooseRespawn) {
                self.respawn_at_checkpoint(world);
            } else if input.was_pressed(InputAction::ChooseRestart) {
                self.restart_run(world);
            }
            return SceneCommand::None;
        }

        let mut context = GameplaySystemContext {
            fixed_dt_seconds,
            input,
            world,
            player: self.player.as_mut(),
            tracked: &mut self.tracked,
            platforms: &mut self.platforms,
            projectiles: &mut self.projectiles,
        };
        self.systems_host.run_once_per_tick(&mut context);
        SceneCommand::None
    }

    fn handle_collision(&mut self, event: &CollisionEvent, world: &mut SceneWorld) {
        self.dispatch_collision(event, world);
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        self.run_state.forget_run(world);
        self.player = None;
        self.tracked = TrackedEntities::default();
        self.platforms.clear();
        self.checkpoints.clear();
        self.spring_pads.clear();
        self.projectiles = ProjectileRegistry::default();
        self.reset_this_tick = false;
        world.clear();
        info!(level = %self.level.name, "platformer_level_unloaded");
    }

    fn debug_status(&self, world: &SceneWorld) -> Option<String> {
        let run = self.run_state.state();
        let checkpoint = run
            .checkpoint
            .map(|point| format!("({:.1}, {:.1})", point.x, point.y))
            .unwrap_or_else(|| "none".to_string());
        let move_speed = self
            .player
            .as_ref()
            .map_or(self.run_state.baseline_move_speed(), |controller| {
                controller.move_speed
            });
        let enemies_alive = self
            .tracked
            .iter()
            .filter(|entry| match entry {
                TrackedEntity::Patrol(enemy) => enemy.is_alive(world),
                TrackedEntity::Hazard(_) => false,
            })
            .count();
        Some(format!(
            "paused={} checkpoint={} deaths={} respawns={} restarts={} move_speed={:.1} enemies_alive={} projectiles={}",
            run.is_paused,
            checkpoint,
            self.run_state.deaths,
            self.run_state.respawns,
            self.run_state.restarts,
            move_speed,
            enemies_alive,
            self.projectiles.len(),
        ))
    }
}

impl PlatformerScene {
    fn dispatch_collision(&mut self, event: &CollisionEvent, world: &mut SceneWorld) {
        // Events of this step were computed before the pause or reset and
        // refer to positions that no longer exist.
        if self.run_state.is_paused() || self.reset_this_tick {
            return;
        }

        if event.a_role == EntityRole::Projectile && event.b_role == EntityRole::Projectile {
            self.resolve_projectile_hit(event.a, event.b, event.b_role, world);
            self.resolve_projectile_hit(event.b, event.a, event.a_role, world);
            return;
        }
        if let Some((projectile_id, other_id, other_role)) = event.split(EntityRole::Projectile) {
            self.resolve_projectile_hit(projectile_id, other_id, other_role, world);
            return;
        }

        let Some((_, other_id, other_role)) = event.split(EntityRole::Player) else {
            return;
        };
        match other_role {
            EntityRole::KillZone => {
                self.kill_player_from_contact(world, "kill_zone");
            }
            EntityRole::Enemy => {
                self.kill_player_from_contact(world, "enemy");
            }
            EntityRole::Hazard => {
                let kills = match self.tracked.find(other_id) {
                    Some(TrackedEntity::Hazard(hazard)) => hazard.kill_on_touch,
                    _ => true,
                };
                if kills {
                    self.kill_player_from_contact(world, "hazard");
                }
            }
            EntityRole::Checkpoint => self.touch_checkpoint(other_id),
            EntityRole::SpringPad => self.bounce_player(other_id, world),
            EntityRole::Player
            | EntityRole::Projectile
            | EntityRole::Ground
            | EntityRole::Platform => {}
        }
    }

    fn resolve_projectile_hit(
        &mut self,
        projectile_id: EntityId,
        other_id: EntityId,
        other_role: EntityRole,
        world: &mut SceneWorld,
    ) {
        let Some(projectile) = self.projectiles.get(projectile_id) else {
            return;
        };

        match (projectile.owner, other_role) {
            (ProjectileOwner::Enemy, EntityRole::Player) => {
                self.projectiles.destroy(world, projectile_id);
                self.kill_player_from_contact(world, "enemy_projectile");
            }
            (ProjectileOwner::Player, EntityRole::Enemy) => {
                let Some(enemy) = self.tracked.patrol_mut(other_id) else {
                    self.projectiles.destroy(world, projectile_id);
                    return;
                };
                if enemy.reflect_bullets {
                    self.projectiles.reflect(world, projectile_id);
                    debug!(entity_id = other_id.0, "projectile_reflected");
                } else {
                    enemy.take_hit(world);
                    self.projectiles.destroy(world, projectile_id);
                }
            }
            (_, EntityRole::Player | EntityRole::Enemy) => {}
            _ => {
                if projectile.can_hit_ground {
                    self.projectiles.destroy(world, projectile_id);
                }
            }
        }
    }

    fn kill_player_from_contact(&mut self, world: &mut SceneWorld, cause: &'static str) {
        debug!(cause, "player_contact_lethal");
        if self.kill_player(world) == KillOutcome::Restarted {
            self.reset_this_tick = true;
        }
    }

    fn touch_checkpoint(&mut self, checkpoint_id: EntityId) {
        let Some(checkpoint) = self
            .checkpoints
            .iter_mut()
            .find(|checkpoint| checkpoint.entity_id == checkpoint_id)
        else {
            return;
        };
        if checkpoint.activated {
            return;
        }
        checkpoint.activated = true;
        self.run_state.set_checkpoint(checkpoint.position);
    }

    fn bounce_player(&mut self, pad_id: EntityId, world: &mut SceneWorld) {
        let Some(pad) = self.spring_pads.get(&pad_id).copied() else {
            return;
        };
        let Some(player_id) = self.player_id() else {
            return;
        };
        let Some(body) = world
            .find_entity_mut(player_id)
            .and_then(|entity| entity.body.as_mut())
        else {
            return;
        };
        body.hard_set_velocity(Vec2::new(body.velocity.x, 0.0));
        body.apply_impulse(Vec2::UP * pad.bounce_impulse);
    }
}

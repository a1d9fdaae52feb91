/// Modal shown after a death offering respawn or restart.
trait DeathPrompt {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
}

/// Prompt without a screen: it records visibility and leaves the choice to
/// the input stream.
#[derive(Debug, Default)]
struct HeadlessDeathPrompt {
    visible: bool,
    times_shown: u32,
}

impl DeathPrompt for HeadlessDeathPrompt {
    fn show(&mut self) {
        self.visible = true;
        self.times_shown = self.times_shown.saturating_add(1);
        info!(times_shown = self.times_shown, "death_prompt_shown");
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RunState {
    initial_spawn: Vec2,
    checkpoint: Option<Vec2>,
    is_paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RunTuning {
    checkpoint_speed_bonus: f32,
    max_move_speed: Option<f32>,
}

impl RunTuning {
    fn from_level(level: &LevelRunTuning) -> Self {
        Self {
            checkpoint_speed_bonus: level.checkpoint_speed_bonus,
            max_move_speed: level.max_move_speed,
        }
    }

    fn boosted_speed(&self, current: f32) -> f32 {
        let boosted = current + self.checkpoint_speed_bonus;
        match self.max_move_speed {
            Some(cap) => boosted.min(cap),
            None => boosted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KillOutcome {
    PromptShown,
    Restarted,
    AlreadyPaused,
    NoPlayer,
}

/// Everything a run transition touches, borrowed from the scene for the
/// duration of one call.
struct RunTargets<'a> {
    world: &'a mut SceneWorld,
    player: Option<&'a mut PlayerController>,
    tracked: &'a mut TrackedEntities,
    projectiles: &'a mut ProjectileRegistry,
    checkpoints: &'a mut [CheckpointTrigger],
}

impl RunTargets<'_> {
    fn player(&mut self) -> Option<PlayerHandle<'_>> {
        let controller = self.player.as_deref_mut()?;
        let entity = self.world.find_entity_mut(controller.entity_id)?;
        Some(PlayerHandle { entity, controller })
    }

    fn has_player(&self) -> bool {
        self.player
            .as_deref()
            .is_some_and(|controller| self.world.find_entity(controller.entity_id).is_some())
    }
}

/// Owns checkpoint and pause state for one run and performs the kill,
/// respawn and restart transitions.
///
/// Respawning adds `checkpoint_speed_bonus` to the player's current move
/// speed, so repeated respawns stack until a restart restores the baseline.
struct RunStateCoordinator {
    state: RunState,
    baseline_move_speed: f32,
    tuning: RunTuning,
    death_prompt: Option<Box<dyn DeathPrompt>>,
    deaths: u32,
    respawns: u32,
    restarts: u32,
}

impl RunStateCoordinator {
    fn new(
        initial_spawn: Vec2,
        baseline_move_speed: f32,
        tuning: RunTuning,
        death_prompt: Option<Box<dyn DeathPrompt>>,
    ) -> Self {
        Self {
            state: RunState {
                initial_spawn,
                checkpoint: None,
                is_paused: false,
            },
            baseline_move_speed,
            tuning,
            death_prompt,
            deaths: 0,
            respawns: 0,
            restarts: 0,
        }
    }

    fn state(&self) -> RunState {
        self.state
    }

    fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    #[cfg(test)]
    fn checkpoint(&self) -> Option<Vec2> {
        self.state.checkpoint
    }

    fn baseline_move_speed(&self) -> f32 {
        self.baseline_move_speed
    }

    #[cfg(test)]
    fn death_prompt_visible(&self) -> bool {
        self.death_prompt
            .as_deref()
            .is_some_and(|prompt| prompt.is_visible())
    }

    fn set_checkpoint(&mut self, position: Vec2) {
        self.state.checkpoint = Some(position);
        info!(x = position.x, y = position.y, "checkpoint_set");
    }

    fn kill_player(&mut self, targets: &mut RunTargets<'_>) -> KillOutcome {
        if !targets.has_player() {
            debug!("kill_ignored_no_player");
            return KillOutcome::NoPlayer;
        }
        if self.state.is_paused {
            return KillOutcome::AlreadyPaused;
        }

        self.deaths = self.deaths.saturating_add(1);
        if self.death_prompt.is_none() {
            warn!(deaths = self.deaths, "death_prompt_missing");
            self.restart_run(targets);
            return KillOutcome::Restarted;
        }
        if let Some(prompt) = self.death_prompt.as_deref_mut() {
            prompt.show();
        }
        self.state.is_paused = true;
        targets.world.set_time_scale(0.0);
        info!(deaths = self.deaths, "player_killed");
        KillOutcome::PromptShown
    }

    fn respawn_at_checkpoint(&mut self, targets: &mut RunTargets<'_>) -> bool {
        let spawn = self.state.checkpoint.unwrap_or(self.state.initial_spawn);
        let move_speed = {
            let Some(mut player) = targets.player() else {
                debug!("respawn_ignored_no_player");
                return false;
            };
            player.set_position(spawn);
            player.set_velocity(Vec2::ZERO);
            let boosted = self.tuning.boosted_speed(player.move_speed());
            player.set_move_speed(boosted);
            boosted
        };

        self.reset_run_entities(targets);
        self.respawns = self.respawns.saturating_add(1);
        info!(
            x = spawn.x,
            y = spawn.y,
            move_speed,
            respawns = self.respawns,
            "run_respawned"
        );
        true
    }

    fn restart_run(&mut self, targets: &mut RunTargets<'_>) -> bool {
        let initial_spawn = self.state.initial_spawn;
        {
            let Some(mut player) = targets.player() else {
                debug!("restart_ignored_no_player");
                return false;
            };
            player.set_position(initial_spawn);
            player.set_velocity(Vec2::ZERO);
            player.set_move_speed(self.baseline_move_speed);
        }

        self.state.checkpoint = None;
        for checkpoint in targets.checkpoints.iter_mut() {
            checkpoint.activated = false;
        }
        self.reset_run_entities(targets);
        self.restarts = self.restarts.saturating_add(1);
        info!(restarts = self.restarts, "run_restarted");
        true
    }

    fn reset_run_entities(&mut self, targets: &mut RunTargets<'_>) {
        let reset = targets.tracked.reset_all(targets.world);
        let purged = targets.projectiles.purge_all(targets.world);
        self.close_death_prompt(targets.world);
        debug!(reset, purged, "run_entities_reset");
    }

    /// Drops checkpoint and pause state when the level is unloaded.
    fn forget_run(&mut self, world: &mut SceneWorld) {
        self.state.checkpoint = None;
        self.close_death_prompt(world);
    }

    fn close_death_prompt(&mut self, world: &mut SceneWorld) {
        if let Some(prompt) = self.death_prompt.as_deref_mut() {
            prompt.hide();
        }
        self.state.is_paused = false;
        world.set_time_scale(1.0);
    }
}

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const LEVEL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse level json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level validation failed at {path}: {message}")]
    Validation { path: String, message: String },
}

type LevelResult<T> = Result<T, LevelError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct LevelVec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl LevelVec2 {
    pub(crate) const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn to_vec2(self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LevelPathMode {
    #[default]
    PingPong,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelConfig {
    pub(crate) level_version: u32,
    pub(crate) name: String,
    #[serde(default = "default_gravity")]
    pub(crate) gravity: LevelVec2,
    #[serde(default)]
    pub(crate) player: Option<LevelPlayer>,
    #[serde(default)]
    pub(crate) run: LevelRunTuning,
    #[serde(default)]
    pub(crate) ground: Vec<LevelBox>,
    #[serde(default)]
    pub(crate) platforms: Vec<LevelMovingPlatform>,
    #[serde(default)]
    pub(crate) checkpoints: Vec<LevelCheckpoint>,
    #[serde(default)]
    pub(crate) kill_zones: Vec<LevelBox>,
    #[serde(default)]
    pub(crate) spring_pads: Vec<LevelSpringPad>,
    #[serde(default)]
    pub(crate) hazards: Vec<LevelHazard>,
    #[serde(default)]
    pub(crate) enemies: Vec<LevelEnemy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelPlayer {
    pub(crate) spawn: LevelVec2,
    pub(crate) half_extents: LevelVec2,
    pub(crate) move_speed: f32,
    pub(crate) acceleration: f32,
    pub(crate) deceleration: f32,
    pub(crate) vel_power: f32,
    pub(crate) jump_impulse: f32,
    pub(crate) coyote_time: f32,
    pub(crate) jump_buffer: f32,
    pub(crate) fall_multiplier: f32,
    pub(crate) low_jump_multiplier: f32,
    pub(crate) ground_check_offset: LevelVec2,
    pub(crate) ground_check_radius: f32,
    pub(crate) bullet_speed: f32,
    pub(crate) shots_per_second: f32,
    pub(crate) fire_offset: LevelVec2,
    pub(crate) projectile_lifetime: f32,
    pub(crate) projectile_can_hit_ground: bool,
}

impl Default for LevelPlayer {
    fn default() -> Self {
        Self {
            spawn: LevelVec2::new(0.0, 0.0),
            half_extents: LevelVec2::new(0.4, 0.5),
            move_speed: 12.0,
            acceleration: 90.0,
            deceleration: 140.0,
            vel_power: 1.0,
            jump_impulse: 16.0,
            coyote_time: 0.10,
            jump_buffer: 0.10,
            fall_multiplier: 2.0,
            low_jump_multiplier: 2.0,
            ground_check_offset: LevelVec2::new(0.0, -0.5),
            ground_check_radius: 0.24,
            bullet_speed: 18.0,
            shots_per_second: 6.0,
            fire_offset: LevelVec2::new(0.3, 0.6),
            projectile_lifetime: 3.0,
            projectile_can_hit_ground: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelRunTuning {
    pub(crate) checkpoint_speed_bonus: f32,
    pub(crate) max_move_speed: Option<f32>,
    pub(crate) death_prompt: bool,
}

impl Default for LevelRunTuning {
    fn default() -> Self {
        Self {
            checkpoint_speed_bonus: 2.0,
            max_move_speed: None,
            death_prompt: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelBox {
    pub(crate) center: LevelVec2,
    pub(crate) half_extents: LevelVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelMovingPlatform {
    pub(crate) point_a: LevelVec2,
    pub(crate) point_b: LevelVec2,
    #[serde(default = "default_platform_half_extents")]
    pub(crate) half_extents: LevelVec2,
    #[serde(default = "default_platform_speed")]
    pub(crate) speed: f32,
    #[serde(default = "default_platform_wait")]
    pub(crate) wait_at_ends: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelCheckpoint {
    pub(crate) position: LevelVec2,
    #[serde(default = "default_checkpoint_radius")]
    pub(crate) radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelSpringPad {
    pub(crate) center: LevelVec2,
    #[serde(default = "default_spring_half_extents")]
    pub(crate) half_extents: LevelVec2,
    #[serde(default = "default_bounce_impulse")]
    pub(crate) bounce_impulse: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelHazard {
    pub(crate) position: LevelVec2,
    #[serde(default = "default_hazard_radius")]
    pub(crate) radius: f32,
    #[serde(default)]
    pub(crate) points: Vec<LevelVec2>,
    #[serde(default = "default_hazard_speed")]
    pub(crate) speed: f32,
    #[serde(default = "default_hazard_wait")]
    pub(crate) wait_at_point: f32,
    #[serde(default)]
    pub(crate) wait_overrides: Vec<f32>,
    #[serde(default)]
    pub(crate) mode: LevelPathMode,
    #[serde(default)]
    pub(crate) start_index: usize,
    #[serde(default)]
    pub(crate) flip_x_on_move: bool,
    #[serde(default = "default_true")]
    pub(crate) kill_on_touch: bool,
    #[serde(default)]
    pub(crate) collider_is_trigger: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelPatrol {
    pub(crate) point_a: LevelVec2,
    pub(crate) point_b: LevelVec2,
    #[serde(default = "default_patrol_speed")]
    pub(crate) move_speed: f32,
    #[serde(default = "default_patrol_wait")]
    pub(crate) wait_at_ends: f32,
    #[serde(default = "default_true")]
    pub(crate) start_at_a: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelShooter {
    pub(crate) shots_per_second: f32,
    pub(crate) bullet_speed: f32,
    pub(crate) detection_range: f32,
    pub(crate) fire_offset: LevelVec2,
    pub(crate) projectile_lifetime: f32,
    pub(crate) projectile_can_hit_ground: bool,
}

impl Default for LevelShooter {
    fn default() -> Self {
        Self {
            shots_per_second: 2.0,
            bullet_speed: 14.0,
            detection_range: 20.0,
            fire_offset: LevelVec2::new(0.0, 0.0),
            projectile_lifetime: 3.0,
            projectile_can_hit_ground: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelEnemy {
    pub(crate) position: LevelVec2,
    #[serde(default = "default_enemy_half_extents")]
    pub(crate) half_extents: LevelVec2,
    #[serde(default)]
    pub(crate) patrol: Option<LevelPatrol>,
    /// Horizontal speed used when the enemy has no patrol.
    #[serde(default = "default_drift_speed")]
    pub(crate) drift_speed: f32,
    #[serde(default = "default_true")]
    pub(crate) flip_x_on_move: bool,
    #[serde(default)]
    pub(crate) reflect_bullets: bool,
    #[serde(default = "default_max_hp")]
    pub(crate) max_hp: u32,
    #[serde(default)]
    pub(crate) shooter: Option<LevelShooter>,
    #[serde(default)]
    pub(crate) starts_inactive: bool,
}

fn default_gravity() -> LevelVec2 {
    LevelVec2::new(0.0, -9.81)
}

fn default_platform_half_extents() -> LevelVec2 {
    LevelVec2::new(1.5, 0.25)
}

fn default_platform_speed() -> f32 {
    3.0
}

fn default_platform_wait() -> f32 {
    0.5
}

fn default_checkpoint_radius() -> f32 {
    0.5
}

fn default_spring_half_extents() -> LevelVec2 {
    LevelVec2::new(0.5, 0.2)
}

fn default_bounce_impulse() -> f32 {
    18.0
}

fn default_hazard_radius() -> f32 {
    0.4
}

fn default_hazard_speed() -> f32 {
    3.0
}

fn default_hazard_wait() -> f32 {
    0.2
}

fn default_patrol_speed() -> f32 {
    2.0
}

fn default_patrol_wait() -> f32 {
    0.25
}

fn default_enemy_half_extents() -> LevelVec2 {
    LevelVec2::new(0.4, 0.5)
}

fn default_drift_speed() -> f32 {
    2.0
}

fn default_max_hp() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

pub(crate) fn load_level(path: &Path) -> LevelResult<LevelConfig> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let level = parse_level_json(&raw)?;
    level.validate()?;
    Ok(level)
}

pub(crate) fn parse_level_json(raw: &str) -> LevelResult<LevelConfig> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LevelConfig>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        LevelError::Parse { path, source }
    })
}

fn validation_err(path: &str, message: impl Into<String>) -> LevelError {
    LevelError::Validation {
        path: path.to_string(),
        message: message.into(),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> LevelError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn ensure_finite(path: &str, value: f32) -> LevelResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(expected_actual(path, "finite number", value))
    }
}

fn ensure_non_negative(path: &str, value: f32) -> LevelResult<()> {
    ensure_finite(path, value)?;
    if value < 0.0 {
        return Err(expected_actual(path, "value >= 0", value));
    }
    Ok(())
}

fn ensure_positive(path: &str, value: f32) -> LevelResult<()> {
    ensure_finite(path, value)?;
    if value <= 0.0 {
        return Err(expected_actual(path, "value > 0", value));
    }
    Ok(())
}

fn ensure_finite_vec(path: &str, value: LevelVec2) -> LevelResult<()> {
    ensure_finite(&format!("{path}.x"), value.x)?;
    ensure_finite(&format!("{path}.y"), value.y)
}

fn ensure_positive_extents(path: &str, value: LevelVec2) -> LevelResult<()> {
    ensure_positive(&format!("{path}.x"), value.x)?;
    ensure_positive(&format!("{path}.y"), value.y)
}

impl LevelConfig {
    pub(crate) fn validate(&self) -> LevelResult<()> {
        if self.level_version != LEVEL_VERSION {
            return Err(expected_actual(
                "level_version",
                LEVEL_VERSION,
                self.level_version,
            ));
        }
        ensure_finite_vec("gravity", self.gravity)?;

        if let Some(player) = &self.player {
            player.validate("player")?;
        }
        self.run.validate("run")?;
        if let (Some(player), Some(max_move_speed)) = (&self.player, self.run.max_move_speed) {
            if max_move_speed < player.move_speed {
                return Err(expected_actual(
                    "run.max_move_speed",
                    format!("at least player.move_speed ({})", player.move_speed),
                    max_move_speed,
                ));
            }
        }

        for (index, ground) in self.ground.iter().enumerate() {
            ground.validate(&format!("ground[{index}]"))?;
        }
        for (index, zone) in self.kill_zones.iter().enumerate() {
            zone.validate(&format!("kill_zones[{index}]"))?;
        }
        for (index, platform) in self.platforms.iter().enumerate() {
            let path = format!("platforms[{index}]");
            ensure_finite_vec(&format!("{path}.point_a"), platform.point_a)?;
            ensure_finite_vec(&format!("{path}.point_b"), platform.point_b)?;
            ensure_positive_extents(&format!("{path}.half_extents"), platform.half_extents)?;
            ensure_non_negative(&format!("{path}.speed"), platform.speed)?;
            ensure_non_negative(&format!("{path}.wait_at_ends"), platform.wait_at_ends)?;
        }
        for (index, checkpoint) in self.checkpoints.iter().enumerate() {
            let path = format!("checkpoints[{index}]");
            ensure_finite_vec(&format!("{path}.position"), checkpoint.position)?;
            ensure_positive(&format!("{path}.radius"), checkpoint.radius)?;
        }
        for (index, pad) in self.spring_pads.iter().enumerate() {
            let path = format!("spring_pads[{index}]");
            ensure_finite_vec(&format!("{path}.center"), pad.center)?;
            ensure_positive_extents(&format!("{path}.half_extents"), pad.half_extents)?;
            ensure_non_negative(&format!("{path}.bounce_impulse"), pad.bounce_impulse)?;
        }
        for (index, hazard) in self.hazards.iter().enumerate() {
            hazard.validate(&format!("hazards[{index}]"))?;
        }
        for (index, enemy) in self.enemies.iter().enumerate() {
            enemy.validate(&format!("enemies[{index}]"))?;
        }
        Ok(())
    }
}

impl LevelPlayer {
    fn validate(&self, path: &str) -> LevelResult<()> {
        ensure_finite_vec(&format!("{path}.spawn"), self.spawn)?;
        ensure_positive_extents(&format!("{path}.half_extents"), self.half_extents)?;
        ensure_non_negative(&format!("{path}.move_speed"), self.move_speed)?;
        ensure_non_negative(&format!("{path}.acceleration"), self.acceleration)?;
        ensure_non_negative(&format!("{path}.deceleration"), self.deceleration)?;
        ensure_positive(&format!("{path}.vel_power"), self.vel_power)?;
        ensure_non_negative(&format!("{path}.jump_impulse"), self.jump_impulse)?;
        ensure_non_negative(&format!("{path}.coyote_time"), self.coyote_time)?;
        ensure_non_negative(&format!("{path}.jump_buffer"), self.jump_buffer)?;
        ensure_finite(&format!("{path}.fall_multiplier"), self.fall_multiplier)?;
        ensure_finite(&format!("{path}.low_jump_multiplier"), self.low_jump_multiplier)?;
        ensure_finite_vec(&format!("{path}.ground_check_offset"), self.ground_check_offset)?;
        ensure_positive(&format!("{path}.ground_check_radius"), self.ground_check_radius)?;
        ensure_non_negative(&format!("{path}.bullet_speed"), self.bullet_speed)?;
        ensure_non_negative(&format!("{path}.shots_per_second"), self.shots_per_second)?;
        ensure_finite_vec(&format!("{path}.fire_offset"), self.fire_offset)?;
        ensure_positive(&format!("{path}.projectile_lifetime"), self.projectile_lifetime)
    }
}

impl LevelRunTuning {
    fn validate(&self, path: &str) -> LevelResult<()> {
        ensure_non_negative(
            &format!("{path}.checkpoint_speed_bonus"),
            self.checkpoint_speed_bonus,
        )?;
        if let Some(max_move_speed) = self.max_move_speed {
            ensure_positive(&format!("{path}.max_move_speed"), max_move_speed)?;
        }
        Ok(())
    }
}

impl LevelBox {
    fn validate(&self, path: &str) -> LevelResult<()> {
        ensure_finite_vec(&format!("{path}.center"), self.center)?;
        ensure_positive_extents(&format!("{path}.half_extents"), self.half_extents)
    }
}

impl LevelHazard {
    fn validate(&self, path: &str) -> LevelResult<()> {
        ensure_finite_vec(&format!("{path}.position"), self.position)?;
        ensure_positive(&format!("{path}.radius"), self.radius)?;
        for (index, point) in self.points.iter().enumerate() {
            ensure_finite_vec(&format!("{path}.points[{index}]"), *point)?;
        }
        ensure_non_negative(&format!("{path}.speed"), self.speed)?;
        ensure_non_negative(&format!("{path}.wait_at_point"), self.wait_at_point)?;
        for (index, wait) in self.wait_overrides.iter().enumerate() {
            ensure_finite(&format!("{path}.wait_overrides[{index}]"), *wait)?;
        }
        Ok(())
    }
}

impl LevelEnemy {
    fn validate(&self, path: &str) -> LevelResult<()> {
        ensure_finite_vec(&format!("{path}.position"), self.position)?;
        ensure_positive_extents(&format!("{path}.half_extents"), self.half_extents)?;
        ensure_finite(&format!("{path}.drift_speed"), self.drift_speed)?;
        if self.max_hp == 0 {
            return Err(expected_actual(
                &format!("{path}.max_hp"),
                "at least 1",
                self.max_hp,
            ));
        }
        if let Some(patrol) = &self.patrol {
            let patrol_path = format!("{path}.patrol");
            ensure_finite_vec(&format!("{patrol_path}.point_a"), patrol.point_a)?;
            ensure_finite_vec(&format!("{patrol_path}.point_b"), patrol.point_b)?;
            ensure_non_negative(&format!("{patrol_path}.move_speed"), patrol.move_speed)?;
            ensure_non_negative(&format!("{patrol_path}.wait_at_ends"), patrol.wait_at_ends)?;
        }
        if let Some(shooter) = &self.shooter {
            let shooter_path = format!("{path}.shooter");
            ensure_positive(
                &format!("{shooter_path}.shots_per_second"),
                shooter.shots_per_second,
            )?;
            ensure_non_negative(&format!("{shooter_path}.bullet_speed"), shooter.bullet_speed)?;
            ensure_non_negative(
                &format!("{shooter_path}.detection_range"),
                shooter.detection_range,
            )?;
            ensure_finite_vec(&format!("{shooter_path}.fire_offset"), shooter.fire_offset)?;
            ensure_positive(
                &format!("{shooter_path}.projectile_lifetime"),
                shooter.projectile_lifetime,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_LEVEL: &str = r#"{
        "level_version": 1,
        "name": "minimal"
    }"#;

    fn validation_path(error: LevelError) -> String {
        match error {
            LevelError::Validation { path, .. } => path,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn minimal_level_uses_defaults() {
        let level = parse_level_json(MINIMAL_LEVEL).expect("parse");
        level.validate().expect("valid");

        assert_eq!(level.gravity, LevelVec2::new(0.0, -9.81));
        assert!(level.player.is_none());
        assert_eq!(level.run.checkpoint_speed_bonus, 2.0);
        assert!(level.run.death_prompt);
        assert!(level.enemies.is_empty());
    }

    #[test]
    fn player_tuning_fields_fall_back_individually() {
        let raw = r#"{
            "level_version": 1,
            "name": "tuned",
            "player": { "spawn": { "x": 1.0, "y": 2.0 }, "move_speed": 8.0 }
        }"#;
        let level = parse_level_json(raw).expect("parse");
        let player = level.player.expect("player");

        assert_eq!(player.spawn, LevelVec2::new(1.0, 2.0));
        assert_eq!(player.move_speed, 8.0);
        assert_eq!(player.jump_impulse, LevelPlayer::default().jump_impulse);
    }

    #[test]
    fn hazard_mode_parses_snake_case() {
        let raw = r#"{
            "level_version": 1,
            "name": "loop",
            "hazards": [{ "position": { "x": 0, "y": 0 }, "mode": "loop", "start_index": 2 }]
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(level.hazards[0].mode, LevelPathMode::Loop);
        assert_eq!(level.hazards[0].start_index, 2);
        assert!(level.hazards[0].kill_on_touch);
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{
            "level_version": 1,
            "name": "broken",
            "enemies": [{ "position": { "x": 0.0, "y": "oops" } }]
        }"#;
        let error = parse_level_json(raw).expect_err("should fail");

        match error {
            LevelError::Parse { path, .. } => assert_eq!(path, "enemies[0].position.y"),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "level_version": 1, "name": "typo", "chekpoints": [] }"#;
        assert!(matches!(
            parse_level_json(raw),
            Err(LevelError::Parse { .. })
        ));
    }

    #[test]
    fn version_mismatch_fails_validation() {
        let raw = r#"{ "level_version": 7, "name": "future" }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(
            validation_path(level.validate().expect_err("invalid")),
            "level_version"
        );
    }

    #[test]
    fn zero_hit_points_fail_validation() {
        let raw = r#"{
            "level_version": 1,
            "name": "immortal",
            "enemies": [{ "position": { "x": 0, "y": 0 }, "max_hp": 0 }]
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(
            validation_path(level.validate().expect_err("invalid")),
            "enemies[0].max_hp"
        );
    }

    #[test]
    fn non_positive_extents_fail_validation() {
        let raw = r#"{
            "level_version": 1,
            "name": "flat",
            "kill_zones": [{ "center": { "x": 0, "y": -10 }, "half_extents": { "x": 5, "y": 0 } }]
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(
            validation_path(level.validate().expect_err("invalid")),
            "kill_zones[0].half_extents.y"
        );
    }

    #[test]
    fn negative_speed_bonus_fails_validation() {
        let raw = r#"{
            "level_version": 1,
            "name": "slower",
            "run": { "checkpoint_speed_bonus": -5.0 }
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(
            validation_path(level.validate().expect_err("invalid")),
            "run.checkpoint_speed_bonus"
        );
    }

    #[test]
    fn speed_cap_below_player_speed_fails_validation() {
        let raw = r#"{
            "level_version": 1,
            "name": "capped",
            "player": { "move_speed": 12.0 },
            "run": { "max_move_speed": 5.0 }
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(
            validation_path(level.validate().expect_err("invalid")),
            "run.max_move_speed"
        );
    }

    #[test]
    fn speed_cap_equal_to_player_speed_is_valid() {
        let raw = r#"{
            "level_version": 1,
            "name": "flat_speed",
            "player": { "move_speed": 12.0 },
            "run": { "max_move_speed": 12.0 }
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert!(level.validate().is_ok());
    }

    #[test]
    fn enemy_and_projectile_defaults() {
        let raw = r#"{
            "level_version": 1,
            "name": "drifter",
            "player": {},
            "enemies": [{ "position": { "x": 0, "y": 0 }, "shooter": {} }]
        }"#;
        let level = parse_level_json(raw).expect("parse");

        assert_eq!(level.enemies[0].drift_speed, 2.0);
        let shooter = level.enemies[0].shooter.expect("shooter");
        assert!(shooter.projectile_can_hit_ground);
        assert!(level.player.expect("player").projectile_can_hit_ground);
    }

    #[test]
    fn load_level_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("level.json");
        fs::write(&path, MINIMAL_LEVEL).expect("write level");

        let level = load_level(&path).expect("load");
        assert_eq!(level.name, "minimal");
    }

    #[test]
    fn load_level_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = load_level(&dir.path().join("missing.json")).expect_err("missing");

        assert!(matches!(error, LevelError::Read { .. }));
    }

    #[test]
    fn bundled_level_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/levels/level_01.json");
        let level = load_level(&path).expect("bundled level");

        assert!(level.player.is_some());
        assert!(!level.checkpoints.is_empty());
    }
}

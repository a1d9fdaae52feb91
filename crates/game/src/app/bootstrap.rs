use std::env;
use std::path::{Path, PathBuf};

use engine::{resolve_app_paths, AppPaths, LoopConfig, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo_input::DemoInput;
use super::gameplay::{self, PlatformerScene};
use super::level::{load_level, LevelError};

const LEVEL_ENV_VAR: &str = "PLATFORMER_LEVEL";
const MAX_TICKS_ENV_VAR: &str = "PLATFORMER_MAX_TICKS";
const REALTIME_ENV_VAR: &str = "PLATFORMER_REALTIME";
const DEFAULT_LEVEL_FILE: &str = "level_01.json";
const DEFAULT_MAX_TICKS: u64 = 1800;

#[derive(Debug, Error)]
pub(crate) enum BootError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: PlatformerScene,
    pub(crate) input: DemoInput,
}

pub(crate) fn build_app() -> Result<AppWiring, BootError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let paths = resolve_app_paths()?;
    let level_path = resolve_level_path(&paths, env::var(LEVEL_ENV_VAR).ok().as_deref());
    let level = load_level(&level_path)?;
    info!(
        path = %level_path.display(),
        level = %level.name,
        "level_resolved"
    );

    let config = LoopConfig {
        max_ticks: parse_max_ticks(env::var(MAX_TICKS_ENV_VAR).ok().as_deref())?,
        realtime: parse_realtime(env::var(REALTIME_ENV_VAR).ok().as_deref())?,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: gameplay::build_scene(level),
        input: DemoInput,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Relative overrides are looked up in the levels directory.
fn resolve_level_path(paths: &AppPaths, raw: Option<&str>) -> PathBuf {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            let path = Path::new(value);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                paths.levels_dir.join(path)
            }
        }
        None => paths.levels_dir.join(DEFAULT_LEVEL_FILE),
    }
}

/// `0` or `none` runs until the input or scene quits.
fn parse_max_ticks(raw: Option<&str>) -> Result<Option<u64>, BootError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(Some(DEFAULT_MAX_TICKS));
    };
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match value.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(ticks) => Ok(Some(ticks)),
        Err(_) => Err(BootError::InvalidEnv {
            var: MAX_TICKS_ENV_VAR,
            value: value.to_string(),
            reason: "expected a tick count or 'none'",
        }),
    }
}

fn parse_realtime(raw: Option<&str>) -> Result<bool, BootError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BootError::InvalidEnv {
            var: REALTIME_ENV_VAR,
            value: value.to_string(),
            reason: "expected true/false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use engine::app_paths_for_root;

    use super::*;

    fn paths() -> AppPaths {
        app_paths_for_root(PathBuf::from("/srv/platformer"))
    }

    #[test]
    fn level_path_defaults_to_first_level() {
        assert_eq!(
            resolve_level_path(&paths(), None),
            PathBuf::from("/srv/platformer/assets/levels/level_01.json")
        );
        assert_eq!(
            resolve_level_path(&paths(), Some("  ")),
            PathBuf::from("/srv/platformer/assets/levels/level_01.json")
        );
    }

    #[test]
    fn relative_level_override_resolves_in_levels_dir() {
        assert_eq!(
            resolve_level_path(&paths(), Some("bonus.json")),
            PathBuf::from("/srv/platformer/assets/levels/bonus.json")
        );
    }

    #[test]
    fn absolute_level_override_is_used_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom = dir.path().join("custom.json");
        let raw = custom.to_str().expect("utf8 path");

        assert_eq!(resolve_level_path(&paths(), Some(raw)), custom);
    }

    #[test]
    fn max_ticks_parsing() {
        assert_eq!(parse_max_ticks(None).expect("default"), Some(DEFAULT_MAX_TICKS));
        assert_eq!(parse_max_ticks(Some("600")).expect("count"), Some(600));
        assert_eq!(parse_max_ticks(Some("0")).expect("zero"), None);
        assert_eq!(parse_max_ticks(Some("None")).expect("none"), None);
        assert!(matches!(
            parse_max_ticks(Some("-3")),
            Err(BootError::InvalidEnv {
                var: MAX_TICKS_ENV_VAR,
                ..
            })
        ));
    }

    #[test]
    fn realtime_parsing() {
        assert!(!parse_realtime(None).expect("default"));
        assert!(parse_realtime(Some("TRUE")).expect("true"));
        assert!(!parse_realtime(Some("off")).expect("off"));
        assert!(parse_realtime(Some("sometimes")).is_err());
    }
}

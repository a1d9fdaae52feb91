use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    run_headless, run_headless_with_metrics, Body, BodyKind, Collider, ColliderShape,
    CollisionEvent, CollisionKind, Entity, EntityId, EntityRole, EntitySpec, InputAction,
    InputSnapshot, InputSource, LoopConfig, LoopMetricsSnapshot, MetricsHandle, RunReport, Scene,
    SceneCommand, SceneWorld, ScriptedInput, Simulation, StopReason, TickOutcome, Transform, Vec2,
    SLOW_TICK_ENV_VAR,
};

pub const ROOT_ENV_VAR: &str = "PLATFORMER_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "PLATFORMER_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/platformer\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let levels_dir = root.join("assets").join("levels");
    AppPaths { root, levels_dir }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("assets")).expect("assets dir");
        assert!(!is_repo_marker(dir.path()));

        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        assert!(is_repo_marker(dir.path()));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        fs::create_dir_all(dir.path().join("crates")).expect("crates dir");
        let nested = dir.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested dir");

        let found = find_root_above(&nested).expect("root");
        assert_eq!(found, normalize_path(dir.path()));
    }

    #[test]
    fn levels_dir_lives_under_assets() {
        let paths = app_paths_for_root(PathBuf::from("/tmp/project"));
        assert_eq!(paths.levels_dir, PathBuf::from("/tmp/project/assets/levels"));
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    apply_event, default_phrases, run_loop, ActionKind, ActionWeights, ActorDecision,
    BeatTarget, CategoryFilter, DemoConfig, DemoConfigError, DemoEngine, DemoView,
    DirectorPhase, FiredTimer, Frontend, HostSnapshot, LoopConfig, LoopControl, LoopExit,
    LoopInput, LoopMetricsSnapshot, MetricsHandle, Phrase, PosHost, Product, ProductId,
    RandomSource, RestorePolicy, SceneKind, SceneSpec, SessionEvent, SessionId, SessionInfo,
    Stage, StdRandom, StopReason, StopReport, SyntheticActor, SyntheticEvent, TimerId,
    TimerKind, TimerQueue, TimerRegistry, UserSignal, Wake, DEFAULT_CART_RESET_THRESHOLD,
    DEFAULT_GHOST_TICK_MS, DEFAULT_PHRASE_INTERVAL_MS, DEFAULT_PHRASE_REVEAL_DELAY_MS,
    DEFAULT_PRESS_FEEDBACK_MS, DEFAULT_PULSE_FEEDBACK_MS, DEFAULT_RHYTHM_BEAT_MS,
    DEFAULT_SCENE_SWITCH_INTERVAL_MS, RHYTHM_BEATS_PER_BAR, RHYTHM_ICON_COUNT,
};

pub const DATA_DIR_ENV_VAR: &str = "NEXUS_DATA_DIR";
pub const DEFAULT_DATA_DIR_NAME: &str = "nexus_data";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub products_file: PathBuf,
    pub settings_file: PathBuf,
    pub demo_config_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("{var} is set but empty")]
    EmptyEnvPath { var: &'static str },
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves the data directory from `NEXUS_DATA_DIR`, falling back to
/// `./nexus_data`, and makes sure it exists.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let data_dir = match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) if value.trim().is_empty() => {
            return Err(StartupError::EmptyEnvPath {
                var: DATA_DIR_ENV_VAR,
            })
        }
        Ok(value) => PathBuf::from(value),
        Err(env::VarError::NotPresent) => env::current_dir()
            .map_err(StartupError::CurrentDir)?
            .join(DEFAULT_DATA_DIR_NAME),
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: DATA_DIR_ENV_VAR,
                source,
            })
        }
    };
    app_paths_in(&data_dir)
}

pub fn app_paths_in(data_dir: &Path) -> Result<AppPaths, StartupError> {
    fs::create_dir_all(data_dir).map_err(|source| StartupError::CreateDataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    let data_dir = normalize_path(data_dir);

    Ok(AppPaths {
        products_file: data_dir.join("products.json"),
        settings_file: data_dir.join("settings.json"),
        demo_config_file: data_dir.join("demo.json"),
        data_dir,
    })
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_paths_create_nested_data_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("store").join("data");

        let paths = app_paths_in(&nested).expect("paths");

        assert!(nested.is_dir());
        assert_eq!(paths.products_file.file_name().unwrap(), "products.json");
        assert_eq!(paths.settings_file.parent(), Some(paths.data_dir.as_path()));
        assert_eq!(paths.demo_config_file.file_name().unwrap(), "demo.json");
    }

    #[test]
    fn data_dir_blocked_by_a_file_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("occupied");
        fs::write(&blocker, b"not a directory").expect("write blocker");

        let error = app_paths_in(&blocker.join("data")).expect_err("should fail");
        assert!(matches!(error, StartupError::CreateDataDir { .. }));
    }
}

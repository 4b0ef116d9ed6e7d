use std::env;

use nexus_engine::{
    resolve_app_paths, DemoConfigError, DemoEngine, LoopConfig, StartupError, StdRandom,
    DATA_DIR_ENV_VAR,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{
    load_demo_config, parse_idle_timeout_override, ConfigLoadError, DemoPreset,
    DEMO_PRESET_ENV_VAR, IDLE_TIMEOUT_ENV_VAR,
};
use super::pos::{AppState, Store};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error("demo engine rejected its config: {0}")]
    Engine(#[from] DemoConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) engine: DemoEngine<AppState, StdRandom>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== NEXUS POS Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        data_dir = %paths.data_dir.display(),
        env_var = DATA_DIR_ENV_VAR,
        "data_dir_resolved"
    );

    let preset = DemoPreset::from_env_value(env::var(DEMO_PRESET_ENV_VAR).ok().as_deref());
    let demo_config = load_demo_config(&paths.demo_config_file, preset)?;
    let idle_timeout_override_ms =
        parse_idle_timeout_override(env::var(IDLE_TIMEOUT_ENV_VAR).ok().as_deref())?;
    if let Some(timeout_ms) = idle_timeout_override_ms {
        info!(timeout_ms, env_var = IDLE_TIMEOUT_ENV_VAR, "idle_timeout_overridden");
    }

    let state = AppState::load(Store::new(&paths), idle_timeout_override_ms);
    let engine = DemoEngine::new(state, StdRandom::from_entropy(), demo_config)?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        engine,
    })
}

/// Logs go to stderr; stdout belongs to the terminal frontend.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

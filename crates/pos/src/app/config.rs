use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nexus_engine::{DemoConfig, DemoConfigError};
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const DEMO_PRESET_ENV_VAR: &str = "NEXUS_DEMO_PRESET";
pub(crate) const IDLE_TIMEOUT_ENV_VAR: &str = "NEXUS_IDLE_TIMEOUT_MS";

#[derive(Debug, Error)]
pub(crate) enum ConfigLoadError {
    #[error("failed to read demo config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse demo config {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid demo config from {origin}: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: DemoConfigError,
    },
    #[error("{var} must be a positive number of milliseconds, got '{value}'")]
    InvalidIdleTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DemoPreset {
    Default,
    Brisk,
}

impl DemoPreset {
    /// Unknown names fall back to the default preset with a warning.
    pub(crate) fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Default,
            Some(value) if value.eq_ignore_ascii_case("default") => Self::Default,
            Some(value) if value.eq_ignore_ascii_case("brisk") => Self::Brisk,
            Some(value) => {
                warn!(var = DEMO_PRESET_ENV_VAR, value, "unknown_demo_preset_using_default");
                Self::Default
            }
        }
    }

    fn config(self) -> DemoConfig {
        match self {
            Self::Default => DemoConfig::default(),
            Self::Brisk => DemoConfig::brisk(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Brisk => "brisk",
        }
    }
}

/// `demo.json` wins when present; otherwise the preset named by the
/// environment is used. Either way the result is validated.
pub(crate) fn load_demo_config(
    demo_config_file: &Path,
    preset: DemoPreset,
) -> Result<DemoConfig, ConfigLoadError> {
    let (config, origin) = match fs::read_to_string(demo_config_file) {
        Ok(raw) => (
            parse_demo_config(demo_config_file, &raw)?,
            demo_config_file.display().to_string(),
        ),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            (preset.config(), format!("preset:{}", preset.name()))
        }
        Err(source) => {
            return Err(ConfigLoadError::Read {
                path: demo_config_file.to_path_buf(),
                source,
            })
        }
    };

    config
        .validate()
        .map_err(|source| ConfigLoadError::Invalid {
            origin: origin.clone(),
            source,
        })?;
    info!(
        origin = %origin,
        scenes = config.scenes.len(),
        scene_switch_interval_ms = config.scene_switch_interval_ms,
        phrases = config.phrases.len(),
        "demo_config_loaded"
    );
    Ok(config)
}

fn parse_demo_config(path: &Path, raw: &str) -> Result<DemoConfig, ConfigLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigLoadError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

pub(crate) fn parse_idle_timeout_override(
    raw: Option<&str>,
) -> Result<Option<u64>, ConfigLoadError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match value.parse::<u64>() {
        Ok(timeout_ms) if timeout_ms > 0 => Ok(Some(timeout_ms)),
        _ => Err(ConfigLoadError::InvalidIdleTimeout {
            var: IDLE_TIMEOUT_ENV_VAR,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use nexus_engine::SceneKind;

    use super::*;

    #[test]
    fn missing_file_uses_the_selected_preset() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.json");

        assert_eq!(
            load_demo_config(&path, DemoPreset::Default).expect("default"),
            DemoConfig::default()
        );
        assert_eq!(
            load_demo_config(&path, DemoPreset::Brisk).expect("brisk"),
            DemoConfig::brisk()
        );
    }

    #[test]
    fn file_overrides_only_the_fields_it_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.json");
        fs::write(
            &path,
            r#"{"scene_switch_interval_ms": 2000, "scenes": [{"kind": "tab_ballet", "interval_ms": 500}]}"#,
        )
        .expect("write");

        let config = load_demo_config(&path, DemoPreset::Brisk).expect("config");
        assert_eq!(config.scene_switch_interval_ms, 2_000);
        assert_eq!(config.scenes.len(), 1);
        assert_eq!(config.scenes[0].kind, SceneKind::TabBallet);
        assert_eq!(config.phrase_interval_ms, DemoConfig::default().phrase_interval_ms);
    }

    #[test]
    fn parse_errors_report_the_json_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.json");
        fs::write(&path, r#"{"scenes": [{"kind": "moonwalk", "interval_ms": 1}]}"#)
            .expect("write");

        match load_demo_config(&path, DemoPreset::Default) {
            Err(ConfigLoadError::Parse { json_path, .. }) => {
                assert_eq!(json_path, "scenes[0].kind");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn invalid_files_are_rejected_after_parsing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.json");
        fs::write(&path, r#"{"scenes": []}"#).expect("write");

        match load_demo_config(&path, DemoPreset::Default) {
            Err(ConfigLoadError::Invalid { source, .. }) => {
                assert_eq!(source, DemoConfigError::NoScenes);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn preset_names_are_case_insensitive() {
        assert_eq!(DemoPreset::from_env_value(Some(" BRISK ")), DemoPreset::Brisk);
        assert_eq!(DemoPreset::from_env_value(None), DemoPreset::Default);
        assert_eq!(DemoPreset::from_env_value(Some("turbo")), DemoPreset::Default);
    }

    #[test]
    fn idle_timeout_override_must_be_positive() {
        assert_eq!(parse_idle_timeout_override(None).expect("unset"), None);
        assert_eq!(parse_idle_timeout_override(Some(" ")).expect("blank"), None);
        assert_eq!(
            parse_idle_timeout_override(Some("5000")).expect("valid"),
            Some(5_000)
        );
        assert!(matches!(
            parse_idle_timeout_override(Some("0")),
            Err(ConfigLoadError::InvalidIdleTimeout { .. })
        ));
        assert!(parse_idle_timeout_override(Some("soon")).is_err());
    }
}

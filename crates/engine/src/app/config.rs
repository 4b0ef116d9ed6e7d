use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCENE_SWITCH_INTERVAL_MS: u64 = 8_000;
pub const DEFAULT_GHOST_TICK_MS: u64 = 1_200;
pub const DEFAULT_RHYTHM_BEAT_MS: u64 = 600;
pub const DEFAULT_PRESS_FEEDBACK_MS: u64 = 150;
pub const DEFAULT_PULSE_FEEDBACK_MS: u64 = 300;
pub const DEFAULT_CART_RESET_THRESHOLD: u32 = 3;
pub const DEFAULT_PHRASE_INTERVAL_MS: u64 = 4_000;
pub const DEFAULT_PHRASE_REVEAL_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    GhostPurchase,
    TabBallet,
    RhythmBeat,
    TextRevealOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub kind: SceneKind,
    /// Sub-loop tick period. Ignored for [`SceneKind::TextRevealOnly`].
    pub interval_ms: u64,
}

impl SceneSpec {
    pub const fn new(kind: SceneKind, interval_ms: u64) -> Self {
        Self { kind, interval_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionWeights {
    pub purchase: f64,
    pub navigate: f64,
    pub reset: f64,
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            purchase: 0.7,
            navigate: 0.2,
            reset: 0.1,
        }
    }
}

impl ActionWeights {
    pub fn total(&self) -> f64 {
        self.purchase + self.navigate + self.reset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub main: String,
    pub sub: String,
}

impl Phrase {
    pub fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: sub.into(),
        }
    }
}

/// What the cart and tab look like when control returns to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Empty cart on the `All` tab.
    #[default]
    EmptyBaseline,
    /// Whatever the cart and tab held when the demo took over.
    PreDemoSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub scene_switch_interval_ms: u64,
    pub scenes: Vec<SceneSpec>,
    pub action_weights: ActionWeights,
    pub press_feedback_ms: u64,
    pub pulse_feedback_ms: u64,
    pub cart_reset_threshold: u32,
    pub phrase_interval_ms: u64,
    pub phrase_reveal_delay_ms: u64,
    pub phrases: Vec<Phrase>,
    /// Ends the session on its own once this many scene switches have fired.
    /// Must be at least one when set.
    pub max_scene_switches: Option<u32>,
    pub restore_policy: RestorePolicy,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scene_switch_interval_ms: DEFAULT_SCENE_SWITCH_INTERVAL_MS,
            scenes: vec![
                SceneSpec::new(SceneKind::GhostPurchase, DEFAULT_GHOST_TICK_MS),
                SceneSpec::new(SceneKind::RhythmBeat, DEFAULT_RHYTHM_BEAT_MS),
            ],
            action_weights: ActionWeights::default(),
            press_feedback_ms: DEFAULT_PRESS_FEEDBACK_MS,
            pulse_feedback_ms: DEFAULT_PULSE_FEEDBACK_MS,
            cart_reset_threshold: DEFAULT_CART_RESET_THRESHOLD,
            phrase_interval_ms: DEFAULT_PHRASE_INTERVAL_MS,
            phrase_reveal_delay_ms: DEFAULT_PHRASE_REVEAL_DELAY_MS,
            phrases: default_phrases(),
            max_scene_switches: None,
            restore_policy: RestorePolicy::EmptyBaseline,
        }
    }
}

impl DemoConfig {
    /// Faster cadence that runs every scene kind.
    pub fn brisk() -> Self {
        Self {
            scene_switch_interval_ms: 6_000,
            scenes: vec![
                SceneSpec::new(SceneKind::GhostPurchase, 800),
                SceneSpec::new(SceneKind::TabBallet, 800),
                SceneSpec::new(SceneKind::RhythmBeat, DEFAULT_RHYTHM_BEAT_MS),
                SceneSpec::new(SceneKind::TextRevealOnly, 0),
            ],
            action_weights: ActionWeights {
                purchase: 0.7,
                navigate: 0.15,
                reset: 0.15,
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DemoConfigError> {
        if self.scenes.is_empty() {
            return Err(DemoConfigError::NoScenes);
        }
        if self.phrases.is_empty() {
            return Err(DemoConfigError::NoPhrases);
        }
        for (field, value) in [
            ("scene_switch_interval_ms", self.scene_switch_interval_ms),
            ("phrase_interval_ms", self.phrase_interval_ms),
        ] {
            if value == 0 {
                return Err(DemoConfigError::ZeroInterval { field });
            }
        }
        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.kind != SceneKind::TextRevealOnly && scene.interval_ms == 0 {
                return Err(DemoConfigError::ZeroSceneInterval {
                    index,
                    kind: scene.kind,
                });
            }
        }
        if self.max_scene_switches == Some(0) {
            return Err(DemoConfigError::ZeroMaxSceneSwitches);
        }
        let weights = self.action_weights;
        let all_finite_non_negative = [weights.purchase, weights.navigate, weights.reset]
            .iter()
            .all(|weight| weight.is_finite() && *weight >= 0.0);
        let total = weights.total();
        if !all_finite_non_negative || !total.is_finite() || total <= 0.0 {
            return Err(DemoConfigError::InvalidWeights {
                purchase: weights.purchase,
                navigate: weights.navigate,
                reset: weights.reset,
            });
        }
        Ok(())
    }
}

pub fn default_phrases() -> Vec<Phrase> {
    vec![
        Phrase::new("ULTRA FAST", "Instant Touch Response"),
        Phrase::new("3D UI", "Immersive Experience"),
        Phrase::new("CLOUD SYNC", "Real-time Data"),
        Phrase::new("SATISFYING", "Tactile Physics"),
    ]
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemoConfigError {
    #[error("demo config must list at least one scene")]
    NoScenes,
    #[error("demo config must list at least one phrase")]
    NoPhrases,
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
    #[error("scene {index} ({kind:?}) needs a non-zero interval_ms")]
    ZeroSceneInterval { index: usize, kind: SceneKind },
    #[error("max_scene_switches must be at least 1 when set")]
    ZeroMaxSceneSwitches,
    #[error(
        "action weights must be finite, non-negative and sum to a finite value above zero \
(purchase={purchase}, navigate={navigate}, reset={reset})"
    )]
    InvalidWeights {
        purchase: f64,
        navigate: f64,
        reset: f64,
    },
}

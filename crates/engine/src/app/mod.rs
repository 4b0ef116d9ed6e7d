mod activity;
mod actor;
mod config;
mod director;
mod engine;
mod host;
mod loop_runner;
mod metrics;
mod presentation;
mod random;
mod timers;
mod view;

pub use activity::UserSignal;
pub use actor::{apply_event, ActionKind, ActorDecision, SyntheticActor, SyntheticEvent};
pub use config::{
    default_phrases, ActionWeights, DemoConfig, DemoConfigError, Phrase, RestorePolicy,
    SceneKind, SceneSpec, DEFAULT_CART_RESET_THRESHOLD, DEFAULT_GHOST_TICK_MS,
    DEFAULT_PHRASE_INTERVAL_MS, DEFAULT_PHRASE_REVEAL_DELAY_MS, DEFAULT_PRESS_FEEDBACK_MS,
    DEFAULT_PULSE_FEEDBACK_MS, DEFAULT_RHYTHM_BEAT_MS, DEFAULT_SCENE_SWITCH_INTERVAL_MS,
};
pub use director::{
    DirectorPhase, SessionEvent, SessionId, SessionInfo, StopReason, StopReport, Wake,
    RHYTHM_BEATS_PER_BAR,
};
pub use engine::DemoEngine;
pub use host::{CategoryFilter, HostSnapshot, PosHost, Product, ProductId};
pub use loop_runner::{run_loop, Frontend, LoopConfig, LoopControl, LoopExit, LoopInput};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use random::{RandomSource, StdRandom};
pub use timers::{FiredTimer, TimerId, TimerKind, TimerQueue, TimerRegistry};
pub use view::{BeatTarget, DemoView, Stage, RHYTHM_ICON_COUNT};

use std::mem;

use tracing::{debug, info};

use super::actor::{apply_event, ActorDecision, SyntheticActor, SyntheticEvent};
use super::config::{DemoConfig, RestorePolicy, SceneKind};
use super::host::{CategoryFilter, HostSnapshot, PosHost};
use super::presentation::PresentationLoop;
use super::random::RandomSource;
use super::timers::{TimerId, TimerQueue, TimerRegistry};
use super::view::{BeatTarget, DemoView, Stage, RHYTHM_ICON_COUNT};

/// Icons pulse on beats 0..4, the pay button on beat 4, beat 5 rests.
pub const RHYTHM_BEATS_PER_BAR: u32 = RHYTHM_ICON_COUNT as u32 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SceneSwitch,
    SceneTick,
    PressRevert,
    PulseRevert,
    PhraseAdvance,
    PhraseReveal,
}

/// Payload carried by every engine timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    IdleDeadline { generation: u64 },
    Session {
        session: SessionId,
        event: SessionEvent,
    },
}

/// Read-only projection of the director state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorPhase {
    Idle,
    Running { scene_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    UserSignal,
    Exhausted,
    Requested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    pub session: SessionId,
    pub reason: StopReason,
    pub cancelled_timers: usize,
    pub ran_ms: u64,
    pub scene_switches: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub started_at_ms: u64,
    pub scene_index: usize,
    pub scene_kind: SceneKind,
    pub scene_switches: u32,
    pub scene_ticks: u64,
    pub phrase_index: usize,
    pub phrase_advances: u64,
    pub owned_timers: usize,
}

/// Borrowed engine resources a director operation may touch.
pub(crate) struct DemoContext<'a, H, R> {
    pub(crate) now_ms: u64,
    pub(crate) timers: &'a mut TimerQueue<Wake>,
    pub(crate) host: &'a mut H,
    pub(crate) rng: &'a mut R,
    pub(crate) view: &'a mut DemoView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Applied,
    Stale,
    Exhausted,
}

#[derive(Debug)]
struct SubLoop {
    kind: SceneKind,
    timer: Option<TimerId>,
    beat: u32,
}

#[derive(Debug)]
struct DemoSession {
    id: SessionId,
    started_at_ms: u64,
    scene_index: usize,
    scene_switches: u32,
    scene_ticks: u64,
    timers: TimerRegistry,
    sub_loop: SubLoop,
    press_revert: Option<TimerId>,
    pulse_revert: Option<TimerId>,
    presentation: PresentationLoop,
    backup: HostSnapshot,
}

impl DemoSession {
    fn wake(&self, event: SessionEvent) -> Wake {
        Wake::Session {
            session: self.id,
            event,
        }
    }
}

#[derive(Debug)]
enum DirectorState {
    Idle,
    Running(DemoSession),
}

pub(crate) struct SceneDirector {
    config: DemoConfig,
    actor: SyntheticActor,
    state: DirectorState,
    sessions_started: u64,
}

impl SceneDirector {
    pub(crate) fn new(config: DemoConfig) -> Self {
        let actor = SyntheticActor::new(config.action_weights, config.cart_reset_threshold);
        Self {
            config,
            actor,
            state: DirectorState::Idle,
            sessions_started: 0,
        }
    }

    pub(crate) fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub(crate) fn phase(&self) -> DirectorPhase {
        match &self.state {
            DirectorState::Idle => DirectorPhase::Idle,
            DirectorState::Running(session) => DirectorPhase::Running {
                scene_index: session.scene_index,
            },
        }
    }

    pub(crate) fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub(crate) fn session_info(&self) -> Option<SessionInfo> {
        let DirectorState::Running(session) = &self.state else {
            return None;
        };
        Some(SessionInfo {
            id: session.id,
            started_at_ms: session.started_at_ms,
            scene_index: session.scene_index,
            scene_kind: session.sub_loop.kind,
            scene_switches: session.scene_switches,
            scene_ticks: session.scene_ticks,
            phrase_index: session.presentation.phrase_index(),
            phrase_advances: session.presentation.advances(),
            owned_timers: session.timers.len(),
        })
    }

    /// `Idle -> Running(0)`. Returns `None` when a session is already live.
    pub(crate) fn start<H: PosHost, R: RandomSource>(
        &mut self,
        cx: &mut DemoContext<'_, H, R>,
    ) -> Option<SessionId> {
        if !matches!(self.state, DirectorState::Idle) {
            return None;
        }
        self.sessions_started = self.sessions_started.saturating_add(1);
        let id = SessionId(self.sessions_started);

        let backup = cx.host.snapshot();
        force_baseline(&mut *cx.host);
        cx.view.reset();
        cx.view.overlay_visible = true;

        let mut session = DemoSession {
            id,
            started_at_ms: cx.now_ms,
            scene_index: 0,
            scene_switches: 0,
            scene_ticks: 0,
            timers: TimerRegistry::default(),
            sub_loop: SubLoop {
                kind: SceneKind::TextRevealOnly,
                timer: None,
                beat: 0,
            },
            press_revert: None,
            pulse_revert: None,
            presentation: PresentationLoop::new(
                self.config.phrases.clone(),
                self.config.phrase_reveal_delay_ms,
            ),
            backup,
        };

        session.presentation.start(
            id,
            cx.now_ms,
            self.config.phrase_interval_ms,
            cx.timers,
            &mut session.timers,
            cx.view,
        );
        let switch_wake = session.wake(SessionEvent::SceneSwitch);
        session.timers.repeating(
            cx.timers,
            cx.now_ms,
            self.config.scene_switch_interval_ms,
            switch_wake,
        );
        enter_scene(&self.config, &mut session, 0, cx);

        info!(
            session = id.0,
            now_ms = cx.now_ms,
            scenes = self.config.scenes.len(),
            abandoned_cart_items = session
                .backup
                .cart
                .iter()
                .map(|(_, qty)| u64::from(*qty))
                .sum::<u64>(),
            "demo_started"
        );
        self.state = DirectorState::Running(session);
        Some(id)
    }

    /// `Running -> Idle`. Idempotent; returns `None` when already idle.
    pub(crate) fn stop<H: PosHost, R: RandomSource>(
        &mut self,
        reason: StopReason,
        cx: &mut DemoContext<'_, H, R>,
    ) -> Option<StopReport> {
        let DirectorState::Running(mut session) = mem::replace(&mut self.state, DirectorState::Idle)
        else {
            return None;
        };

        let mut cancelled = session.presentation.stop(cx.timers, &mut session.timers);
        cancelled += session.timers.cancel_all(cx.timers);
        session.sub_loop.timer = None;
        session.press_revert = None;
        session.pulse_revert = None;

        cx.view.reset();
        force_baseline(&mut *cx.host);
        if self.config.restore_policy == RestorePolicy::PreDemoSnapshot {
            restore_snapshot(&mut *cx.host, &session.backup);
        }

        let report = StopReport {
            session: session.id,
            reason,
            cancelled_timers: cancelled,
            ran_ms: cx.now_ms.saturating_sub(session.started_at_ms),
            scene_switches: session.scene_switches,
        };
        info!(
            session = report.session.0,
            reason = ?report.reason,
            cancelled_timers = report.cancelled_timers,
            ran_ms = report.ran_ms,
            scene_switches = report.scene_switches,
            "demo_stopped"
        );
        Some(report)
    }

    /// Runs one session timer. Wakes for a session that is no longer live are
    /// reported as stale and change nothing.
    pub(crate) fn dispatch<H: PosHost, R: RandomSource>(
        &mut self,
        session_id: SessionId,
        event: SessionEvent,
        fired: TimerId,
        cx: &mut DemoContext<'_, H, R>,
    ) -> DispatchOutcome {
        let DirectorState::Running(session) = &mut self.state else {
            return DispatchOutcome::Stale;
        };
        if session.id != session_id {
            return DispatchOutcome::Stale;
        }

        match event {
            SessionEvent::SceneSwitch => {
                session.scene_switches = session.scene_switches.saturating_add(1);
                if let Some(limit) = self.config.max_scene_switches {
                    if session.scene_switches >= limit {
                        return DispatchOutcome::Exhausted;
                    }
                }
                let next = (session.scene_index + 1) % self.config.scenes.len().max(1);
                enter_scene(&self.config, session, next, cx);
            }
            SessionEvent::SceneTick => {
                if session.sub_loop.timer != Some(fired) {
                    return DispatchOutcome::Stale;
                }
                session.scene_ticks = session.scene_ticks.saturating_add(1);
                match session.sub_loop.kind {
                    SceneKind::GhostPurchase => {
                        let decision = self.actor.decide(&*cx.host, &mut *cx.rng);
                        apply_decision(&self.config, session, decision, cx);
                    }
                    SceneKind::TabBallet => {
                        let decision = self.actor.decide_navigation(&*cx.host, &mut *cx.rng);
                        apply_decision(&self.config, session, decision, cx);
                    }
                    SceneKind::RhythmBeat => pulse_beat(&self.config, session, cx),
                    SceneKind::TextRevealOnly => {}
                }
            }
            SessionEvent::PressRevert => {
                session.timers.release(fired);
                if session.press_revert != Some(fired) {
                    return DispatchOutcome::Stale;
                }
                session.press_revert = None;
                cx.view.pressed_product = None;
            }
            SessionEvent::PulseRevert => {
                session.timers.release(fired);
                if session.pulse_revert != Some(fired) {
                    return DispatchOutcome::Stale;
                }
                session.pulse_revert = None;
                cx.view.pulsed = None;
            }
            SessionEvent::PhraseAdvance => {
                let id = session.id;
                session
                    .presentation
                    .advance(id, cx.now_ms, cx.timers, &mut session.timers, cx.view);
            }
            SessionEvent::PhraseReveal => {
                session
                    .presentation
                    .reveal(fired, &mut session.timers, cx.view);
            }
        }
        DispatchOutcome::Applied
    }
}

fn force_baseline<H: PosHost>(host: &mut H) {
    host.dismiss_dialog();
    host.clear_cart();
    host.set_category_filter(CategoryFilter::All);
}

fn restore_snapshot<H: PosHost>(host: &mut H, snapshot: &HostSnapshot) {
    for (id, qty) in &snapshot.cart {
        for _ in 0..*qty {
            host.add_to_cart(*id);
        }
    }
    host.set_category_filter(snapshot.category.clone());
}

fn enter_scene<H: PosHost, R: RandomSource>(
    config: &DemoConfig,
    session: &mut DemoSession,
    index: usize,
    cx: &mut DemoContext<'_, H, R>,
) {
    let Some(spec) = config.scenes.get(index).copied() else {
        return;
    };
    if let Some(previous) = session.sub_loop.timer.take() {
        session.timers.cancel(cx.timers, previous);
    }
    flush_feedback(session, cx);

    session.scene_index = index;
    session.sub_loop = SubLoop {
        kind: spec.kind,
        timer: None,
        beat: 0,
    };
    cx.view.stage = Stage::for_scene(spec.kind);
    if spec.kind != SceneKind::TextRevealOnly {
        let wake = session.wake(SessionEvent::SceneTick);
        session.sub_loop.timer =
            Some(session.timers.repeating(cx.timers, cx.now_ms, spec.interval_ms, wake));
    }
    info!(
        session = session.id.0,
        scene_index = index,
        scene = ?spec.kind,
        interval_ms = spec.interval_ms,
        "demo_scene_entered"
    );
}

fn flush_feedback<H, R>(session: &mut DemoSession, cx: &mut DemoContext<'_, H, R>) {
    if let Some(timer) = session.press_revert.take() {
        session.timers.cancel(cx.timers, timer);
    }
    if let Some(timer) = session.pulse_revert.take() {
        session.timers.cancel(cx.timers, timer);
    }
    cx.view.pressed_product = None;
    cx.view.pulsed = None;
}

fn apply_decision<H: PosHost, R: RandomSource>(
    config: &DemoConfig,
    session: &mut DemoSession,
    decision: ActorDecision,
    cx: &mut DemoContext<'_, H, R>,
) {
    let Some(event) = decision.event else {
        debug!(session = session.id.0, action = ?decision.action, "demo_tick_skipped");
        return;
    };
    apply_event(&mut *cx.host, &event);
    debug!(session = session.id.0, event = ?event, "demo_synthetic_event");

    if let SyntheticEvent::Click(product) = event {
        if let Some(previous) = session.press_revert.take() {
            session.timers.cancel(cx.timers, previous);
        }
        cx.view.pressed_product = Some(product);
        let wake = session.wake(SessionEvent::PressRevert);
        session.press_revert =
            Some(session.timers.once(cx.timers, cx.now_ms, config.press_feedback_ms, wake));
    }
}

fn pulse_beat<H, R>(config: &DemoConfig, session: &mut DemoSession, cx: &mut DemoContext<'_, H, R>) {
    let beat = session.sub_loop.beat;
    session.sub_loop.beat = (beat + 1) % RHYTHM_BEATS_PER_BAR;

    let icon_count = u32::from(RHYTHM_ICON_COUNT);
    let target = if beat < icon_count {
        BeatTarget::Icon(beat as u8)
    } else if beat == icon_count {
        BeatTarget::PayButton
    } else {
        return;
    };

    if let Some(previous) = session.pulse_revert.take() {
        session.timers.cancel(cx.timers, previous);
    }
    cx.view.pulsed = Some(target);
    let wake = session.wake(SessionEvent::PulseRevert);
    session.pulse_revert =
        Some(session.timers.once(cx.timers, cx.now_ms, config.pulse_feedback_ms, wake));
}

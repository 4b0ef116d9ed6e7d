use tracing::{debug, info};

use super::activity::{ActivityMonitor, UserSignal};
use super::config::{DemoConfig, DemoConfigError};
use super::director::{
    DemoContext, DirectorPhase, DispatchOutcome, SceneDirector, SessionInfo, StopReason,
    StopReport, Wake,
};
use super::host::PosHost;
use super::random::RandomSource;
use super::timers::{FiredTimer, TimerQueue};
use super::view::DemoView;

/// Idle-driven attract mode wrapped around a point-of-sale host.
///
/// The engine owns the host, every timer and the demo view. Callers feed it
/// real input through [`DemoEngine::on_user_signal`] and move its virtual clock
/// forward with [`DemoEngine::advance_to`]; nothing happens between calls.
pub struct DemoEngine<H, R> {
    host: H,
    rng: R,
    timers: TimerQueue<Wake>,
    monitor: ActivityMonitor,
    director: SceneDirector,
    view: DemoView,
    now_ms: u64,
}

impl<H: PosHost, R: RandomSource> DemoEngine<H, R> {
    pub fn new(host: H, rng: R, config: DemoConfig) -> Result<Self, DemoConfigError> {
        config.validate()?;
        Ok(Self {
            host,
            rng,
            timers: TimerQueue::default(),
            monitor: ActivityMonitor::default(),
            director: SceneDirector::new(config),
            view: DemoView::default(),
            now_ms: 0,
        })
    }

    /// Arms the first idle deadline.
    pub fn start(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        let config = self.director.config();
        info!(
            now_ms = self.now_ms,
            idle_timeout_ms = self.host.idle_timeout_ms(),
            scenes = config.scenes.len(),
            scene_switch_interval_ms = config.scene_switch_interval_ms,
            "demo_engine_started"
        );
        self.rearm_idle();
    }

    /// Real input always wins: a live session is torn down before this
    /// returns, without running timers that were already due.
    pub fn on_user_signal(&mut self, signal: UserSignal, now_ms: u64) -> Option<StopReport> {
        self.now_ms = self.now_ms.max(now_ms);
        let report = self.stop_session(StopReason::UserSignal);
        if report.is_some() {
            debug!(signal = ?signal, now_ms = self.now_ms, "demo_interrupted");
        }
        self.rearm_idle();
        report
    }

    /// Ends a live session on request and re-arms the idle deadline.
    pub fn stop_demo(&mut self, now_ms: u64) -> Option<StopReport> {
        self.now_ms = self.now_ms.max(now_ms);
        let report = self.stop_session(StopReason::Requested)?;
        self.rearm_idle();
        Some(report)
    }

    /// Fires every timer due at or before `now_ms`, each at its own due time.
    /// Returns the number of timers fired.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let mut fired_count = 0usize;
        while let Some(fired) = self.timers.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(fired.due_at_ms);
            fired_count = fired_count.saturating_add(1);
            self.dispatch(fired);
        }
        self.now_ms = self.now_ms.max(now_ms);
        fired_count
    }

    fn dispatch(&mut self, fired: FiredTimer<Wake>) {
        match fired.payload {
            Wake::IdleDeadline { generation } => {
                if !self.monitor.accept_fire(generation) {
                    debug!(generation, now_ms = self.now_ms, "stale_timer_ignored");
                    return;
                }
                if !self.host.is_setup_complete() {
                    info!(now_ms = self.now_ms, "demo_start_skipped_setup_incomplete");
                    self.rearm_idle();
                    return;
                }
                let mut cx = DemoContext {
                    now_ms: self.now_ms,
                    timers: &mut self.timers,
                    host: &mut self.host,
                    rng: &mut self.rng,
                    view: &mut self.view,
                };
                if self.director.start(&mut cx).is_none() {
                    debug!(now_ms = self.now_ms, "demo_already_running");
                }
            }
            Wake::Session { session, event } => {
                let mut cx = DemoContext {
                    now_ms: self.now_ms,
                    timers: &mut self.timers,
                    host: &mut self.host,
                    rng: &mut self.rng,
                    view: &mut self.view,
                };
                match self.director.dispatch(session, event, fired.id, &mut cx) {
                    DispatchOutcome::Applied => {}
                    DispatchOutcome::Stale => {
                        debug!(
                            session = session.0,
                            event = ?event,
                            now_ms = self.now_ms,
                            "stale_timer_ignored"
                        );
                    }
                    DispatchOutcome::Exhausted => {
                        self.stop_session(StopReason::Exhausted);
                        self.rearm_idle();
                    }
                }
            }
        }
    }

    fn stop_session(&mut self, reason: StopReason) -> Option<StopReport> {
        let mut cx = DemoContext {
            now_ms: self.now_ms,
            timers: &mut self.timers,
            host: &mut self.host,
            rng: &mut self.rng,
            view: &mut self.view,
        };
        self.director.stop(reason, &mut cx)
    }

    /// The timeout is read from the host on every arm so settings changes
    /// apply from the next deadline on.
    fn rearm_idle(&mut self) {
        let timeout_ms = self.host.idle_timeout_ms();
        self.monitor.arm(&mut self.timers, self.now_ms, timeout_ms);
    }

    pub fn phase(&self) -> DirectorPhase {
        self.director.phase()
    }

    pub fn is_demo_active(&self) -> bool {
        matches!(self.director.phase(), DirectorPhase::Running { .. })
    }

    pub fn scene_index(&self) -> Option<usize> {
        match self.director.phase() {
            DirectorPhase::Running { scene_index } => Some(scene_index),
            DirectorPhase::Idle => None,
        }
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.director.session_info()
    }

    pub fn sessions_started(&self) -> u64 {
        self.director.sessions_started()
    }

    pub fn view(&self) -> &DemoView {
        &self.view
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access for live user actions. Callers report the input
    /// through [`DemoEngine::on_user_signal`] first.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &DemoConfig {
        self.director.config()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn next_wake_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn idle_deadline_ms(&self) -> Option<u64> {
        self.monitor
            .deadline()
            .and_then(|id| self.timers.due_at_ms(id))
    }

    pub fn is_idle_armed(&self) -> bool {
        self.monitor.is_armed()
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.monitor.timeout_ms()
    }
}

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::info;

use super::activity::UserSignal;
use super::engine::DemoEngine;
use super::host::PosHost;
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::random::RandomSource;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Longest the loop sleeps between presents when no timer is due sooner.
    pub frame_interval: Duration,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(50),
            metrics_log_interval: Duration::from_secs(5),
        }
    }
}

/// Everything the host side can hand to the loop thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopInput<C> {
    Signal(UserSignal),
    /// A typed command. Counts as a key press before it is handled.
    Command(C),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Requested,
    InputClosed,
}

/// Host-side surface driven by [`run_loop`].
pub trait Frontend<H, R> {
    type Command;

    fn handle_command(
        &mut self,
        engine: &mut DemoEngine<H, R>,
        command: Self::Command,
        now_ms: u64,
    ) -> LoopControl;

    /// Called once per frame after timers have run.
    fn present(&mut self, engine: &DemoEngine<H, R>, now_ms: u64);
}

/// Maps wall-clock time onto the engine's virtual clock until the input side
/// asks to stop or hangs up.
pub fn run_loop<H, R, F>(
    config: &LoopConfig,
    engine: &mut DemoEngine<H, R>,
    frontend: &mut F,
    input: &Receiver<LoopInput<F::Command>>,
    metrics_handle: &MetricsHandle,
) -> LoopExit
where
    H: PosHost,
    R: RandomSource,
    F: Frontend<H, R>,
{
    let frame_interval =
        normalize_non_zero_duration(config.frame_interval, Duration::from_millis(50));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let started = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    info!(
        frame_interval_ms = frame_interval.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );
    engine.start(elapsed_ms(started));
    frontend.present(engine, engine.now_ms());

    let exit = loop {
        let wait = compute_wait(engine.next_wake_ms(), elapsed_ms(started), frame_interval);
        let received = input.recv_timeout(wait);
        let busy_since = Instant::now();

        match received {
            Ok(LoopInput::Signal(signal)) => {
                metrics_accumulator.record_input();
                engine.on_user_signal(signal, elapsed_ms(started));
            }
            Ok(LoopInput::Command(command)) => {
                metrics_accumulator.record_input();
                let now_ms = elapsed_ms(started);
                engine.on_user_signal(UserSignal::KeyPress, now_ms);
                if frontend.handle_command(engine, command, now_ms) == LoopControl::Exit {
                    info!(reason = "command", "shutdown_requested");
                    break LoopExit::Requested;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!(reason = "input_closed", "shutdown_requested");
                break LoopExit::InputClosed;
            }
        }

        let now_ms = elapsed_ms(started);
        let fired = engine.advance_to(now_ms);
        frontend.present(engine, now_ms);

        metrics_accumulator.record_frame(
            busy_since.elapsed(),
            fired,
            engine.pending_timers(),
            engine.is_demo_active(),
        );
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                frames_per_sec = snapshot.frames_per_sec,
                timer_fires_per_sec = snapshot.timer_fires_per_sec,
                inputs_per_sec = snapshot.inputs_per_sec,
                busy_ms_per_frame = snapshot.busy_ms_per_frame,
                demo_share = snapshot.demo_share,
                pending_timers = snapshot.pending_timers,
                "loop_metrics"
            );
        }
    };

    let now_ms = elapsed_ms(started);
    if engine.stop_demo(now_ms).is_some() {
        frontend.present(engine, now_ms);
    }
    info!(exit = ?exit, sessions = engine.sessions_started(), "shutdown");
    exit
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Sleep until the next timer or the next frame, whichever comes first.
fn compute_wait(next_wake_ms: Option<u64>, now_ms: u64, frame_interval: Duration) -> Duration {
    match next_wake_ms {
        Some(due_ms) => frame_interval.min(Duration::from_millis(due_ms.saturating_sub(now_ms))),
        None => frame_interval,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

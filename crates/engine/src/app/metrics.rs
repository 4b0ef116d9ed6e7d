use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "loop metrics lock poisoned; recovered inner value");
    }
}

/// One reporting window of the real-time loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub frames_per_sec: f32,
    pub timer_fires_per_sec: f32,
    pub inputs_per_sec: f32,
    /// Mean time spent handling input, timers and presentation per frame.
    pub busy_ms_per_frame: f32,
    /// Fraction of frames presented with a demo session live, `0.0..=1.0`.
    pub demo_share: f32,
    pub pending_timers: usize,
}

/// Shared read side of the loop metrics. Clones see the same window.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                poisoned.into_inner()
            }
        };
        *guard = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    window: Duration,
    frames: u32,
    demo_frames: u32,
    timer_fires: u64,
    inputs: u64,
    busy: Duration,
    pending_timers: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            window,
            frames: 0,
            demo_frames: 0,
            timer_fires: 0,
            inputs: 0,
            busy: Duration::ZERO,
            pending_timers: 0,
        }
    }

    pub(crate) fn record_input(&mut self) {
        self.inputs = self.inputs.saturating_add(1);
    }

    pub(crate) fn record_frame(
        &mut self,
        busy: Duration,
        timers_fired: usize,
        pending_timers: usize,
        demo_active: bool,
    ) {
        self.frames = self.frames.saturating_add(1);
        if demo_active {
            self.demo_frames = self.demo_frames.saturating_add(1);
        }
        self.timer_fires = self.timer_fires.saturating_add(timers_fired as u64);
        self.busy = self.busy.saturating_add(busy);
        self.pending_timers = pending_timers;
    }

    /// Closes the window once it has run its full length.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let per_sec = |count: f32| count / seconds;
        let (busy_ms_per_frame, demo_share) = if self.frames == 0 {
            (0.0, 0.0)
        } else {
            let frames = self.frames as f32;
            (
                self.busy.as_secs_f32() * 1000.0 / frames,
                self.demo_frames as f32 / frames,
            )
        };
        let snapshot = LoopMetricsSnapshot {
            frames_per_sec: per_sec(self.frames as f32),
            timer_fires_per_sec: per_sec(self.timer_fires as f32),
            inputs_per_sec: per_sec(self.inputs as f32),
            busy_ms_per_frame,
            demo_share,
            pending_timers: self.pending_timers,
        };

        *self = Self {
            window_start: now,
            pending_timers: self.pending_timers,
            ..Self::new(self.window)
        };
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison(handle: &MetricsHandle) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.latest.write().expect("write guard");
                    panic!("poison loop metrics");
                })
                .join();
        });
    }

    #[test]
    fn window_reports_rates_and_demo_share() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(2));
        let start = accumulator.window_start;

        accumulator.record_input();
        accumulator.record_frame(Duration::from_millis(1), 2, 4, false);
        accumulator.record_frame(Duration::from_millis(3), 0, 4, true);
        accumulator.record_frame(Duration::from_millis(2), 4, 5, true);
        accumulator.record_frame(Duration::from_millis(2), 0, 5, true);

        let snapshot = accumulator
            .maybe_snapshot(start + Duration::from_secs(2))
            .expect("window closed");

        assert!((snapshot.frames_per_sec - 2.0).abs() < 0.01);
        assert!((snapshot.timer_fires_per_sec - 3.0).abs() < 0.01);
        assert!((snapshot.inputs_per_sec - 0.5).abs() < 0.01);
        assert!((snapshot.busy_ms_per_frame - 2.0).abs() < 0.001);
        assert!((snapshot.demo_share - 0.75).abs() < f32::EPSILON);
        assert_eq!(snapshot.pending_timers, 5);
    }

    #[test]
    fn open_window_reports_nothing() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let start = accumulator.window_start;
        accumulator.record_frame(Duration::from_millis(1), 1, 1, false);

        assert!(accumulator
            .maybe_snapshot(start + Duration::from_millis(999))
            .is_none());
    }

    #[test]
    fn closing_a_window_starts_the_next_one_empty() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let start = accumulator.window_start;
        accumulator.record_frame(Duration::from_millis(1), 3, 2, true);
        accumulator
            .maybe_snapshot(start + Duration::from_secs(1))
            .expect("first window");

        let idle = accumulator
            .maybe_snapshot(start + Duration::from_secs(2))
            .expect("second window");
        assert_eq!(idle.frames_per_sec, 0.0);
        assert_eq!(idle.demo_share, 0.0);
        assert_eq!(idle.pending_timers, 2);
    }

    #[test]
    fn poisoned_lock_still_reads_and_publishes() {
        let handle = MetricsHandle::default();
        poison(&handle);
        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let published = LoopMetricsSnapshot {
            frames_per_sec: 20.0,
            timer_fires_per_sec: 3.5,
            inputs_per_sec: 0.2,
            busy_ms_per_frame: 0.4,
            demo_share: 1.0,
            pending_timers: 6,
        };
        handle.clone().publish(published);
        assert_eq!(handle.snapshot(), published);
    }
}

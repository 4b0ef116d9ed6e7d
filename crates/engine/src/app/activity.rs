use tracing::debug;

use super::director::Wake;
use super::timers::{TimerId, TimerQueue};

/// Real input the host forwards to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserSignal {
    PointerMove,
    PointerDown,
    TouchStart,
    Click,
    KeyPress,
    Scroll,
}

/// Owns the single idle deadline.
///
/// Each arm bumps `generation`; a deadline wake only counts when it carries the
/// current generation and the monitor is still armed, so a wake that raced a
/// re-arm is ignored even if its cancellation was missed.
#[derive(Debug, Default)]
pub(crate) struct ActivityMonitor {
    deadline: Option<TimerId>,
    generation: u64,
    timeout_ms: u64,
}

impl ActivityMonitor {
    pub(crate) fn arm(&mut self, queue: &mut TimerQueue<Wake>, now_ms: u64, timeout_ms: u64) {
        if let Some(previous) = self.deadline.take() {
            queue.cancel(previous);
        }
        self.generation = self.generation.wrapping_add(1);
        self.timeout_ms = timeout_ms;
        self.deadline = Some(queue.schedule_once(
            now_ms,
            timeout_ms,
            Wake::IdleDeadline {
                generation: self.generation,
            },
        ));
        debug!(
            generation = self.generation,
            now_ms,
            timeout_ms,
            "idle_armed"
        );
    }

    #[cfg(test)]
    pub(crate) fn disarm(&mut self, queue: &mut TimerQueue<Wake>) {
        if let Some(previous) = self.deadline.take() {
            queue.cancel(previous);
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Consumes the deadline if `generation` is the live one.
    pub(crate) fn accept_fire(&mut self, generation: u64) -> bool {
        if self.deadline.is_none() || generation != self.generation {
            return false;
        }
        self.deadline = None;
        true
    }

    pub(crate) fn deadline(&self) -> Option<TimerId> {
        self.deadline
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_all(queue: &mut TimerQueue<Wake>, now_ms: u64) -> Vec<u64> {
        let mut generations = Vec::new();
        while let Some(fired) = queue.pop_due(now_ms) {
            if let Wake::IdleDeadline { generation } = fired.payload {
                generations.push(generation);
            }
        }
        generations
    }

    #[test]
    fn rearm_replaces_the_pending_deadline() {
        let mut queue = TimerQueue::default();
        let mut monitor = ActivityMonitor::default();

        monitor.arm(&mut queue, 0, 1_000);
        monitor.arm(&mut queue, 600, 1_000);

        assert_eq!(queue.len(), 1);
        assert!(fire_all(&mut queue, 1_599).is_empty());
        let fired = fire_all(&mut queue, 1_600);
        assert_eq!(fired.len(), 1);
        assert!(monitor.accept_fire(fired[0]));
        assert!(!monitor.is_armed());
    }

    #[test]
    fn stale_generation_is_rejected() {
        let mut queue = TimerQueue::default();
        let mut monitor = ActivityMonitor::default();

        monitor.arm(&mut queue, 0, 1_000);
        let stale = fire_all(&mut queue, 1_000)[0];
        monitor.arm(&mut queue, 1_000, 1_000);

        assert!(!monitor.accept_fire(stale));
        assert!(monitor.is_armed());
    }

    #[test]
    fn disarmed_monitor_ignores_any_wake() {
        let mut queue = TimerQueue::default();
        let mut monitor = ActivityMonitor::default();

        monitor.arm(&mut queue, 0, 1_000);
        let generation = match queue.pop_due(1_000).map(|fired| fired.payload) {
            Some(Wake::IdleDeadline { generation }) => generation,
            other => panic!("expected idle deadline, got {other:?}"),
        };
        monitor.disarm(&mut queue);

        assert!(!monitor.accept_fire(generation));
        assert!(queue.is_empty());
    }

    #[test]
    fn accepted_fire_is_consumed_once() {
        let mut queue = TimerQueue::default();
        let mut monitor = ActivityMonitor::default();

        monitor.arm(&mut queue, 0, 10);
        let generation = fire_all(&mut queue, 10)[0];
        assert!(monitor.accept_fire(generation));
        assert!(!monitor.accept_fire(generation));
    }
}

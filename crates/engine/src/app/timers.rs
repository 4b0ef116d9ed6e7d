use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Opaque handle for a scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Once,
    Repeating { period_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer<T> {
    pub id: TimerId,
    pub due_at_ms: u64,
    pub kind: TimerKind,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct PendingTimer<T> {
    kind: TimerKind,
    payload: T,
}

/// Virtual-time scheduler for delayed and periodic callbacks.
///
/// Time is expressed in milliseconds of a caller-owned clock. Timers due at the
/// same instant fire in scheduling order. Nothing here runs on its own; the
/// owner drains due timers with [`TimerQueue::pop_due`].
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: BTreeMap<(u64, TimerId), PendingTimer<T>>,
    due_by_id: HashMap<TimerId, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> TimerId {
        self.insert(now_ms.saturating_add(delay_ms), TimerKind::Once, payload)
    }

    /// Schedules a periodic timer whose first fire is one period from `now_ms`.
    pub fn schedule_repeating(&mut self, now_ms: u64, period_ms: u64, payload: T) -> TimerId {
        let period_ms = period_ms.max(1);
        self.insert(
            now_ms.saturating_add(period_ms),
            TimerKind::Repeating { period_ms },
            payload,
        )
    }

    fn insert(&mut self, due_at_ms: u64, kind: TimerKind, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending
            .insert((due_at_ms, id), PendingTimer { kind, payload });
        self.due_by_id.insert(id, due_at_ms);
        id
    }

    /// Returns `true` only when the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id) {
            Some(due_at_ms) => self.pending.remove(&(due_at_ms, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id)
    }

    pub fn due_at_ms(&self, id: TimerId) -> Option<u64> {
        self.due_by_id.get(&id).copied()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending
            .first_key_value()
            .map(|((due_at_ms, _), _)| *due_at_ms)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Removes and returns the earliest timer due at or before `now_ms`.
    /// Repeating timers are rescheduled one period after their previous due time.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<FiredTimer<T>> {
        let (&(due_at_ms, id), _) = self.pending.first_key_value()?;
        if due_at_ms > now_ms {
            return None;
        }
        let timer = self.pending.remove(&(due_at_ms, id))?;
        match timer.kind {
            TimerKind::Once => {
                self.due_by_id.remove(&id);
                Some(FiredTimer {
                    id,
                    due_at_ms,
                    kind: timer.kind,
                    payload: timer.payload,
                })
            }
            TimerKind::Repeating { period_ms } => {
                let next_due = due_at_ms.saturating_add(period_ms);
                let payload = timer.payload.clone();
                self.pending.insert((next_due, id), timer);
                self.due_by_id.insert(id, next_due);
                Some(FiredTimer {
                    id,
                    due_at_ms,
                    kind: TimerKind::Repeating { period_ms },
                    payload,
                })
            }
        }
    }
}

/// Set of timer handles owned by one holder, cancelled together on teardown.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    owned: BTreeSet<TimerId>,
}

impl TimerRegistry {
    pub fn once<T>(
        &mut self,
        queue: &mut TimerQueue<T>,
        now_ms: u64,
        delay_ms: u64,
        payload: T,
    ) -> TimerId {
        let id = queue.schedule_once(now_ms, delay_ms, payload);
        self.owned.insert(id);
        id
    }

    pub fn repeating<T>(
        &mut self,
        queue: &mut TimerQueue<T>,
        now_ms: u64,
        period_ms: u64,
        payload: T,
    ) -> TimerId {
        let id = queue.schedule_repeating(now_ms, period_ms, payload);
        self.owned.insert(id);
        id
    }

    /// Cancels a single owned timer. Handles this registry does not own are left alone.
    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>, id: TimerId) -> bool {
        if !self.owned.remove(&id) {
            return false;
        }
        queue.cancel(id)
    }

    /// Drops ownership of a one-shot timer that already fired.
    pub fn release(&mut self, id: TimerId) {
        self.owned.remove(&id);
    }

    /// Cancels every owned timer and returns how many were still pending.
    /// Calling it again is a no-op.
    pub fn cancel_all<T>(&mut self, queue: &mut TimerQueue<T>) -> usize {
        std::mem::take(&mut self.owned)
            .into_iter()
            .filter(|id| queue.cancel(*id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }
}

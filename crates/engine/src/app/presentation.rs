use super::config::Phrase;
use super::director::{SessionEvent, SessionId, Wake};
use super::timers::{TimerId, TimerQueue, TimerRegistry};
use super::view::DemoView;

/// Marketing copy rotation that runs beside the scenes for a whole session.
///
/// The phrase index moves on every `PhraseAdvance`; the visible text follows
/// one reveal delay later so the fade-out can finish first.
#[derive(Debug)]
pub(crate) struct PresentationLoop {
    phrases: Vec<Phrase>,
    reveal_delay_ms: u64,
    phrase_index: usize,
    advances: u64,
    advance_timer: Option<TimerId>,
    reveal_timer: Option<TimerId>,
}

impl PresentationLoop {
    pub(crate) fn new(phrases: Vec<Phrase>, reveal_delay_ms: u64) -> Self {
        Self {
            phrases,
            reveal_delay_ms,
            phrase_index: 0,
            advances: 0,
            advance_timer: None,
            reveal_timer: None,
        }
    }

    pub(crate) fn start(
        &mut self,
        session: SessionId,
        now_ms: u64,
        interval_ms: u64,
        queue: &mut TimerQueue<Wake>,
        registry: &mut TimerRegistry,
        view: &mut DemoView,
    ) {
        self.phrase_index = 0;
        self.advances = 0;
        self.show_current(view);
        self.advance_timer = Some(registry.repeating(
            queue,
            now_ms,
            interval_ms,
            Wake::Session {
                session,
                event: SessionEvent::PhraseAdvance,
            },
        ));
    }

    pub(crate) fn advance(
        &mut self,
        session: SessionId,
        now_ms: u64,
        queue: &mut TimerQueue<Wake>,
        registry: &mut TimerRegistry,
        view: &mut DemoView,
    ) {
        if self.phrases.is_empty() {
            return;
        }
        self.phrase_index = (self.phrase_index + 1) % self.phrases.len();
        self.advances = self.advances.saturating_add(1);
        view.headline_visible = false;

        if let Some(previous) = self.reveal_timer.take() {
            registry.cancel(queue, previous);
        }
        self.reveal_timer = Some(registry.once(
            queue,
            now_ms,
            self.reveal_delay_ms,
            Wake::Session {
                session,
                event: SessionEvent::PhraseReveal,
            },
        ));
    }

    pub(crate) fn reveal(
        &mut self,
        fired: TimerId,
        registry: &mut TimerRegistry,
        view: &mut DemoView,
    ) {
        registry.release(fired);
        if self.reveal_timer != Some(fired) {
            return;
        }
        self.reveal_timer = None;
        self.show_current(view);
    }

    /// Cancels both presentation timers; returns how many were still pending.
    pub(crate) fn stop(&mut self, queue: &mut TimerQueue<Wake>, registry: &mut TimerRegistry) -> usize {
        [self.advance_timer.take(), self.reveal_timer.take()]
            .into_iter()
            .flatten()
            .filter(|id| registry.cancel(queue, *id))
            .count()
    }

    fn show_current(&self, view: &mut DemoView) {
        let Some(phrase) = self.phrases.get(self.phrase_index) else {
            return;
        };
        view.headline.clone_from(&phrase.main);
        view.subline.clone_from(&phrase.sub);
        view.headline_visible = true;
        view.reveal_generation = view.reveal_generation.saturating_add(1);
    }

    pub(crate) fn phrase_index(&self) -> usize {
        self.phrase_index
    }

    pub(crate) fn advances(&self) -> u64 {
        self.advances
    }

    #[cfg(test)]
    pub(crate) fn is_revealing(&self) -> bool {
        self.reveal_timer.is_some()
    }

    #[cfg(test)]
    pub(crate) fn advance_timer(&self) -> Option<TimerId> {
        self.advance_timer
    }
}

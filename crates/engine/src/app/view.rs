use super::config::SceneKind;
use super::host::ProductId;

/// Which demo visual sits on top of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Hidden,
    Simulation,
    IconStage,
    TextOnly,
}

impl Stage {
    pub fn for_scene(kind: SceneKind) -> Self {
        match kind {
            SceneKind::GhostPurchase | SceneKind::TabBallet => Self::Simulation,
            SceneKind::RhythmBeat => Self::IconStage,
            SceneKind::TextRevealOnly => Self::TextOnly,
        }
    }
}

pub const RHYTHM_ICON_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatTarget {
    Icon(u8),
    PayButton,
}

/// Cosmetic state owned by the demo. Reset wholesale when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DemoView {
    pub overlay_visible: bool,
    pub stage: Stage,
    pub pressed_product: Option<ProductId>,
    pub pulsed: Option<BeatTarget>,
    pub headline: String,
    pub subline: String,
    pub headline_visible: bool,
    /// Bumped whenever the headline slide-in restarts.
    pub reveal_generation: u64,
}

impl DemoView {
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scene_maps_to_a_visible_stage() {
        for kind in [
            SceneKind::GhostPurchase,
            SceneKind::TabBallet,
            SceneKind::RhythmBeat,
            SceneKind::TextRevealOnly,
        ] {
            assert_ne!(Stage::for_scene(kind), Stage::Hidden);
        }
    }

    #[test]
    fn reset_returns_to_blank() {
        let mut view = DemoView {
            overlay_visible: true,
            stage: Stage::IconStage,
            pulsed: Some(BeatTarget::PayButton),
            headline: "3D UI".to_string(),
            reveal_generation: 4,
            ..DemoView::default()
        };
        assert!(!view.is_blank());
        view.reset();
        assert!(view.is_blank());
    }
}

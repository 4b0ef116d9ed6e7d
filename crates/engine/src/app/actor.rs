use super::config::ActionWeights;
use super::host::{CategoryFilter, PosHost, ProductId};
use super::random::RandomSource;

/// One fake user action, applied through the host's real entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticEvent {
    Click(ProductId),
    SwitchTab(CategoryFilter),
    ClearCart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Purchase,
    Navigate,
    Reset,
}

/// The drawn action and, when the host state allows one, the event to apply.
/// A reset below the cart threshold or a purchase with nothing visible yields no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorDecision {
    pub action: ActionKind,
    pub event: Option<SyntheticEvent>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyntheticActor {
    weights: ActionWeights,
    reset_threshold: u32,
}

impl SyntheticActor {
    pub fn new(weights: ActionWeights, reset_threshold: u32) -> Self {
        Self {
            weights,
            reset_threshold,
        }
    }

    pub fn choose_action<R: RandomSource>(&self, rng: &mut R) -> ActionKind {
        let total = self.weights.total();
        if total <= 0.0 {
            return ActionKind::Purchase;
        }
        let draw = rng.next_unit() * total;
        if draw < self.weights.purchase {
            ActionKind::Purchase
        } else if draw < self.weights.purchase + self.weights.navigate {
            ActionKind::Navigate
        } else {
            ActionKind::Reset
        }
    }

    /// Weighted tick used by the purchase scene.
    pub fn decide<H: PosHost, R: RandomSource>(&self, host: &H, rng: &mut R) -> ActorDecision {
        let action = self.choose_action(rng);
        let event = match action {
            ActionKind::Purchase => pick_visible_product(host, rng).map(SyntheticEvent::Click),
            ActionKind::Navigate => pick_tab(host, rng).map(SyntheticEvent::SwitchTab),
            ActionKind::Reset => {
                (host.cart_item_count() > self.reset_threshold).then_some(SyntheticEvent::ClearCart)
            }
        };
        ActorDecision { action, event }
    }

    /// Navigation-only tick used by the tab scene.
    pub fn decide_navigation<H: PosHost, R: RandomSource>(
        &self,
        host: &H,
        rng: &mut R,
    ) -> ActorDecision {
        ActorDecision {
            action: ActionKind::Navigate,
            event: pick_tab(host, rng).map(SyntheticEvent::SwitchTab),
        }
    }
}

fn pick_visible_product<H: PosHost, R: RandomSource>(host: &H, rng: &mut R) -> Option<ProductId> {
    let visible = host.list_products(&host.active_category());
    let index = rng.pick_index(visible.len())?;
    visible.get(index).map(|product| product.id)
}

fn pick_tab<H: PosHost, R: RandomSource>(host: &H, rng: &mut R) -> Option<CategoryFilter> {
    let tabs = host.category_tabs();
    let index = rng.pick_index(tabs.len())?;
    tabs.into_iter().nth(index)
}

pub fn apply_event<H: PosHost>(host: &mut H, event: &SyntheticEvent) {
    match event {
        SyntheticEvent::Click(id) => host.add_to_cart(*id),
        SyntheticEvent::SwitchTab(filter) => host.set_category_filter(filter.clone()),
        SyntheticEvent::ClearCart => host.clear_cart(),
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price_cents: u64,
    pub category: String,
}

/// Category tab selection. `All` is the default tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn only(category: impl Into<String>) -> Self {
        Self::Only(category.into())
    }

    /// Parses a tab label; `all` in any case selects every category.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cart and tab state the demo can put back after a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostSnapshot {
    pub cart: Vec<(ProductId, u32)>,
    pub category: CategoryFilter,
}

/// The point-of-sale application as seen by the demo engine.
///
/// Mutating methods are the same entry points the live input handlers call,
/// so anything the demo does renders exactly like a real interaction.
pub trait PosHost {
    fn list_products(&self, filter: &CategoryFilter) -> Vec<Product>;
    fn category_tabs(&self) -> Vec<CategoryFilter>;
    fn active_category(&self) -> CategoryFilter;
    fn cart_quantities(&self) -> Vec<(ProductId, u32)>;

    fn add_to_cart(&mut self, id: ProductId);
    fn set_category_filter(&mut self, filter: CategoryFilter);
    fn clear_cart(&mut self);
    fn dismiss_dialog(&mut self);

    fn is_setup_complete(&self) -> bool;
    fn idle_timeout_ms(&self) -> u64;

    fn cart_item_count(&self) -> u32 {
        self.cart_quantities()
            .iter()
            .fold(0u32, |total, (_, qty)| total.saturating_add(*qty))
    }

    fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            cart: self.cart_quantities(),
            category: self.active_category(),
        }
    }
}

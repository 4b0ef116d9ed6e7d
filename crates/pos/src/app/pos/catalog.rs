use nexus_engine::{CategoryFilter, Product, ProductId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CatalogError {
    #[error("product name is required")]
    EmptyName,
    #[error("invalid price '{0}' (expected a positive amount like 4.50)")]
    InvalidPrice(String),
    #[error("price must be greater than zero")]
    ZeroPrice,
    #[error("price may not exceed {}.00", MAX_PRICE_CENTS / 100)]
    PriceTooHigh,
    #[error("category is required")]
    EmptyCategory,
}

/// Highest price a new product may carry: 1,000,000.00.
pub(crate) const MAX_PRICE_CENTS: u64 = 100_000_000;

pub(crate) fn default_products() -> Vec<Product> {
    let product = |id: u64, name: &str, price_cents: u64, category: &str| Product {
        id: ProductId(id),
        name: name.to_string(),
        price_cents,
        category: category.to_string(),
    };
    vec![
        product(1, "Neon Burger", 1_250, "Food"),
        product(2, "Cyber Fries", 500, "Food"),
        product(3, "Quantum Cola", 350, "Drinks"),
        product(4, "Void Coffee", 400, "Drinks"),
        product(5, "Plasma Cake", 600, "Dessert"),
    ]
}

/// Parses a decimal amount with at most two fractional digits into cents.
pub(crate) fn parse_price_cents(raw: &str) -> Result<u64, CatalogError> {
    let invalid = || CatalogError::InvalidPrice(raw.to_string());
    let trimmed = raw.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if (whole.is_empty() && fraction.is_empty())
        || fraction.len() > 2
        || !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .ok()
            .and_then(|value| value.checked_mul(100))
            .ok_or_else(invalid)?
    };
    let fraction_cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse::<u64>().map_err(|_| invalid())?,
    };
    whole_cents.checked_add(fraction_cents).ok_or_else(invalid)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProductDraft {
    pub(crate) name: String,
    pub(crate) price: String,
    pub(crate) category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Catalog {
    products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_products())
    }
}

impl Catalog {
    pub(crate) fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub(crate) fn products(&self) -> &[Product] {
        &self.products
    }

    pub(crate) fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub(crate) fn filtered(&self, filter: &CategoryFilter) -> Vec<Product> {
        self.products
            .iter()
            .filter(|product| filter.matches(&product.category))
            .cloned()
            .collect()
    }

    /// `All` followed by each category in first-seen order.
    pub(crate) fn tabs(&self) -> Vec<CategoryFilter> {
        let mut tabs = vec![CategoryFilter::All];
        for product in &self.products {
            if !tabs.iter().any(|tab| tab.label() == product.category) {
                tabs.push(CategoryFilter::only(product.category.clone()));
            }
        }
        tabs
    }

    pub(crate) fn add_product(&mut self, draft: &ProductDraft) -> Result<ProductId, CatalogError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let price_cents = parse_price_cents(&draft.price)?;
        if price_cents == 0 {
            return Err(CatalogError::ZeroPrice);
        }
        if price_cents > MAX_PRICE_CENTS {
            return Err(CatalogError::PriceTooHigh);
        }
        let category = draft.category.trim();
        if category.is_empty() {
            return Err(CatalogError::EmptyCategory);
        }

        let id = self.next_id();
        self.products.push(Product {
            id,
            name: name.to_string(),
            price_cents,
            category: category.to_string(),
        });
        Ok(id)
    }

    fn next_id(&self) -> ProductId {
        let highest = self
            .products
            .iter()
            .map(|product| product.id.0)
            .max()
            .unwrap_or(0);
        ProductId(highest.saturating_add(1))
    }
}
